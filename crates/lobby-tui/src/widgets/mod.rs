//! Widgets shared by the console pages

pub mod banner;
pub mod cards;
pub mod composer;
pub mod picker;
pub mod spinner;
pub mod table;
pub mod transcript;

pub use banner::Banner;
pub use cards::{SeriesPanel, StatCard};
pub use composer::Composer;
pub use picker::{Picker, PickerItem, PickerState};
pub use spinner::Spinner;
pub use table::{Column, DataTable};
pub use transcript::{Transcript, TranscriptEntry};
