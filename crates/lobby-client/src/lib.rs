//! lobby-client: session logic for the lobby console
//!
//! Owns the chat controller (streaming send / edit-and-resend), the pure
//! turn-sequence transitions it is built on, and the view-state helpers the
//! console pages use: user-table filtering, log pagination, dashboard
//! refresh, and route-guard decisions.

pub mod auth;
pub mod controller;
pub mod conversation;
pub mod dashboard;
pub mod directory;
pub mod error;
pub mod events;
pub mod pager;
pub mod transport;

pub use auth::{AuthContext, Route};
pub use controller::{ChatController, Phase};
pub use conversation::{Conversation, Turn};
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use transport::ChatBackend;
