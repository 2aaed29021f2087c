//! lobby-tui: Terminal UI components for the lobby console
//!
//! A small toolkit over ratatui and crossterm: input actions, theme, and
//! the widgets the console pages share.

pub mod input;
pub mod theme;
pub mod widgets;

pub use theme::Theme;
