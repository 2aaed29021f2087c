//! lobby-api: Typed HTTP client for the lobby assistant backend
//!
//! This crate wraps the backend's REST surface: admin reads and writes,
//! conversation CRUD, the streaming completion endpoint, and document upload.

pub mod account;
pub mod admin;
pub mod chat;
pub mod client;
pub mod docs;
pub mod error;
pub mod stream;
pub mod types;

pub use client::ApiClient;
pub use error::{Error, Result};
pub use stream::CompletionStream;
pub use types::*;
