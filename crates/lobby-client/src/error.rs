//! Error types for lobby-client

use thiserror::Error;

/// Result type alias using lobby-client Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in session logic
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the API layer
    #[error(transparent)]
    Api(#[from] lobby_api::Error),

    /// A generic session error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error should bounce the user to a different route
    pub fn redirect(&self) -> Option<crate::auth::Route> {
        match self {
            Error::Api(e) => crate::auth::route_for_error(e),
            Error::Other(_) => None,
        }
    }
}
