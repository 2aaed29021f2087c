//! Error types for lobby-api

use thiserror::Error;

/// Result type alias using lobby-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed (connect, DNS, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file I/O failed (uploads, CSV export)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Token missing or rejected (HTTP 401)
    #[error("Unauthorized: {detail}")]
    Unauthorized { detail: String },

    /// Token valid but the caller lacks the required role (HTTP 403)
    #[error("Forbidden: {detail}")]
    Forbidden { detail: String },

    /// Uniqueness conflict, e.g. username/email already taken (HTTP 409)
    #[error("Conflict: {detail}")]
    Conflict { detail: String },

    /// Any other non-success HTTP status
    #[error("Request failed ({status}): {detail}")]
    Status { status: u16, detail: String },

    /// The streaming endpoint answered without a body to read
    #[error("Streaming response had no body")]
    MissingBody,

    /// A streamed chunk could not be decoded
    #[error("Stream decode error: {0}")]
    StreamDecode(String),
}

impl Error {
    /// Map a non-success status and its (possibly empty) error body to a variant.
    ///
    /// Error bodies are `{"detail": "..."}`; anything else falls back to the
    /// raw body text or a canned message.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = extract_detail(body);
        match status {
            401 => Error::Unauthorized { detail },
            403 => Error::Forbidden { detail },
            409 => Error::Conflict { detail },
            _ => Error::Status { status, detail },
        }
    }

    /// Whether this error should route the user back to the login screen
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }

    /// Whether this error should route the user to the restricted-access screen
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Error::Forbidden { .. })
    }

    /// One human-readable line for the error banner
    pub fn banner_message(&self) -> String {
        match self {
            Error::Http(_) => "Network error, check your connection".to_string(),
            Error::Unauthorized { .. } => "Session expired, please sign in again".to_string(),
            Error::Forbidden { .. } => "You do not have access to this page".to_string(),
            Error::Conflict { detail } => detail.clone(),
            Error::Status { detail, .. } if !detail.is_empty() => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Pull the `detail` field out of a structured error body.
fn extract_detail(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        detail: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.detail,
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_auth() {
        let e = Error::from_status(401, r#"{"detail":"Could not validate credentials"}"#);
        assert!(e.is_unauthorized());
        assert!(!e.is_forbidden());
    }

    #[test]
    fn test_status_mapping_forbidden() {
        let e = Error::from_status(403, r#"{"detail":"Admin role required"}"#);
        assert!(e.is_forbidden());
    }

    #[test]
    fn test_status_mapping_conflict_detail() {
        let e = Error::from_status(409, r#"{"detail":"Username already in use"}"#);
        match e {
            Error::Conflict { detail } => assert_eq!(detail, "Username already in use"),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_status_mapping_other() {
        let e = Error::from_status(500, "");
        match e {
            Error::Status { status, .. } => assert_eq!(status, 500),
            other => panic!("expected Status, got {:?}", other),
        }
    }

    #[test]
    fn test_detail_fallback_to_raw_body() {
        let e = Error::from_status(400, "plain text failure");
        match e {
            Error::Status { detail, .. } => assert_eq!(detail, "plain text failure"),
            other => panic!("expected Status, got {:?}", other),
        }
    }

    #[test]
    fn test_banner_message_surfaces_conflict_detail() {
        let e = Error::from_status(409, r#"{"detail":"Email already in use"}"#);
        assert_eq!(e.banner_message(), "Email already in use");
    }

    #[test]
    fn test_banner_message_unauthorized_is_generic() {
        let e = Error::from_status(401, r#"{"detail":"token expired at ..."}"#);
        assert_eq!(e.banner_message(), "Session expired, please sign in again");
    }
}
