//! Session event types

use serde::{Deserialize, Serialize};

/// Events broadcast by the chat controller while a send is in progress.
///
/// A rendering layer subscribes and re-reads the conversation on each event;
/// payloads carry just enough to avoid cloning the whole turn list per
/// fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A send started; the user turn is in place
    SendStart { text: String },

    /// The conversation was created server-side during this send
    ChatCreated { chat_id: String, title: String },

    /// The assistant turn opened and fragments will follow
    StreamStart,

    /// A fragment was applied to the in-flight turn
    Fragment { delta: String },

    /// The in-flight turn was sealed; the send is over
    StreamEnd { text: String },

    /// The send failed; partial output is retained
    Error { message: String },
}

impl SessionEvent {
    /// Check if this is a terminal event (StreamEnd or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::StreamEnd { .. } | SessionEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(SessionEvent::StreamEnd { text: String::new() }.is_terminal());
        assert!(SessionEvent::Error { message: "x".to_string() }.is_terminal());
        assert!(!SessionEvent::StreamStart.is_terminal());
        assert!(!SessionEvent::Fragment { delta: "d".to_string() }.is_terminal());
    }
}
