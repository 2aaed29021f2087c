//! Conversation state: turn sequence and the pure transitions over it.
//!
//! Mutations are expressed as functions from `&[Turn]` to a new `Vec<Turn>`
//! so the send/edit flows can be exercised without a rendering layer or a
//! live backend.

use lobby_api::Role;

/// One chat turn: a role plus the text fragments received for it
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    /// Fragments in arrival order; display joins them without separators
    pub fragments: Vec<String>,
    /// Still receiving streamed fragments
    pub streaming: bool,
}

impl Turn {
    /// A finished user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            fragments: vec![text.into()],
            streaming: false,
        }
    }

    /// An empty assistant turn that is about to receive fragments
    pub fn assistant_streaming() -> Self {
        Self {
            role: Role::Assistant,
            fragments: vec![],
            streaming: true,
        }
    }

    /// A finished assistant turn
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            fragments: vec![text.into()],
            streaming: false,
        }
    }

    /// The turn's text, fragments concatenated in arrival order
    pub fn text(&self) -> String {
        self.fragments.concat()
    }
}

/// The conversation shown in the chat page
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// Backend id; `None` until the first send creates the conversation
    pub id: Option<String>,
    pub title: String,
    pub turns: Vec<Turn>,
    /// Last error surfaced to the banner
    pub error: Option<String>,
}

impl Conversation {
    /// An empty, not-yet-created conversation
    pub fn untitled() -> Self {
        Self {
            title: "New chat".to_string(),
            ..Default::default()
        }
    }

    /// A conversation loaded from backend history
    pub fn from_history(id: String, title: String, turns: Vec<Turn>) -> Self {
        Self {
            id: Some(id),
            title,
            turns,
            error: None,
        }
    }

    /// Whether the last turn is still receiving fragments
    pub fn is_streaming(&self) -> bool {
        self.turns.last().is_some_and(|t| t.streaming)
    }
}

/// Sequence with a user turn appended
pub fn with_user_turn(turns: &[Turn], text: &str) -> Vec<Turn> {
    let mut next = turns.to_vec();
    next.push(Turn::user(text));
    next
}

/// Sequence with an empty streaming assistant turn appended
pub fn with_open_assistant(turns: &[Turn]) -> Vec<Turn> {
    debug_assert!(
        !turns.iter().any(|t| t.streaming),
        "only one turn may be in flight"
    );
    let mut next = turns.to_vec();
    next.push(Turn::assistant_streaming());
    next
}

/// Sequence with `fragment` appended to the in-flight turn.
///
/// Fragments always land on the last turn; if nothing is in flight the
/// sequence is returned unchanged (a late fragment after an error).
pub fn with_fragment(turns: &[Turn], fragment: &str) -> Vec<Turn> {
    let mut next = turns.to_vec();
    if let Some(last) = next.last_mut() {
        if last.streaming {
            last.fragments.push(fragment.to_string());
        }
    }
    next
}

/// Sequence with the in-flight flag cleared on the last turn
pub fn with_sealed(turns: &[Turn]) -> Vec<Turn> {
    let mut next = turns.to_vec();
    if let Some(last) = next.last_mut() {
        last.streaming = false;
    }
    next
}

/// Sequence without the most recent user turn and everything after it.
///
/// Scans from the end for the last user turn; returns the shortened
/// sequence and the removed user text, or `None` when no user turn exists
/// (the edit flow is then a no-op).
pub fn without_last_exchange(turns: &[Turn]) -> Option<(Vec<Turn>, String)> {
    let idx = turns.iter().rposition(|t| t.role == Role::User)?;
    let removed = turns[idx].text();
    Some((turns[..idx].to_vec(), removed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_turn_appends() {
        let turns = with_user_turn(&[], "hi");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].text(), "hi");
    }

    #[test]
    fn test_fragments_concatenate_in_order() {
        let mut turns = with_open_assistant(&[Turn::user("q")]);
        for fragment in ["The ", "quick ", "brown ", "fox"] {
            turns = with_fragment(&turns, fragment);
        }
        let turns = with_sealed(&turns);
        assert_eq!(turns.last().unwrap().text(), "The quick brown fox");
        assert!(!turns.last().unwrap().streaming);
    }

    #[test]
    fn test_fragment_ignored_when_nothing_in_flight() {
        let turns = vec![Turn::user("q"), Turn::assistant("a")];
        let next = with_fragment(&turns, "late");
        assert_eq!(next, turns);
    }

    #[test]
    fn test_remove_last_exchange() {
        let turns = vec![Turn::user("a"), Turn::assistant("b")];
        let (rest, removed) = without_last_exchange(&turns).unwrap();
        assert!(rest.is_empty());
        assert_eq!(removed, "a");
    }

    #[test]
    fn test_remove_last_exchange_keeps_earlier_turns() {
        let turns = vec![
            Turn::user("first"),
            Turn::assistant("one"),
            Turn::user("second"),
            Turn::assistant("two"),
        ];
        let (rest, removed) = without_last_exchange(&turns).unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(removed, "second");
        assert_eq!(rest[1].text(), "one");
    }

    #[test]
    fn test_remove_last_exchange_without_user_turn() {
        assert!(without_last_exchange(&[]).is_none());
        assert!(without_last_exchange(&[Turn::assistant("orphan")]).is_none());
    }

    #[test]
    fn test_only_last_turn_streams() {
        let turns = with_open_assistant(&[Turn::user("q")]);
        let streaming: Vec<bool> = turns.iter().map(|t| t.streaming).collect();
        assert_eq!(streaming, vec![false, true]);
        assert_eq!(turns.last().unwrap().role, Role::Assistant);
    }
}
