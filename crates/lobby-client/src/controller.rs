//! Chat controller: streaming send and edit-and-resend
//!
//! Owns one conversation's turn list, opens the streaming completion
//! request, applies decoded fragments to the in-flight assistant turn in
//! arrival order, and supports replacing the most recent user turn and
//! resubmitting. All backend access goes through the injected
//! [`ChatBackend`], so the whole flow runs against a scripted mock in tests.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::broadcast;

use crate::conversation::{
    Conversation, with_fragment, with_open_assistant, with_sealed, with_user_turn,
    without_last_exchange,
};
use crate::error::{Error, Result};
use crate::events::SessionEvent;
use crate::transport::ChatBackend;

/// Placeholder title assigned by the backend to fresh conversations
pub const DEFAULT_TITLE: &str = "New chat";

/// Maximum characters of the first message used as an auto-title
const TITLE_CHARS: usize = 48;

/// Where the controller is in the send cycle.
///
/// Errors carry no state of their own: they set a message on the
/// conversation and the phase returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// User turn appended, request not yet open
    Sending,
    /// Assistant turn accumulating fragments
    Streaming,
}

/// The controller behind the chat page
pub struct ChatController {
    conversation: Conversation,
    backend: Arc<dyn ChatBackend>,
    event_tx: broadcast::Sender<SessionEvent>,
    phase: Phase,
}

impl ChatController {
    /// Create a controller for a fresh, not-yet-created conversation
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            conversation: Conversation::untitled(),
            backend,
            event_tx,
            phase: Phase::Idle,
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// The conversation being displayed
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Current phase of the send cycle
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Replace the conversation wholesale (switching chats)
    pub fn load(&mut self, conversation: Conversation) {
        self.conversation = conversation;
        self.phase = Phase::Idle;
    }

    /// Send a message and stream the reply into a new assistant turn.
    ///
    /// Partial output already applied is retained on failure; the phase
    /// always returns to `Idle`.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        if self.phase != Phase::Idle {
            return Err(Error::Other("a send is already in flight".to_string()));
        }

        self.conversation.error = None;
        self.phase = Phase::Sending;
        let _ = self.event_tx.send(SessionEvent::SendStart {
            text: text.to_string(),
        });

        let chat_id = match self.ensure_chat(text).await {
            Ok(chat_id) => chat_id,
            Err(e) => return self.fail(e),
        };

        self.conversation.turns = with_user_turn(&self.conversation.turns, text);

        let mut stream = match self.backend.stream_completion(&chat_id, text).await {
            Ok(stream) => stream,
            Err(e) => return self.fail(Error::Api(e)),
        };

        self.conversation.turns = with_open_assistant(&self.conversation.turns);
        self.phase = Phase::Streaming;
        let _ = self.event_tx.send(SessionEvent::StreamStart);

        let mut stream_error: Option<Error> = None;
        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    self.conversation.turns = with_fragment(&self.conversation.turns, &fragment);
                    let _ = self.event_tx.send(SessionEvent::Fragment { delta: fragment });
                }
                Err(e) => {
                    stream_error = Some(Error::Api(e));
                    break;
                }
            }
        }

        self.conversation.turns = with_sealed(&self.conversation.turns);
        self.phase = Phase::Idle;

        match stream_error {
            Some(e) => {
                self.conversation.error = Some(e.to_string());
                let _ = self.event_tx.send(SessionEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
            None => {
                let text = self
                    .conversation
                    .turns
                    .last()
                    .map(|t| t.text())
                    .unwrap_or_default();
                let _ = self.event_tx.send(SessionEvent::StreamEnd { text });
                Ok(())
            }
        }
    }

    /// Replace the most recent user turn and resubmit.
    ///
    /// Removes that turn and any trailing assistant turn, tells the backend
    /// to drop the same messages (best-effort, failure ignored), then calls
    /// [`ChatController::send`]. A conversation without a user turn is left
    /// untouched.
    pub async fn edit_last(&mut self, new_text: &str) -> Result<()> {
        if self.phase != Phase::Idle {
            return Err(Error::Other("a send is already in flight".to_string()));
        }

        let Some((rest, _removed)) = without_last_exchange(&self.conversation.turns) else {
            return Ok(());
        };
        let dropped = (self.conversation.turns.len() - rest.len()) as u32;
        self.conversation.turns = rest;

        if let Some(chat_id) = self.conversation.id.clone() {
            if let Err(e) = self.backend.trim_history(&chat_id, dropped).await {
                tracing::debug!("history trim failed, continuing: {}", e);
            }
        }

        self.send(new_text).await
    }

    /// Create the conversation on first send, or refresh a placeholder
    /// title from the message text. Returns the conversation id.
    async fn ensure_chat(&mut self, text: &str) -> Result<String> {
        let title = derive_title(text);

        let Some(chat_id) = self.conversation.id.clone() else {
            let chat = self.backend.create_chat(&title).await.map_err(Error::Api)?;
            self.conversation.title = chat.title.clone();
            self.conversation.id = Some(chat.id.clone());
            let _ = self.event_tx.send(SessionEvent::ChatCreated {
                chat_id: chat.id.clone(),
                title: chat.title,
            });
            return Ok(chat.id);
        };

        if self.conversation.title.is_empty() || self.conversation.title == DEFAULT_TITLE {
            self.conversation.title = title.clone();
            if let Err(e) = self.backend.rename_chat(&chat_id, &title).await {
                tracing::debug!("auto-rename failed, continuing: {}", e);
            }
        }
        Ok(chat_id)
    }

    /// Record a failure, notify subscribers, and return to `Idle`.
    fn fail(&mut self, e: Error) -> Result<()> {
        self.conversation.error = Some(e.to_string());
        self.phase = Phase::Idle;
        let _ = self.event_tx.send(SessionEvent::Error {
            message: e.to_string(),
        });
        Err(e)
    }
}

/// Title for an auto-created conversation: the first characters of the text
fn derive_title(text: &str) -> String {
    let title: String = text.chars().take(TITLE_CHARS).collect();
    if title.trim().is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Turn;
    use async_trait::async_trait;
    use lobby_api::{ChatSummary, CompletionStream, Role};
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Scripted backend: each send consumes one fragment script, every
    /// mutation is recorded for assertions.
    #[derive(Default)]
    struct MockBackend {
        scripts: Mutex<VecDeque<Vec<lobby_api::Result<String>>>>,
        created: Mutex<Vec<String>>,
        renamed: Mutex<Vec<(String, String)>>,
        trims: Mutex<Vec<(String, u32)>>,
        fail_open: bool,
        fail_trim: bool,
    }

    impl MockBackend {
        fn with_fragments(fragments: &[&str]) -> Self {
            let script = fragments
                .iter()
                .map(|f| Ok(f.to_string()))
                .collect::<Vec<_>>();
            let backend = Self::default();
            backend.scripts.lock().push_back(script);
            backend
        }

        fn push_script(&self, script: Vec<lobby_api::Result<String>>) {
            self.scripts.lock().push_back(script);
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn create_chat(&self, title: &str) -> lobby_api::Result<ChatSummary> {
            self.created.lock().push(title.to_string());
            Ok(ChatSummary {
                id: "chat-1".to_string(),
                title: title.to_string(),
                created_at: None,
            })
        }

        async fn rename_chat(&self, chat_id: &str, title: &str) -> lobby_api::Result<()> {
            self.renamed
                .lock()
                .push((chat_id.to_string(), title.to_string()));
            Ok(())
        }

        async fn stream_completion(
            &self,
            _chat_id: &str,
            _message: &str,
        ) -> lobby_api::Result<CompletionStream> {
            if self.fail_open {
                return Err(lobby_api::Error::MissingBody);
            }
            let script = self.scripts.lock().pop_front().unwrap_or_default();
            Ok(Box::pin(tokio_stream::iter(script)))
        }

        async fn trim_history(&self, chat_id: &str, drop_last: u32) -> lobby_api::Result<()> {
            self.trims.lock().push((chat_id.to_string(), drop_last));
            if self.fail_trim {
                return Err(lobby_api::Error::Status {
                    status: 500,
                    detail: "trim unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    fn controller_with(backend: MockBackend) -> (ChatController, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        (ChatController::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_final_turn_is_fragment_concatenation() {
        let fragments = ["Rust ", "is ", "a ", "systems ", "language"];
        let (mut controller, _) = controller_with(MockBackend::with_fragments(&fragments));

        controller.send("tell me about rust").await.unwrap();

        let turns = &controller.conversation().turns;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].text(), fragments.concat());
        assert!(!turns[1].streaming);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_first_send_creates_chat_with_derived_title() {
        let (mut controller, backend) = controller_with(MockBackend::with_fragments(&["ok"]));

        let long = "x".repeat(100);
        controller.send(&long).await.unwrap();

        let created = backend.created.lock();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].chars().count(), 48);
        assert_eq!(controller.conversation().id.as_deref(), Some("chat-1"));
    }

    #[tokio::test]
    async fn test_placeholder_title_renamed_on_send() {
        let backend = MockBackend::with_fragments(&["ok"]);
        let (mut controller, backend) = controller_with(backend);
        controller.load(Conversation::from_history(
            "chat-9".to_string(),
            DEFAULT_TITLE.to_string(),
            vec![],
        ));

        controller.send("name me").await.unwrap();

        let renamed = backend.renamed.lock();
        assert_eq!(renamed.len(), 1);
        assert_eq!(renamed[0], ("chat-9".to_string(), "name me".to_string()));
    }

    #[tokio::test]
    async fn test_edit_last_removes_exchange_and_resends() {
        let backend = MockBackend::default();
        backend.push_script(vec![Ok("reply to c".to_string())]);
        let (mut controller, backend) = controller_with(backend);
        controller.load(Conversation::from_history(
            "chat-2".to_string(),
            "Earlier".to_string(),
            vec![Turn::user("a"), Turn::assistant("b")],
        ));

        controller.edit_last("c").await.unwrap();

        let turns = &controller.conversation().turns;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].text(), "c");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[1].text(), "reply to c");

        // both removed messages were reported to the server
        assert_eq!(backend.trims.lock().as_slice(), &[("chat-2".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_edit_last_without_user_turn_is_noop() {
        let (mut controller, backend) = controller_with(MockBackend::default());
        controller.load(Conversation::from_history(
            "chat-3".to_string(),
            "Empty".to_string(),
            vec![],
        ));

        controller.edit_last("ignored").await.unwrap();

        assert!(controller.conversation().turns.is_empty());
        assert!(backend.trims.lock().is_empty());
        assert!(backend.scripts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_edit_last_survives_trim_failure() {
        let backend = MockBackend {
            fail_trim: true,
            ..Default::default()
        };
        backend.push_script(vec![Ok("second answer".to_string())]);
        let (mut controller, _) = controller_with(backend);
        controller.load(Conversation::from_history(
            "chat-4".to_string(),
            "T".to_string(),
            vec![Turn::user("first"), Turn::assistant("first answer")],
        ));

        controller.edit_last("retry").await.unwrap();

        let turns = &controller.conversation().turns;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].text(), "second answer");
        assert!(controller.conversation().error.is_none());
    }

    #[tokio::test]
    async fn test_open_failure_keeps_user_turn_and_sets_error() {
        let backend = MockBackend {
            fail_open: true,
            ..Default::default()
        };
        let (mut controller, _) = controller_with(backend);
        controller.load(Conversation::from_history(
            "chat-5".to_string(),
            "T".to_string(),
            vec![],
        ));

        let result = controller.send("hello").await;

        assert!(result.is_err());
        let conversation = controller.conversation();
        assert_eq!(conversation.turns.len(), 1);
        assert_eq!(conversation.turns[0].role, Role::User);
        assert!(conversation.error.is_some());
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_mid_stream_error_retains_partial_output() {
        let backend = MockBackend::default();
        backend.push_script(vec![
            Ok("partial ".to_string()),
            Ok("answer".to_string()),
            Err(lobby_api::Error::StreamDecode("connection dropped".to_string())),
        ]);
        let (mut controller, _) = controller_with(backend);
        controller.load(Conversation::from_history(
            "chat-6".to_string(),
            "T".to_string(),
            vec![],
        ));

        let result = controller.send("q").await;

        assert!(result.is_err());
        let turns = &controller.conversation().turns;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].text(), "partial answer");
        assert!(!turns[1].streaming, "errored turn must not stay in flight");
        assert!(controller.conversation().error.is_some());
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (mut controller, _) = controller_with(MockBackend::with_fragments(&["a", "b"]));
        let mut events = controller.subscribe();

        controller.send("q").await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(match event {
                SessionEvent::SendStart { .. } => "send_start",
                SessionEvent::ChatCreated { .. } => "chat_created",
                SessionEvent::StreamStart => "stream_start",
                SessionEvent::Fragment { .. } => "fragment",
                SessionEvent::StreamEnd { .. } => "stream_end",
                SessionEvent::Error { .. } => "error",
            });
        }
        assert_eq!(
            kinds,
            vec![
                "send_start",
                "chat_created",
                "stream_start",
                "fragment",
                "fragment",
                "stream_end"
            ]
        );
    }
}
