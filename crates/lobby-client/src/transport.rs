//! Backend seam for the chat controller

use async_trait::async_trait;
use lobby_api::{ApiClient, ChatSummary, CompletionStream};

/// The slice of the backend the chat controller needs.
///
/// Kept behind a trait so controller tests can script the stream and record
/// the trim calls.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Create a conversation, returning its id and stored title
    async fn create_chat(&self, title: &str) -> lobby_api::Result<ChatSummary>;

    /// Rename a conversation
    async fn rename_chat(&self, chat_id: &str, title: &str) -> lobby_api::Result<()>;

    /// Open the streaming completion for a message
    async fn stream_completion(
        &self,
        chat_id: &str,
        message: &str,
    ) -> lobby_api::Result<CompletionStream>;

    /// Ask the server to drop the last `drop_last` messages (best-effort)
    async fn trim_history(&self, chat_id: &str, drop_last: u32) -> lobby_api::Result<()>;
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn create_chat(&self, title: &str) -> lobby_api::Result<ChatSummary> {
        ApiClient::create_chat(self, title).await
    }

    async fn rename_chat(&self, chat_id: &str, title: &str) -> lobby_api::Result<()> {
        ApiClient::rename_chat(self, chat_id, title).await?;
        Ok(())
    }

    async fn stream_completion(
        &self,
        chat_id: &str,
        message: &str,
    ) -> lobby_api::Result<CompletionStream> {
        ApiClient::stream_completion(self, chat_id, message).await
    }

    async fn trim_history(&self, chat_id: &str, drop_last: u32) -> lobby_api::Result<()> {
        ApiClient::trim_history(self, chat_id, drop_last).await
    }
}
