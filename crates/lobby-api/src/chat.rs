//! Conversation endpoints: listing, history, creation, rename, streaming

use crate::client::ApiClient;
use crate::error::{Error, Result};
use crate::stream::{CompletionStream, text_fragments};
use crate::types::{ChatSummary, CompletionRequest, HistoryMessage, TrimRequest};

impl ApiClient {
    /// Conversations for the signed-in account, newest first
    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        self.get_json("/chats", &[]).await
    }

    /// Full history of one conversation
    pub async fn chat_history(&self, chat_id: &str) -> Result<Vec<HistoryMessage>> {
        self.get_json(&format!("/chat/{}", chat_id), &[]).await
    }

    /// Create a conversation; the server assigns the id
    pub async fn create_chat(&self, title: &str) -> Result<ChatSummary> {
        self.post_json("/chat/new", &serde_json::json!({ "title": title })).await
    }

    /// Rename a conversation
    pub async fn rename_chat(&self, chat_id: &str, title: &str) -> Result<ChatSummary> {
        self.post_json(
            "/chat/rename",
            &serde_json::json!({ "chat_id": chat_id, "title": title }),
        )
        .await
    }

    /// Open a streaming completion. The response body is chunked plain text,
    /// surfaced as a stream of decoded fragments in arrival order.
    pub async fn stream_completion(
        &self,
        chat_id: &str,
        message: &str,
    ) -> Result<CompletionStream> {
        let request = CompletionRequest {
            message: message.to_string(),
            chat_id: Some(chat_id.to_string()),
        };
        let response = self
            .authorize(self.http.post(self.url("/chat/stream")).json(&request))
            .send()
            .await?;
        let response = self.check(response).await?;

        if response.content_length() == Some(0) {
            return Err(Error::MissingBody);
        }

        Ok(text_fragments(response))
    }

    /// Ask the server to drop the last `drop_last` messages of a
    /// conversation. Callers treat this as best-effort.
    pub async fn trim_history(&self, chat_id: &str, drop_last: u32) -> Result<()> {
        let request = TrimRequest {
            chat_id: chat_id.to_string(),
            drop_last,
        };
        self.post_unit("/chat/trim", &request).await
    }
}
