//! Admin endpoints: metrics, time series, users, logs, settings, policies

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{
    AdminMessage, AgentPolicies, ChatSummary, CountPoint, LatencyPoint, LogPage, LogQuery,
    MetricsSnapshot, ServerSettings, TokensCostPoint, UserAccount, UserPatch,
};

fn days_query(days: u32) -> Vec<(&'static str, String)> {
    vec![("days", days.to_string())]
}

impl ApiClient {
    /// Aggregate dashboard counters
    pub async fn metrics(&self) -> Result<MetricsSnapshot> {
        self.get_json("/admin/metrics", &[]).await
    }

    /// Messages per day over the last `days` days
    pub async fn messages_series(&self, days: u32) -> Result<Vec<CountPoint>> {
        self.get_json("/admin/timeseries/messages", &days_query(days)).await
    }

    /// Active users per day over the last `days` days
    pub async fn users_series(&self, days: u32) -> Result<Vec<CountPoint>> {
        self.get_json("/admin/timeseries/users", &days_query(days)).await
    }

    /// Latency percentiles per day
    pub async fn latency_series(&self, days: u32) -> Result<Vec<LatencyPoint>> {
        self.get_json("/admin/latency", &days_query(days)).await
    }

    /// Token volume and cost per day
    pub async fn tokens_cost_series(&self, days: u32) -> Result<Vec<TokensCostPoint>> {
        self.get_json("/admin/timeseries/tokens_cost", &days_query(days)).await
    }

    /// List user accounts, optionally narrowed by a server-side search
    pub async fn list_users(&self, q: Option<&str>) -> Result<Vec<UserAccount>> {
        let query: Vec<(&str, String)> = match q.map(str::trim) {
            Some(q) if !q.is_empty() => vec![("q", q.to_string())],
            _ => vec![],
        };
        self.get_json("/admin/users", &query).await
    }

    /// Patch a user. A `409` surfaces as [`crate::Error::Conflict`] with the
    /// server's uniqueness message.
    pub async fn update_user(&self, user_id: &str, patch: &UserPatch) -> Result<UserAccount> {
        self.patch_json(&format!("/admin/users/{}", user_id), patch).await
    }

    /// Conversations belonging to a user (admin chat console)
    pub async fn user_chats(&self, user_id: &str) -> Result<Vec<ChatSummary>> {
        self.get_json(&format!("/admin/users/{}/chats", user_id), &[]).await
    }

    /// Messages of any conversation (admin chat console)
    pub async fn chat_messages(&self, chat_id: &str, limit: u32) -> Result<Vec<AdminMessage>> {
        self.get_json(
            &format!("/admin/chats/{}/messages", chat_id),
            &[("limit", limit.to_string())],
        )
        .await
    }

    /// Post a reply into a user's conversation as the assistant
    pub async fn admin_reply(&self, chat_id: &str, text: &str) -> Result<()> {
        self.post_unit(
            &format!("/admin/chats/{}/reply", chat_id),
            &serde_json::json!({ "text": text, "role": "assistant" }),
        )
        .await
    }

    /// One page of activity logs
    pub async fn list_logs(&self, query: &LogQuery) -> Result<LogPage> {
        self.get_json("/admin/logs", &query.to_pairs()).await
    }

    /// The filtered log set as CSV text
    pub async fn export_logs_csv(&self, query: &LogQuery) -> Result<String> {
        // limit/offset do not apply to exports
        let export = LogQuery {
            limit: None,
            offset: None,
            ..query.clone()
        };
        self.get_text("/admin/logs/export", &export.to_pairs()).await
    }

    /// Delete a single log row
    pub async fn delete_log(&self, log_id: i64) -> Result<()> {
        self.delete_unit(&format!("/admin/logs/{}", log_id)).await
    }

    /// Delete a batch of log rows
    pub async fn bulk_delete_logs(&self, ids: &[i64]) -> Result<()> {
        self.post_unit("/admin/logs/bulk-delete", &serde_json::json!({ "ids": ids }))
            .await
    }

    /// Current server settings
    pub async fn settings(&self) -> Result<ServerSettings> {
        self.get_json("/admin/settings", &[]).await
    }

    /// Patch server settings; the server echoes the stored result
    pub async fn update_settings(&self, settings: &ServerSettings) -> Result<ServerSettings> {
        self.patch_json("/admin/settings", settings).await
    }

    /// Agent access policy map
    pub async fn agent_policies(&self) -> Result<AgentPolicies> {
        self.get_json("/admin/agent-policies", &[]).await
    }

    /// Replace the agent access policy map
    pub async fn put_agent_policies(&self, policies: &AgentPolicies) -> Result<AgentPolicies> {
        self.put_json("/admin/agent-policies", policies).await
    }
}
