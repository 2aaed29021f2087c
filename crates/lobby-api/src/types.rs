//! Data transfer types for the backend's REST surface

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Message roles as the backend stores them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Get the wire name for this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single text block inside a stored message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
}

/// A stored chat message as returned by `GET /chat/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: Vec<TextBlock>,
}

impl HistoryMessage {
    /// Combined text of all content blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A conversation row from `GET /chats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /chat/stream`
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub message: String,
    pub chat_id: Option<String>,
}

/// Request body for the best-effort `POST /chat/trim`
#[derive(Debug, Clone, Serialize)]
pub struct TrimRequest {
    pub chat_id: String,
    /// Number of trailing messages the server should drop
    pub drop_last: u32,
}

/// The signed-in account, `GET /users/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Partial profile update, `PATCH /users/me`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Password change, `POST /users/me/password`
#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Bearer token response from `POST /token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// A user row in the admin directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// Partial user update, `PATCH /admin/users/{id}`
///
/// Absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl UserPatch {
    /// Patch that only flips the active flag
    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// One activity-log row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<String>,
    pub activity: String,
    #[serde(default)]
    pub level: Option<LogLevel>,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// A page of activity logs, `GET /admin/logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPage {
    pub total: u64,
    pub items: Vec<LogEntry>,
}

/// Server-side filters for log listing and CSV export
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub q: Option<String>,
    pub level: Option<LogLevel>,
    pub user_id: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl LogQuery {
    /// Build the query-string pairs this filter produces.
    ///
    /// Empty strings are treated as unset, matching the console's behavior of
    /// not sending blank filters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(q) = self.q.as_deref() {
            let q = q.trim();
            if !q.is_empty() {
                pairs.push(("q", q.to_string()));
            }
        }
        if let Some(level) = self.level {
            pairs.push(("level", level.as_str().to_string()));
        }
        if let Some(user_id) = self.user_id.as_deref() {
            let user_id = user_id.trim();
            if !user_id.is_empty() {
                pairs.push(("user_id", user_id.to_string()));
            }
        }
        if let Some(from) = self.date_from {
            pairs.push(("date_from", from.to_rfc3339()));
        }
        if let Some(to) = self.date_to {
            pairs.push(("date_to", to.to_rfc3339()));
        }
        pairs
    }
}

/// Aggregate dashboard counters, `GET /admin/metrics`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    #[serde(rename = "Users", default)]
    pub users: u64,
    #[serde(rename = "Chats", default)]
    pub chats: u64,
    #[serde(rename = "Tokens", default)]
    pub tokens: u64,
    #[serde(rename = "Docs", default)]
    pub docs: u64,
    #[serde(rename = "DAU", default)]
    pub dau: u64,
    #[serde(rename = "WAU", default)]
    pub wau: u64,
    #[serde(rename = "MAU", default)]
    pub mau: u64,
    #[serde(rename = "MessagesToday", default)]
    pub messages_today: u64,
    #[serde(rename = "ActiveChatsToday", default)]
    pub active_chats_today: u64,
    #[serde(rename = "CostToday", default)]
    pub cost_today: f64,
    #[serde(default)]
    pub p50_ms: Option<f64>,
    #[serde(default)]
    pub p95_ms: Option<f64>,
}

/// Daily count point (messages and active-users series)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountPoint {
    pub day: String,
    pub count: u64,
}

/// Daily latency percentiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyPoint {
    pub day: String,
    #[serde(default)]
    pub p50_ms: Option<f64>,
    #[serde(default)]
    pub p95_ms: Option<f64>,
}

/// Daily token volume and cost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensCostPoint {
    pub day: String,
    pub tokens: u64,
    #[serde(default)]
    pub cost: f64,
}

/// Tunable server settings, `GET`/`PATCH /admin/settings`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub access_token_ttl_min: u32,
    pub reset_code_ttl_min: u32,
    pub reset_max_attempts: u32,
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default)]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: String,
    #[serde(default)]
    pub smtp_from: String,
}

/// Per-agent access policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentPolicy {
    #[serde(default)]
    pub enabled: bool,
    /// Roles allowed to use the agent
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Agent name -> policy map, `GET`/`PUT /admin/agent-policies`
pub type AgentPolicies = BTreeMap<String, AgentPolicy>;

/// A message row in the admin chat console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Receipt for a document upload
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub uploaded: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_query_skips_blank_filters() {
        let query = LogQuery {
            q: Some("  ".to_string()),
            user_id: Some(String::new()),
            limit: Some(25),
            offset: Some(50),
            ..Default::default()
        };
        let pairs = query.to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("limit", "25".to_string()),
                ("offset", "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_log_query_full_filter_set() {
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 59).unwrap();
        let query = LogQuery {
            q: Some("login".to_string()),
            level: Some(LogLevel::Error),
            user_id: Some("u-42".to_string()),
            date_from: Some(from),
            date_to: Some(to),
            limit: Some(10),
            offset: Some(0),
        };
        let pairs = query.to_pairs();
        assert!(pairs.contains(&("q", "login".to_string())));
        assert!(pairs.contains(&("level", "ERROR".to_string())));
        assert!(pairs.contains(&("user_id", "u-42".to_string())));
        assert!(pairs.iter().any(|(k, v)| *k == "date_from" && v.starts_with("2024-03-01T00:00:00")));
        assert!(pairs.iter().any(|(k, v)| *k == "date_to" && v.starts_with("2024-03-07T23:59:59")));
    }

    #[test]
    fn test_metrics_deserialize_backend_keys() {
        let snapshot: MetricsSnapshot = serde_json::from_str(
            r#"{"Users":12,"Chats":80,"Tokens":123456,"Docs":4,"DAU":7,"CostToday":1.25,"p95_ms":420.0}"#,
        )
        .unwrap();
        assert_eq!(snapshot.users, 12);
        assert_eq!(snapshot.chats, 80);
        assert_eq!(snapshot.dau, 7);
        assert_eq!(snapshot.wau, 0);
        assert_eq!(snapshot.p95_ms, Some(420.0));
        assert!(snapshot.p50_ms.is_none());
    }

    #[test]
    fn test_user_patch_serializes_only_set_fields() {
        let patch = UserPatch::active(false);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"is_active": false}));
    }

    #[test]
    fn test_history_message_text_joins_blocks() {
        let msg = HistoryMessage {
            role: Role::Assistant,
            content: vec![
                TextBlock { text: "first".to_string() },
                TextBlock { text: "second".to_string() },
            ],
        };
        assert_eq!(msg.text(), "first\nsecond");
    }
}
