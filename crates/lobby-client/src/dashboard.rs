//! Dashboard snapshot assembly and refresh cadence

use std::time::Duration;

use chrono::{DateTime, Utc};
use lobby_api::{ApiClient, CountPoint, LatencyPoint, MetricsSnapshot, TokensCostPoint};

use crate::error::Result;

/// How often the dashboard page refreshes while visible
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Default lookback window for the time series, in days
pub const DEFAULT_DAYS: u32 = 30;

/// Everything the dashboard page renders, fetched in one refresh
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub metrics: MetricsSnapshot,
    pub messages: Vec<CountPoint>,
    pub users: Vec<CountPoint>,
    pub latency: Vec<LatencyPoint>,
    pub tokens_cost: Vec<TokensCostPoint>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl DashboardSnapshot {
    /// Fetch all dashboard reads concurrently
    pub async fn fetch(client: &ApiClient, days: u32) -> Result<Self> {
        let (metrics, messages, users, latency, tokens_cost) = tokio::try_join!(
            client.metrics(),
            client.messages_series(days),
            client.users_series(days),
            client.latency_series(days),
            client.tokens_cost_series(days),
        )?;

        Ok(Self {
            metrics,
            messages,
            users,
            latency,
            tokens_cost,
            refreshed_at: Some(Utc::now()),
        })
    }

    /// Token counts for the sparkline, oldest first
    pub fn token_sparkline(&self) -> Vec<u64> {
        self.tokens_cost.iter().map(|p| p.tokens).collect()
    }
}
