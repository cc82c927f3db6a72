use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::LiveState;

/// Maximum ids accepted by a single details lookup.
pub const DETAILS_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastState {
    Live,
    Upcoming,
    Completed,
}

impl BroadcastState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastState::Live => "live",
            BroadcastState::Upcoming => "upcoming",
            BroadcastState::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub channel_id: String,
    pub state: BroadcastState,
    pub published_after: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
}

impl SearchQuery {
    pub fn new(channel_id: impl Into<String>, state: BroadcastState) -> Self {
        Self {
            channel_id: channel_id.into(),
            state,
            published_after: None,
            published_before: None,
        }
    }

    pub fn published_after(mut self, at: DateTime<Utc>) -> Self {
        self.published_after = Some(at);
        self
    }

    pub fn published_before(mut self, at: DateTime<Utc>) -> Self {
        self.published_before = Some(at);
        self
    }
}

/// Full metadata for a single video as returned by the details endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
    pub live_state: LiveState,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
}

/// Read-only view of the external video platform.
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Video ids matching the query (a single result page).
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>>;

    /// Details for up to [`DETAILS_BATCH_SIZE`] ids.
    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>>;

    /// Search followed by a details lookup for the hits.
    async fn search_with_details(&self, query: &SearchQuery) -> Result<Vec<VideoDetails>> {
        let ids = self.search(query).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.video_details(&ids).await
    }
}
