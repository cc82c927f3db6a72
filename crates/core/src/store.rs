//! Storage seams for the sync engine.
//!
//! The Postgres implementations live in `streamcal-db`; [`crate::memory`]
//! provides an in-process implementation with the same semantics.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::types::{DateWindow, FavoriteChannel, LiveState, NewFavorite, StreamEvent};

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert or fully replace rows keyed by `video_id`. Returns the number of rows written.
    async fn upsert_many(&self, events: &[StreamEvent]) -> Result<u64>;

    async fn list_by_live_state(&self, states: &[LiveState]) -> Result<Vec<StreamEvent>>;

    /// Events for the given channels ordered by scheduled start, optionally
    /// limited to those scheduled inside `window`.
    async fn list_for_channels(
        &self,
        channel_ids: &[String],
        window: Option<DateWindow>,
    ) -> Result<Vec<StreamEvent>>;

    /// Deletes completed events scheduled strictly before `cutoff`.
    async fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    async fn distinct_channel_ids(&self) -> Result<Vec<String>>;

    async fn delete_by_channel(&self, channel_id: &str) -> Result<u64>;
}

#[async_trait]
pub trait FetchLedger: Send + Sync {
    /// True when any recorded window for the channel overlaps `[start, end]`.
    async fn is_range_covered(&self, channel_id: &str, start: NaiveDate, end: NaiveDate)
        -> Result<bool>;

    /// Insert-or-ignore on `(channel_id, start, end)`.
    async fn record_range(&self, channel_id: &str, start: NaiveDate, end: NaiveDate) -> Result<()>;

    /// Channels with at least one recorded window.
    async fn distinct_channel_ids(&self) -> Result<Vec<String>>;

    async fn delete_started_before(&self, cutoff: NaiveDate) -> Result<u64>;

    async fn delete_by_channel(&self, channel_id: &str) -> Result<u64>;
}

#[async_trait]
pub trait FavoriteDirectory: Send + Sync {
    /// Every non-tombstoned favorite row, across owners.
    async fn list_active(&self) -> Result<Vec<FavoriteChannel>>;

    /// Adds a favorite, reviving a tombstoned row for the same owner and channel.
    async fn add(&self, favorite: &NewFavorite) -> Result<FavoriteChannel>;

    /// Tombstones the owner's favorite. Returns false when nothing was active.
    async fn tombstone(&self, owner_id: &str, channel_id: &str) -> Result<bool>;

    async fn touch_last_seen(&self, owner_id: &str, seen_at: DateTime<Utc>) -> Result<u64>;
}
