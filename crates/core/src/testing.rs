//! Shared fixtures for unit tests in this crate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::error::{Error, Result};
use crate::memory::MemoryStore;
use crate::platform::{BroadcastState, SearchQuery, VideoDetails, VideoPlatform};
use crate::store::{EventStore, FavoriteDirectory, FetchLedger};
use crate::types::{DateWindow, EventType, FavoriteChannel, LiveState, NewFavorite, StreamEvent};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn event(video_id: &str, channel_id: &str, event_type: EventType) -> StreamEvent {
    let live_state = match event_type {
        EventType::Live => LiveState::Live,
        EventType::Upcoming => LiveState::Upcoming,
        EventType::Completed => LiveState::None,
    };
    StreamEvent {
        video_id: video_id.to_string(),
        channel_id: channel_id.to_string(),
        title: format!("Stream {video_id}"),
        thumbnail: format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg"),
        channel_title: format!("Channel {channel_id}"),
        channel_thumbnail: None,
        scheduled_start_time: Some(at(2025, 3, 10, 12)),
        actual_start_time: None,
        actual_end_time: None,
        live_state,
        event_type,
        published_at: at(2025, 3, 1, 0),
    }
}

pub fn details(video_id: &str, channel_id: &str, live_state: LiveState) -> VideoDetails {
    VideoDetails {
        id: video_id.to_string(),
        title: format!("Stream {video_id}"),
        thumbnail: format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg"),
        channel_id: channel_id.to_string(),
        channel_title: format!("Channel {channel_id}"),
        published_at: at(2025, 3, 1, 0),
        live_state,
        scheduled_start_time: Some(at(2025, 3, 10, 12)),
        actual_start_time: None,
        actual_end_time: None,
    }
}

/// Scripted platform: search hits per (channel, state), details per video id.
#[derive(Default)]
pub struct FakePlatform {
    hits: HashMap<(String, BroadcastState), Vec<String>>,
    videos: HashMap<String, VideoDetails>,
    failing: HashSet<String>,
    quota_exhausted: bool,
    pub searches: Mutex<Vec<SearchQuery>>,
    pub detail_calls: Mutex<Vec<Vec<String>>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hit(mut self, channel_id: &str, state: BroadcastState, video: VideoDetails) -> Self {
        self.hits
            .entry((channel_id.to_string(), state))
            .or_default()
            .push(video.id.clone());
        self.videos.insert(video.id.clone(), video);
        self
    }

    pub fn with_video(mut self, video: VideoDetails) -> Self {
        self.videos.insert(video.id.clone(), video);
        self
    }

    pub fn failing_for(mut self, channel_id: &str) -> Self {
        self.failing.insert(channel_id.to_string());
        self
    }

    pub fn quota_exhausted(mut self) -> Self {
        self.quota_exhausted = true;
        self
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }
}

#[async_trait]
impl VideoPlatform for FakePlatform {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>> {
        self.searches.lock().unwrap().push(query.clone());
        if self.quota_exhausted {
            return Err(Error::ExternalApi {
                status: 403,
                message: "quotaExceeded".to_string(),
                quota_exceeded: true,
            });
        }
        if self.failing.contains(&query.channel_id) {
            return Err(Error::ExternalApi {
                status: 500,
                message: "Internal Server Error".to_string(),
                quota_exceeded: false,
            });
        }
        Ok(self
            .hits
            .get(&(query.channel_id.clone(), query.state))
            .cloned()
            .unwrap_or_default())
    }

    async fn video_details(&self, video_ids: &[String]) -> Result<Vec<VideoDetails>> {
        self.detail_calls.lock().unwrap().push(video_ids.to_vec());
        if self.quota_exhausted {
            return Err(Error::ExternalApi {
                status: 403,
                message: "quotaExceeded".to_string(),
                quota_exceeded: true,
            });
        }
        Ok(video_ids
            .iter()
            .filter_map(|id| self.videos.get(id).cloned())
            .collect())
    }
}

/// Memory store that fails selected operations while a flag is set.
pub struct FlakyStore {
    pub inner: Arc<MemoryStore>,
    pub fail_age_delete: AtomicBool,
    pub fail_ledger: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_age_delete: AtomicBool::new(false),
            fail_ledger: AtomicBool::new(false),
        }
    }

    fn ledger_down(&self) -> Result<()> {
        if self.fail_ledger.load(Ordering::SeqCst) {
            return Err(Error::persistence("relation \"fetched_date_ranges\" does not exist"));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for FlakyStore {
    async fn upsert_many(&self, events: &[StreamEvent]) -> Result<u64> {
        self.inner.upsert_many(events).await
    }
    async fn list_by_live_state(&self, states: &[LiveState]) -> Result<Vec<StreamEvent>> {
        self.inner.list_by_live_state(states).await
    }
    async fn list_for_channels(
        &self,
        channel_ids: &[String],
        window: Option<DateWindow>,
    ) -> Result<Vec<StreamEvent>> {
        self.inner.list_for_channels(channel_ids, window).await
    }
    async fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        if self.fail_age_delete.load(Ordering::SeqCst) {
            return Err(Error::persistence("stream_events unavailable"));
        }
        self.inner.delete_completed_before(cutoff).await
    }
    async fn distinct_channel_ids(&self) -> Result<Vec<String>> {
        EventStore::distinct_channel_ids(self.inner.as_ref()).await
    }
    async fn delete_by_channel(&self, channel_id: &str) -> Result<u64> {
        EventStore::delete_by_channel(self.inner.as_ref(), channel_id).await
    }
}

#[async_trait]
impl FetchLedger for FlakyStore {
    async fn is_range_covered(&self, channel_id: &str, start: NaiveDate, end: NaiveDate) -> Result<bool> {
        self.inner.is_range_covered(channel_id, start, end).await
    }
    async fn record_range(&self, channel_id: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
        self.inner.record_range(channel_id, start, end).await
    }
    async fn distinct_channel_ids(&self) -> Result<Vec<String>> {
        self.ledger_down()?;
        FetchLedger::distinct_channel_ids(self.inner.as_ref()).await
    }
    async fn delete_started_before(&self, cutoff: NaiveDate) -> Result<u64> {
        self.ledger_down()?;
        self.inner.delete_started_before(cutoff).await
    }
    async fn delete_by_channel(&self, channel_id: &str) -> Result<u64> {
        self.ledger_down()?;
        FetchLedger::delete_by_channel(self.inner.as_ref(), channel_id).await
    }
}

#[async_trait]
impl FavoriteDirectory for FlakyStore {
    async fn list_active(&self) -> Result<Vec<FavoriteChannel>> {
        self.inner.list_active().await
    }
    async fn add(&self, favorite: &NewFavorite) -> Result<FavoriteChannel> {
        self.inner.add(favorite).await
    }
    async fn tombstone(&self, owner_id: &str, channel_id: &str) -> Result<bool> {
        self.inner.tombstone(owner_id, channel_id).await
    }
    async fn touch_last_seen(&self, owner_id: &str, seen_at: DateTime<Utc>) -> Result<u64> {
        self.inner.touch_last_seen(owner_id, seen_at).await
    }
}
