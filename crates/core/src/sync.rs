//! Per-channel fetch orchestration.
//!
//! Channels are processed one at a time with a fixed pause between platform
//! calls to stay inside the platform's request quota. A failing channel is
//! logged and skipped; the rest of the batch still runs.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::platform::{BroadcastState, SearchQuery, VideoDetails, VideoPlatform, DETAILS_BATCH_SIZE};
use crate::store::{EventStore, FavoriteDirectory, FetchLedger};
use crate::types::{EventType, LiveState, StreamEvent};

pub const DEFAULT_DAYS_AGO: u32 = 7;
pub const DEFAULT_CHANNEL_PAUSE: Duration = Duration::from_millis(100);

/// Which channels a sync call covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSelection {
    AllFavorites,
    One(String),
    Many(Vec<String>),
}

impl ChannelSelection {
    /// `channel_id` takes precedence over `channel_ids`; neither means every favorite.
    pub fn from_parts(channel_id: Option<String>, channel_ids: Option<Vec<String>>) -> Self {
        match (channel_id, channel_ids) {
            (Some(id), _) if !id.trim().is_empty() => ChannelSelection::One(id),
            (_, Some(ids)) => ChannelSelection::Many(ids),
            _ => ChannelSelection::AllFavorites,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Currently live and upcoming broadcasts, plus a refresh of stored live/upcoming rows.
    LiveUpcoming,
    /// Completed broadcasts published inside an inclusive date window. Ledger-backed.
    DateWindow { start: NaiveDate, end: NaiveDate },
    /// Completed broadcasts from the last `days_ago` days. Never consults the ledger.
    Recent { days_ago: u32 },
}

impl SyncMode {
    /// Explicit window when both bounds are given, otherwise the trailing `days_ago` window.
    pub fn past(
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        days_ago: Option<u32>,
        default_days_ago: u32,
    ) -> Result<Self> {
        match (start_date, end_date) {
            (Some(start), Some(end)) => {
                if end < start {
                    return Err(Error::InvalidRequest(format!(
                        "endDate {end} is before startDate {start}"
                    )));
                }
                Ok(SyncMode::DateWindow { start, end })
            }
            _ => Ok(SyncMode::Recent {
                days_ago: days_ago.unwrap_or(default_days_ago),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub selection: ChannelSelection,
    pub mode: SyncMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncSummary {
    pub message: String,
    pub channels: usize,
    pub videos: usize,
}

/// A channel to fetch, with whatever presentation data the favorites table knows.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChannelTarget {
    channel_id: String,
    thumbnail: Option<String>,
}

pub struct Orchestrator {
    events: Arc<dyn EventStore>,
    ledger: Arc<dyn FetchLedger>,
    favorites: Arc<dyn FavoriteDirectory>,
    platform: Arc<dyn VideoPlatform>,
    pause: Duration,
}

impl Orchestrator {
    pub fn new(
        events: Arc<dyn EventStore>,
        ledger: Arc<dyn FetchLedger>,
        favorites: Arc<dyn FavoriteDirectory>,
        platform: Arc<dyn VideoPlatform>,
    ) -> Self {
        Self {
            events,
            ledger,
            favorites,
            platform,
            pause: DEFAULT_CHANNEL_PAUSE,
        }
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub async fn sync_channels(&self, request: SyncRequest) -> Result<SyncSummary> {
        let targets = self.resolve_channels(&request.selection).await?;
        if targets.is_empty() {
            info!("no favorite channels to sync");
            return Ok(SyncSummary {
                message: "No favorite channels found".to_string(),
                channels: 0,
                videos: 0,
            });
        }

        match request.mode {
            SyncMode::LiveUpcoming => self.sync_live_upcoming(&targets).await,
            SyncMode::DateWindow { start, end } => self.sync_window(&targets, start, end).await,
            SyncMode::Recent { days_ago } => self.sync_recent(&targets, days_ago).await,
        }
    }

    async fn resolve_channels(&self, selection: &ChannelSelection) -> Result<Vec<ChannelTarget>> {
        let ids = match selection {
            ChannelSelection::One(id) => vec![id.clone()],
            ChannelSelection::Many(ids) => ids.clone(),
            ChannelSelection::AllFavorites => {
                // One channel can be favorited by many owners; keep the first row seen.
                let mut seen = HashSet::new();
                return Ok(self
                    .favorites
                    .list_active()
                    .await?
                    .into_iter()
                    .filter(|f| seen.insert(f.channel_id.clone()))
                    .map(|f| ChannelTarget {
                        channel_id: f.channel_id,
                        thumbnail: f.thumbnail,
                    })
                    .collect());
            }
        };

        let mut seen = HashSet::new();
        Ok(ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .map(|channel_id| ChannelTarget {
                channel_id,
                thumbnail: None,
            })
            .collect())
    }

    async fn sync_live_upcoming(&self, targets: &[ChannelTarget]) -> Result<SyncSummary> {
        info!(channels = targets.len(), "syncing live and upcoming broadcasts");

        let mut videos = 0;
        for (index, target) in targets.iter().enumerate() {
            if index > 0 {
                self.throttle().await;
            }
            match self.fetch_live_upcoming(target).await {
                Ok(count) => videos += count,
                Err(err) => log_channel_failure(&target.channel_id, &err),
            }
        }

        videos += self.refresh_stale_states().await;

        info!(videos, "live and upcoming sync finished");
        Ok(SyncSummary {
            message: "Successfully fetched and saved stream events".to_string(),
            channels: targets.len(),
            videos,
        })
    }

    async fn fetch_live_upcoming(&self, target: &ChannelTarget) -> Result<usize> {
        let mut events = Vec::new();
        for state in [BroadcastState::Live, BroadcastState::Upcoming] {
            let query = SearchQuery::new(&target.channel_id, state);
            let found = self.platform.search_with_details(&query).await?;
            let (live_state, event_type) = match state {
                BroadcastState::Live => (LiveState::Live, EventType::Live),
                _ => (LiveState::Upcoming, EventType::Upcoming),
            };
            events.extend(found.into_iter().map(|details| {
                to_event(details, target.thumbnail.clone(), live_state, event_type)
            }));
        }

        self.events.upsert_many(&events).await?;
        Ok(events.len())
    }

    /// Re-reads every stored live/upcoming event so broadcasts that started,
    /// ended or were cancelled get their state corrected.
    async fn refresh_stale_states(&self) -> usize {
        let existing = match self
            .events
            .list_by_live_state(&[LiveState::Live, LiveState::Upcoming])
            .await
        {
            Ok(existing) => existing,
            Err(err) => {
                error!(error = %err, "failed to load live/upcoming events for refresh");
                return 0;
            }
        };
        if existing.is_empty() {
            return 0;
        }
        info!(count = existing.len(), "refreshing stored live/upcoming events");

        let mut refreshed = 0;
        for (index, batch) in existing.chunks(DETAILS_BATCH_SIZE).enumerate() {
            if index > 0 {
                self.throttle().await;
            }
            let ids: Vec<String> = batch.iter().map(|e| e.video_id.clone()).collect();
            let details = match self.platform.video_details(&ids).await {
                Ok(details) => details,
                Err(err) => {
                    log_refresh_failure(ids.len(), &err);
                    continue;
                }
            };

            let events: Vec<StreamEvent> = details
                .into_iter()
                .map(|d| {
                    let thumbnail = batch
                        .iter()
                        .find(|e| e.video_id == d.id)
                        .and_then(|e| e.channel_thumbnail.clone());
                    let state = d.live_state;
                    to_event(d, thumbnail, state, EventType::from(state))
                })
                .collect();

            match self.events.upsert_many(&events).await {
                Ok(_) => refreshed += events.len(),
                Err(err) => error!(error = %err, "failed to store refreshed events"),
            }
        }
        refreshed
    }

    async fn sync_window(
        &self,
        targets: &[ChannelTarget],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SyncSummary> {
        info!(channels = targets.len(), %start, %end, "syncing completed broadcasts by window");

        let published_after = start_of_day(start);
        let published_before = end_of_day(end);
        let mut videos = 0;
        let mut called = false;

        for target in targets {
            match self.ledger.is_range_covered(&target.channel_id, start, end).await {
                Ok(true) => {
                    info!(channel_id = %target.channel_id, %start, %end, "skipping: range already fetched");
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    log_channel_failure(&target.channel_id, &err);
                    continue;
                }
            }

            if called {
                self.throttle().await;
            }
            called = true;

            let query = SearchQuery::new(&target.channel_id, BroadcastState::Completed)
                .published_after(published_after)
                .published_before(published_before);
            match self.fetch_completed(target, &query).await {
                Ok(count) => {
                    videos += count;
                    if let Err(err) = self.ledger.record_range(&target.channel_id, start, end).await {
                        log_channel_failure(&target.channel_id, &err);
                    }
                }
                Err(err) => log_channel_failure(&target.channel_id, &err),
            }
        }

        info!(videos, "window sync finished");
        Ok(SyncSummary {
            message: "Successfully fetched and saved past stream events".to_string(),
            channels: targets.len(),
            videos,
        })
    }

    async fn sync_recent(&self, targets: &[ChannelTarget], days_ago: u32) -> Result<SyncSummary> {
        info!(channels = targets.len(), days_ago, "syncing recent completed broadcasts");

        let published_after = Utc::now()
            .checked_sub_signed(chrono::Duration::days(i64::from(days_ago)))
            .ok_or_else(|| Error::InvalidRequest(format!("daysAgo {days_ago} out of range")))?;
        let mut videos = 0;
        for (index, target) in targets.iter().enumerate() {
            if index > 0 {
                self.throttle().await;
            }
            let query = SearchQuery::new(&target.channel_id, BroadcastState::Completed)
                .published_after(published_after);
            match self.fetch_completed(target, &query).await {
                Ok(count) => videos += count,
                Err(err) => log_channel_failure(&target.channel_id, &err),
            }
        }

        info!(videos, "recent sync finished");
        Ok(SyncSummary {
            message: "Successfully fetched and saved past stream events".to_string(),
            channels: targets.len(),
            videos,
        })
    }

    async fn fetch_completed(&self, target: &ChannelTarget, query: &SearchQuery) -> Result<usize> {
        let events: Vec<StreamEvent> = self
            .platform
            .search_with_details(query)
            .await?
            .into_iter()
            .map(|d| to_event(d, target.thumbnail.clone(), LiveState::None, EventType::Completed))
            .collect();
        self.events.upsert_many(&events).await?;
        Ok(events.len())
    }

    async fn throttle(&self) {
        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }
    }
}

fn to_event(
    details: VideoDetails,
    channel_thumbnail: Option<String>,
    live_state: LiveState,
    event_type: EventType,
) -> StreamEvent {
    StreamEvent {
        video_id: details.id,
        channel_id: details.channel_id,
        title: details.title,
        thumbnail: details.thumbnail,
        channel_title: details.channel_title,
        channel_thumbnail,
        scheduled_start_time: details.scheduled_start_time,
        actual_start_time: details.actual_start_time,
        actual_end_time: details.actual_end_time,
        live_state,
        event_type,
        published_at: details.published_at,
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).expect("valid time");
    date.and_time(last_second).and_utc()
}

fn log_channel_failure(channel_id: &str, err: &Error) {
    if err.is_quota_exceeded() {
        warn!(%channel_id, error = %err, "platform quota exceeded");
    } else {
        error!(%channel_id, error = %err, "failed to sync channel");
    }
}

fn log_refresh_failure(batch_size: usize, err: &Error) {
    if err.is_quota_exceeded() {
        warn!(batch_size, error = %err, "platform quota exceeded during refresh");
    } else {
        error!(batch_size, error = %err, "failed to refresh event batch");
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
