use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use streamcal_core::types as core_types;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "live_state", rename_all = "lowercase")]
pub enum LiveState {
    None,
    Upcoming,
    Live,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "event_type", rename_all = "lowercase")]
pub enum EventType {
    Live,
    Upcoming,
    Completed,
}

impl From<core_types::LiveState> for LiveState {
    fn from(state: core_types::LiveState) -> Self {
        match state {
            core_types::LiveState::None => LiveState::None,
            core_types::LiveState::Upcoming => LiveState::Upcoming,
            core_types::LiveState::Live => LiveState::Live,
        }
    }
}

impl From<LiveState> for core_types::LiveState {
    fn from(state: LiveState) -> Self {
        match state {
            LiveState::None => core_types::LiveState::None,
            LiveState::Upcoming => core_types::LiveState::Upcoming,
            LiveState::Live => core_types::LiveState::Live,
        }
    }
}

impl From<core_types::EventType> for EventType {
    fn from(kind: core_types::EventType) -> Self {
        match kind {
            core_types::EventType::Live => EventType::Live,
            core_types::EventType::Upcoming => EventType::Upcoming,
            core_types::EventType::Completed => EventType::Completed,
        }
    }
}

impl From<EventType> for core_types::EventType {
    fn from(kind: EventType) -> Self {
        match kind {
            EventType::Live => core_types::EventType::Live,
            EventType::Upcoming => core_types::EventType::Upcoming,
            EventType::Completed => core_types::EventType::Completed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StreamEventRow {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub thumbnail: String,
    pub channel_title: String,
    pub channel_thumbnail: Option<String>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub live_state: LiveState,
    pub event_type: EventType,
    pub published_at: DateTime<Utc>,
}

impl From<StreamEventRow> for core_types::StreamEvent {
    fn from(row: StreamEventRow) -> Self {
        core_types::StreamEvent {
            video_id: row.video_id,
            channel_id: row.channel_id,
            title: row.title,
            thumbnail: row.thumbnail,
            channel_title: row.channel_title,
            channel_thumbnail: row.channel_thumbnail,
            scheduled_start_time: row.scheduled_start_time,
            actual_start_time: row.actual_start_time,
            actual_end_time: row.actual_end_time,
            live_state: row.live_state.into(),
            event_type: row.event_type.into(),
            published_at: row.published_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FavoriteChannelRow {
    pub id: String,
    pub owner_id: String,
    pub channel_id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<FavoriteChannelRow> for core_types::FavoriteChannel {
    fn from(row: FavoriteChannelRow) -> Self {
        core_types::FavoriteChannel {
            id: row.id,
            owner_id: row.owner_id,
            channel_id: row.channel_id,
            title: row.title,
            thumbnail: row.thumbnail,
            created_at: row.created_at,
            last_seen_at: row.last_seen_at,
            deleted_at: row.deleted_at,
        }
    }
}
