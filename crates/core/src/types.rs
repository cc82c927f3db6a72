use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Broadcast state as reported by the platform's `liveBroadcastContent`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LiveState {
    None,
    Upcoming,
    Live,
}

impl LiveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveState::None => "none",
            LiveState::Upcoming => "upcoming",
            LiveState::Live => "live",
        }
    }

    /// Unknown values are treated as `none`, matching how the platform omits the field.
    pub fn parse(value: &str) -> Self {
        match value {
            "live" => LiveState::Live,
            "upcoming" => LiveState::Upcoming,
            _ => LiveState::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Live,
    Upcoming,
    Completed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Live => "live",
            EventType::Upcoming => "upcoming",
            EventType::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "live" => Some(EventType::Live),
            "upcoming" => Some(EventType::Upcoming),
            "completed" => Some(EventType::Completed),
            _ => None,
        }
    }
}

impl From<LiveState> for EventType {
    fn from(state: LiveState) -> Self {
        match state {
            LiveState::Live => EventType::Live,
            LiveState::Upcoming => EventType::Upcoming,
            LiveState::None => EventType::Completed,
        }
    }
}

/// One broadcast, keyed by the platform's video id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
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

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct FetchedRange {
    pub channel_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl FetchedRange {
    /// Interval overlap, not containment: `[15 Mar, 15 Apr]` overlaps `[1 Mar, 31 Mar]`.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.end_date >= start && self.start_date <= end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteChannel {
    pub id: String,
    pub owner_id: String,
    pub channel_id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl FavoriteChannel {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewFavorite {
    pub owner_id: String,
    pub channel_id: String,
    pub title: String,
    pub thumbnail: Option<String>,
}

/// Inclusive date window used by the calendar read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}
