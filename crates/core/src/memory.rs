//! In-process store implementing every storage trait.
//!
//! Used by tests across the workspace and by the api when no database is
//! wanted (local demos). Semantics mirror the Postgres queries.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use nanoid::nanoid;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::store::{EventStore, FavoriteDirectory, FetchLedger};
use crate::types::{
    DateWindow, EventType, FavoriteChannel, FetchedRange, LiveState, NewFavorite, StreamEvent,
};

#[derive(Default)]
pub struct MemoryStore {
    events: RwLock<HashMap<String, StreamEvent>>,
    ranges: RwLock<BTreeSet<(String, NaiveDate, NaiveDate)>>,
    favorites: RwLock<BTreeMap<String, FavoriteChannel>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn event(&self, video_id: &str) -> Option<StreamEvent> {
        self.events.read().await.get(video_id).cloned()
    }

    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn ranges_for(&self, channel_id: &str) -> Vec<FetchedRange> {
        self.ranges
            .read()
            .await
            .iter()
            .filter(|(ch, _, _)| ch == channel_id)
            .map(|(ch, start, end)| FetchedRange {
                channel_id: ch.clone(),
                start_date: *start,
                end_date: *end,
            })
            .collect()
    }

    pub async fn favorites(&self) -> Vec<FavoriteChannel> {
        self.favorites.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn upsert_many(&self, events: &[StreamEvent]) -> Result<u64> {
        let mut table = self.events.write().await;
        for event in events {
            table.insert(event.video_id.clone(), event.clone());
        }
        Ok(events.len() as u64)
    }

    async fn list_by_live_state(&self, states: &[LiveState]) -> Result<Vec<StreamEvent>> {
        let mut found: Vec<StreamEvent> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| states.contains(&e.live_state))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.video_id.cmp(&b.video_id));
        Ok(found)
    }

    async fn list_for_channels(
        &self,
        channel_ids: &[String],
        window: Option<DateWindow>,
    ) -> Result<Vec<StreamEvent>> {
        let mut found: Vec<StreamEvent> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| channel_ids.contains(&e.channel_id))
            .filter(|e| match (window, e.scheduled_start_time) {
                (None, _) => true,
                (Some(w), Some(at)) => {
                    let day = at.date_naive();
                    day >= w.start && day <= w.end
                }
                (Some(_), None) => false,
            })
            .cloned()
            .collect();
        // Postgres sorts NULLs last in ascending order.
        found.sort_by(|a, b| match (a.scheduled_start_time, b.scheduled_start_time) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.video_id.cmp(&b.video_id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.video_id.cmp(&b.video_id),
        });
        Ok(found)
    }

    async fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut table = self.events.write().await;
        let before = table.len();
        table.retain(|_, e| {
            !(e.event_type == EventType::Completed
                && e.scheduled_start_time.is_some_and(|at| at < cutoff))
        });
        Ok((before - table.len()) as u64)
    }

    async fn distinct_channel_ids(&self) -> Result<Vec<String>> {
        let ids: BTreeSet<String> = self
            .events
            .read()
            .await
            .values()
            .map(|e| e.channel_id.clone())
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn delete_by_channel(&self, channel_id: &str) -> Result<u64> {
        let mut table = self.events.write().await;
        let before = table.len();
        table.retain(|_, e| e.channel_id != channel_id);
        Ok((before - table.len()) as u64)
    }
}

#[async_trait]
impl FetchLedger for MemoryStore {
    async fn is_range_covered(
        &self,
        channel_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool> {
        Ok(self
            .ranges
            .read()
            .await
            .iter()
            .any(|(ch, s, e)| ch == channel_id && *e >= start && *s <= end))
    }

    async fn record_range(&self, channel_id: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
        self.ranges
            .write()
            .await
            .insert((channel_id.to_string(), start, end));
        Ok(())
    }

    async fn distinct_channel_ids(&self) -> Result<Vec<String>> {
        let ranges = self.ranges.read().await;
        let channels: BTreeSet<&String> = ranges.iter().map(|(ch, _, _)| ch).collect();
        Ok(channels.into_iter().cloned().collect())
    }

    async fn delete_started_before(&self, cutoff: NaiveDate) -> Result<u64> {
        let mut ranges = self.ranges.write().await;
        let before = ranges.len();
        ranges.retain(|(_, start, _)| *start >= cutoff);
        Ok((before - ranges.len()) as u64)
    }

    async fn delete_by_channel(&self, channel_id: &str) -> Result<u64> {
        let mut ranges = self.ranges.write().await;
        let before = ranges.len();
        ranges.retain(|(ch, _, _)| ch != channel_id);
        Ok((before - ranges.len()) as u64)
    }
}

#[async_trait]
impl FavoriteDirectory for MemoryStore {
    async fn list_active(&self) -> Result<Vec<FavoriteChannel>> {
        Ok(self
            .favorites
            .read()
            .await
            .values()
            .filter(|f| f.is_active())
            .cloned()
            .collect())
    }

    async fn add(&self, favorite: &NewFavorite) -> Result<FavoriteChannel> {
        let mut table = self.favorites.write().await;
        let existing = table
            .values_mut()
            .find(|f| f.owner_id == favorite.owner_id && f.channel_id == favorite.channel_id);
        if let Some(row) = existing {
            row.title = favorite.title.clone();
            row.thumbnail = favorite.thumbnail.clone();
            row.deleted_at = None;
            return Ok(row.clone());
        }

        let row = FavoriteChannel {
            id: format!("fav_{}", nanoid!(12)),
            owner_id: favorite.owner_id.clone(),
            channel_id: favorite.channel_id.clone(),
            title: favorite.title.clone(),
            thumbnail: favorite.thumbnail.clone(),
            created_at: Utc::now(),
            last_seen_at: None,
            deleted_at: None,
        };
        table.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn tombstone(&self, owner_id: &str, channel_id: &str) -> Result<bool> {
        let mut table = self.favorites.write().await;
        let mut removed = false;
        for row in table.values_mut() {
            if row.owner_id == owner_id && row.channel_id == channel_id && row.is_active() {
                row.deleted_at = Some(Utc::now());
                removed = true;
            }
        }
        Ok(removed)
    }

    async fn touch_last_seen(&self, owner_id: &str, seen_at: DateTime<Utc>) -> Result<u64> {
        let mut table = self.favorites.write().await;
        let mut touched = 0;
        for row in table.values_mut() {
            if row.owner_id == owner_id && row.is_active() {
                row.last_seen_at = Some(seen_at);
                touched += 1;
            }
        }
        Ok(touched)
    }
}
