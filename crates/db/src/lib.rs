//! Postgres persistence for stream events, the fetch ledger and favorites.

pub mod models;
pub mod queries;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use nanoid::nanoid;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use streamcal_core::store::{EventStore, FavoriteDirectory, FetchLedger};
use streamcal_core::types::{DateWindow, FavoriteChannel, LiveState, NewFavorite, StreamEvent};
use streamcal_core::{Error, Result};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub async fn connect(database_url: &str) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Implements every storage seam over a single pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn upsert_many(&self, events: &[StreamEvent]) -> Result<u64> {
        if events.is_empty() {
            return Ok(0);
        }
        queries::stream_events::upsert_many(&self.pool, events)
            .await
            .map_err(Error::persistence)
    }

    async fn list_by_live_state(&self, states: &[LiveState]) -> Result<Vec<StreamEvent>> {
        let states: Vec<String> = states.iter().map(|s| s.as_str().to_string()).collect();
        let rows = queries::stream_events::list_by_live_state(&self.pool, &states)
            .await
            .map_err(Error::persistence)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_for_channels(
        &self,
        channel_ids: &[String],
        window: Option<DateWindow>,
    ) -> Result<Vec<StreamEvent>> {
        if channel_ids.is_empty() {
            return Ok(Vec::new());
        }
        let window = window.map(|w| (w.start, w.end));
        let rows = queries::stream_events::list_for_channels(&self.pool, channel_ids, window)
            .await
            .map_err(Error::persistence)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        queries::stream_events::delete_completed_before(&self.pool, cutoff)
            .await
            .map_err(Error::persistence)
    }

    async fn distinct_channel_ids(&self) -> Result<Vec<String>> {
        queries::stream_events::distinct_channel_ids(&self.pool)
            .await
            .map_err(Error::persistence)
    }

    async fn delete_by_channel(&self, channel_id: &str) -> Result<u64> {
        queries::stream_events::delete_by_channel(&self.pool, channel_id)
            .await
            .map_err(Error::persistence)
    }
}

#[async_trait]
impl FetchLedger for PgStore {
    async fn is_range_covered(
        &self,
        channel_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool> {
        queries::fetched_ranges::overlaps(&self.pool, channel_id, start, end)
            .await
            .map_err(Error::persistence)
    }

    async fn record_range(&self, channel_id: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
        queries::fetched_ranges::insert(&self.pool, channel_id, start, end)
            .await
            .map_err(Error::persistence)
    }

    async fn distinct_channel_ids(&self) -> Result<Vec<String>> {
        queries::fetched_ranges::distinct_channel_ids(&self.pool)
            .await
            .map_err(Error::persistence)
    }

    async fn delete_started_before(&self, cutoff: NaiveDate) -> Result<u64> {
        queries::fetched_ranges::delete_started_before(&self.pool, cutoff)
            .await
            .map_err(Error::persistence)
    }

    async fn delete_by_channel(&self, channel_id: &str) -> Result<u64> {
        queries::fetched_ranges::delete_by_channel(&self.pool, channel_id)
            .await
            .map_err(Error::persistence)
    }
}

#[async_trait]
impl FavoriteDirectory for PgStore {
    async fn list_active(&self) -> Result<Vec<FavoriteChannel>> {
        let rows = queries::favorite_channels::list_active(&self.pool)
            .await
            .map_err(Error::persistence)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add(&self, favorite: &NewFavorite) -> Result<FavoriteChannel> {
        let id = format!("fav_{}", nanoid!(12));
        let row = queries::favorite_channels::upsert(
            &self.pool,
            &id,
            &favorite.owner_id,
            &favorite.channel_id,
            &favorite.title,
            favorite.thumbnail.as_deref(),
        )
        .await
        .map_err(Error::persistence)?;
        Ok(row.into())
    }

    async fn tombstone(&self, owner_id: &str, channel_id: &str) -> Result<bool> {
        queries::favorite_channels::tombstone(&self.pool, owner_id, channel_id)
            .await
            .map_err(Error::persistence)
    }

    async fn touch_last_seen(&self, owner_id: &str, seen_at: DateTime<Utc>) -> Result<u64> {
        queries::favorite_channels::touch_last_seen(&self.pool, owner_id, seen_at)
            .await
            .map_err(Error::persistence)
    }
}
