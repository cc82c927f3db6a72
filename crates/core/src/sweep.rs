//! Retention sweep: ages out completed events and purges channels nobody
//! favorites any more.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::store::{EventStore, FavoriteDirectory, FetchLedger};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub message: String,
    pub total_deleted: u64,
    pub deleted_events: u64,
    pub orphaned_channels: usize,
    pub cutoff_date: DateTime<Utc>,
    pub retention_days: u32,
}

pub struct RetentionSweeper {
    events: Arc<dyn EventStore>,
    ledger: Arc<dyn FetchLedger>,
    favorites: Arc<dyn FavoriteDirectory>,
}

impl RetentionSweeper {
    pub fn new(
        events: Arc<dyn EventStore>,
        ledger: Arc<dyn FetchLedger>,
        favorites: Arc<dyn FavoriteDirectory>,
    ) -> Self {
        Self {
            events,
            ledger,
            favorites,
        }
    }

    pub async fn sweep(&self, retention_days: u32) -> Result<SweepReport> {
        self.sweep_at(retention_days, Utc::now()).await
    }

    /// Runs the sweep as if the current time were `now`.
    pub async fn sweep_at(&self, retention_days: u32, now: DateTime<Utc>) -> Result<SweepReport> {
        let cutoff = now
            .checked_sub_signed(chrono::Duration::days(i64::from(retention_days)))
            .ok_or_else(|| Error::InvalidRequest(format!("retentionDays {retention_days} out of range")))?;
        info!(%cutoff, retention_days, "starting retention sweep");

        // Only this step is allowed to fail the sweep.
        let deleted_events = self.events.delete_completed_before(cutoff).await?;
        info!(deleted_events, "deleted old completed events");
        let mut total_deleted = deleted_events;

        let orphans = self.orphaned_channels().await;
        if !orphans.is_empty() {
            info!(count = orphans.len(), "deleting events from orphaned channels");
        }
        for channel_id in &orphans {
            match self.events.delete_by_channel(channel_id).await {
                Ok(count) => {
                    total_deleted += count;
                    info!(%channel_id, count, "deleted events from orphaned channel");
                }
                Err(err) => {
                    error!(%channel_id, error = %err, "failed to delete orphaned channel events");
                }
            }
            match self.ledger.delete_by_channel(channel_id).await {
                Ok(count) => total_deleted += count,
                Err(err) => {
                    error!(%channel_id, error = %err, "failed to delete orphaned channel ranges");
                }
            }
        }

        match self.ledger.delete_started_before(cutoff.date_naive()).await {
            Ok(count) => {
                total_deleted += count;
                info!(count, "deleted old fetched ranges");
            }
            Err(err) => warn!(error = %err, "skipping fetched range cleanup"),
        }

        Ok(SweepReport {
            message: "Successfully cleaned up old data".to_string(),
            total_deleted,
            deleted_events,
            orphaned_channels: orphans.len(),
            cutoff_date: cutoff,
            retention_days,
        })
    }

    /// Channels with stored events or fetched ranges but no active favorite.
    /// A failed favorites lookup yields no orphans; a failed channel listing
    /// only drops that source.
    async fn orphaned_channels(&self) -> Vec<String> {
        let active: HashSet<String> = match self.favorites.list_active().await {
            Ok(favorites) => favorites.into_iter().map(|f| f.channel_id).collect(),
            Err(err) => {
                error!(error = %err, "failed to list favorites; skipping orphan sweep");
                return Vec::new();
            }
        };

        let mut channels = BTreeSet::new();
        match self.events.distinct_channel_ids().await {
            Ok(ids) => channels.extend(ids),
            Err(err) => error!(error = %err, "failed to list event channels"),
        }
        match self.ledger.distinct_channel_ids().await {
            Ok(ids) => channels.extend(ids),
            Err(err) => error!(error = %err, "failed to list fetched range channels"),
        }
        channels.into_iter().filter(|id| !active.contains(id)).collect()
    }
}
