use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::store::{EventStore, FavoriteDirectory, FetchLedger};
use crate::types::{FavoriteChannel, NewFavorite};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemovalReport {
    pub removed: bool,
    pub deleted_events: u64,
    pub deleted_ranges: u64,
}

/// Favorite management with the cascade that removal implies.
pub struct FavoriteService {
    favorites: Arc<dyn FavoriteDirectory>,
    events: Arc<dyn EventStore>,
    ledger: Arc<dyn FetchLedger>,
}

impl FavoriteService {
    pub fn new(
        favorites: Arc<dyn FavoriteDirectory>,
        events: Arc<dyn EventStore>,
        ledger: Arc<dyn FetchLedger>,
    ) -> Self {
        Self {
            favorites,
            events,
            ledger,
        }
    }

    pub async fn add(&self, favorite: NewFavorite) -> Result<FavoriteChannel> {
        if favorite.owner_id.trim().is_empty() || favorite.channel_id.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "ownerId and channelId required".to_string(),
            ));
        }
        if !is_channel_id(&favorite.channel_id) {
            return Err(Error::InvalidRequest(format!(
                "invalid channelId {}",
                favorite.channel_id
            )));
        }
        let row = self.favorites.add(&favorite).await?;
        info!(owner_id = %row.owner_id, channel_id = %row.channel_id, "favorite added");
        Ok(row)
    }

    pub async fn list_active(&self) -> Result<Vec<FavoriteChannel>> {
        self.favorites.list_active().await
    }

    /// Tombstones the favorite, then hard-deletes the channel's events and
    /// fetched ranges once no active owner follows the channel. The cascade
    /// also runs when the favorite was already tombstoned, so retrying a
    /// removal whose cascade failed finishes the cleanup.
    pub async fn remove(&self, owner_id: &str, channel_id: &str) -> Result<RemovalReport> {
        let removed = self.favorites.tombstone(owner_id, channel_id).await?;

        let still_followed = self
            .favorites
            .list_active()
            .await?
            .iter()
            .any(|f| f.channel_id == channel_id);
        if still_followed {
            info!(%owner_id, %channel_id, removed, "channel still followed by others");
            return Ok(RemovalReport {
                removed,
                deleted_events: 0,
                deleted_ranges: 0,
            });
        }

        let deleted_events = self.events.delete_by_channel(channel_id).await?;
        let deleted_ranges = self.ledger.delete_by_channel(channel_id).await?;
        info!(%owner_id, %channel_id, removed, deleted_events, deleted_ranges, "favorite removed");
        Ok(RemovalReport {
            removed,
            deleted_events,
            deleted_ranges,
        })
    }

    pub async fn touch_last_seen(&self, owner_id: &str, seen_at: DateTime<Utc>) -> Result<u64> {
        self.favorites.touch_last_seen(owner_id, seen_at).await
    }
}

/// `UC` followed by 22 url-safe base64 characters.
pub fn is_channel_id(id: &str) -> bool {
    id.len() == 24
        && id.starts_with("UC")
        && id[2..]
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
