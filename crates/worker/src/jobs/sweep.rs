use tracing::info;

use streamcal_core::sweep::SweepReport;

use crate::WorkerState;

pub async fn run_sweep(state: &WorkerState) -> anyhow::Result<SweepReport> {
    let report = state.sweeper.sweep(state.retention_days).await?;
    info!(
        total_deleted = report.total_deleted,
        deleted_events = report.deleted_events,
        orphaned_channels = report.orphaned_channels,
        cutoff = %report.cutoff_date,
        "scheduled sweep finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use streamcal_core::memory::MemoryStore;
    use streamcal_core::store::{EventStore, FavoriteDirectory};
    use streamcal_core::types::{EventType, LiveState, NewFavorite, StreamEvent};

    use crate::jobs::testing::state;

    fn completed(video_id: &str, days_old: i64) -> StreamEvent {
        let at = Utc::now() - Duration::days(days_old);
        StreamEvent {
            video_id: video_id.to_string(),
            channel_id: "UC1".to_string(),
            title: video_id.to_string(),
            thumbnail: String::new(),
            channel_title: "Channel 1".to_string(),
            channel_thumbnail: None,
            scheduled_start_time: Some(at),
            actual_start_time: Some(at),
            actual_end_time: None,
            live_state: LiveState::None,
            event_type: EventType::Completed,
            published_at: at,
        }
    }

    #[tokio::test]
    async fn test_run_sweep_uses_configured_retention() {
        let store = Arc::new(MemoryStore::new());
        store
            .add(&NewFavorite {
                owner_id: "user1".to_string(),
                channel_id: "UC1".to_string(),
                title: "Channel 1".to_string(),
                thumbnail: None,
            })
            .await
            .unwrap();
        store
            .upsert_many(&[completed("old", 45), completed("recent", 5)])
            .await
            .unwrap();

        let report = run_sweep(&state(&store, 30)).await.unwrap();

        assert_eq!(report.retention_days, 30);
        assert_eq!(report.deleted_events, 1);
        assert!(store.event("old").await.is_none());
        assert!(store.event("recent").await.is_some());
    }
}
