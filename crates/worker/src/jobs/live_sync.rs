use tracing::info;

use streamcal_core::sync::{ChannelSelection, SyncMode, SyncRequest, SyncSummary};

use crate::WorkerState;

/// Live/upcoming pass over every favorited channel.
pub async fn run_live_sync(state: &WorkerState) -> anyhow::Result<SyncSummary> {
    let summary = state
        .orchestrator
        .sync_channels(SyncRequest {
            selection: ChannelSelection::AllFavorites,
            mode: SyncMode::LiveUpcoming,
        })
        .await?;
    info!(
        channels = summary.channels,
        videos = summary.videos,
        "scheduled live sync finished"
    );
    Ok(summary)
}
