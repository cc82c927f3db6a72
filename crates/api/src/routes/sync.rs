use axum::{body::Bytes, extract::State, routing::post, Extension, Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use streamcal_core::sync::{ChannelSelection, SyncMode, SyncRequest, SyncSummary};

use crate::{
    error::{ApiResult, AppError},
    routes::optional_json,
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/sync/live", post(sync_live))
        .route("/v1/sync/past", post(sync_past))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveSyncRequest {
    channel_id: Option<String>,
    channel_ids: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PastSyncRequest {
    channel_id: Option<String>,
    channel_ids: Option<Vec<String>>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    days_ago: Option<u32>,
}

async fn sync_live(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> ApiResult<Json<SyncSummary>> {
    let payload: LiveSyncRequest =
        optional_json(&body).map_err(|e| e.with_request_id(&request_id.0))?;

    let request = SyncRequest {
        selection: ChannelSelection::from_parts(payload.channel_id, payload.channel_ids),
        mode: SyncMode::LiveUpcoming,
    };
    info!(request_id = %request_id.0, selection = ?request.selection, "live sync requested");

    let summary = state
        .orchestrator
        .sync_channels(request)
        .await
        .map_err(|e| AppError::from(e).with_request_id(&request_id.0))?;
    Ok(Json(summary))
}

async fn sync_past(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> ApiResult<Json<SyncSummary>> {
    let payload: PastSyncRequest =
        optional_json(&body).map_err(|e| e.with_request_id(&request_id.0))?;

    let mode = SyncMode::past(
        payload.start_date,
        payload.end_date,
        payload.days_ago,
        state.settings.default_days_ago,
    )
    .map_err(|e| AppError::from(e).with_request_id(&request_id.0))?;
    let request = SyncRequest {
        selection: ChannelSelection::from_parts(payload.channel_id, payload.channel_ids),
        mode,
    };
    info!(request_id = %request_id.0, selection = ?request.selection, mode = ?request.mode, "past sync requested");

    let summary = state
        .orchestrator
        .sync_channels(request)
        .await
        .map_err(|e| AppError::from(e).with_request_id(&request_id.0))?;
    Ok(Json(summary))
}
