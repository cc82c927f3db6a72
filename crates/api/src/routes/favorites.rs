use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use streamcal_core::favorites::RemovalReport;
use streamcal_core::types::{FavoriteChannel, NewFavorite};

use crate::{
    error::{ApiResult, AppError},
    routes::required_json,
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/favorites", post(add_favorite))
        .route("/v1/favorites/{owner_id}/{channel_id}", delete(remove_favorite))
        .route("/v1/favorites/{owner_id}/seen", post(mark_seen))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddFavoriteRequest {
    owner_id: String,
    channel_id: String,
    title: String,
    thumbnail: Option<String>,
}

async fn add_favorite(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> ApiResult<Json<FavoriteChannel>> {
    let payload: AddFavoriteRequest =
        required_json(&body).map_err(|e| e.with_request_id(&request_id.0))?;
    let favorite = state
        .favorites
        .add(NewFavorite {
            owner_id: payload.owner_id,
            channel_id: payload.channel_id,
            title: payload.title,
            thumbnail: payload.thumbnail,
        })
        .await
        .map_err(|e| AppError::from(e).with_request_id(&request_id.0))?;
    Ok(Json(favorite))
}

async fn remove_favorite(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((owner_id, channel_id)): Path<(String, String)>,
) -> ApiResult<Json<RemovalReport>> {
    let report = state
        .favorites
        .remove(&owner_id, &channel_id)
        .await
        .map_err(|e| AppError::from(e).with_request_id(&request_id.0))?;
    Ok(Json(report))
}

async fn mark_seen(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(owner_id): Path<String>,
) -> ApiResult<StatusCode> {
    let touched = state
        .favorites
        .touch_last_seen(&owner_id, Utc::now())
        .await
        .map_err(|e| AppError::from(e).with_request_id(&request_id.0))?;
    debug!(%owner_id, touched, "last seen updated");
    Ok(StatusCode::NO_CONTENT)
}
