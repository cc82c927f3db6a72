use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use streamcal_core::types::{DateWindow, StreamEvent};

use crate::{
    error::{ApiResult, AppError},
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/events", get(list_events))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsQuery {
    channel_ids: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct EventListResponse {
    items: Vec<StreamEvent>,
}

async fn list_events(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> ApiResult<Json<EventListResponse>> {
    let Query(query) = query.map_err(|rejection| {
        AppError::BadRequest(format!("invalid query: {}", rejection.body_text()))
            .with_request_id(&request_id.0)
    })?;
    let channel_ids: Vec<String> = query
        .channel_ids
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    let window = match (query.from, query.to) {
        (Some(start), Some(end)) if end < start => {
            return Err(AppError::BadRequest(format!("to {end} is before from {start}"))
                .with_request_id(&request_id.0));
        }
        (Some(start), Some(end)) => Some(DateWindow { start, end }),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest("from and to must be given together".to_string())
                .with_request_id(&request_id.0));
        }
    };

    if channel_ids.is_empty() {
        return Ok(Json(EventListResponse { items: Vec::new() }));
    }

    let items = state
        .events
        .list_for_channels(&channel_ids, window)
        .await
        .map_err(|e| AppError::from(e).with_request_id(&request_id.0))?;
    Ok(Json(EventListResponse { items }))
}
