use axum::{body::Bytes, extract::State, routing::post, Extension, Json, Router};
use serde::Deserialize;

use streamcal_core::sweep::SweepReport;

use crate::{
    error::{ApiResult, AppError},
    routes::optional_json,
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/sweep", post(sweep))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SweepRequest {
    retention_days: Option<u32>,
}

async fn sweep(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> ApiResult<Json<SweepReport>> {
    let payload: SweepRequest =
        optional_json(&body).map_err(|e| e.with_request_id(&request_id.0))?;
    let retention_days = payload
        .retention_days
        .unwrap_or(state.settings.retention_days);

    let report = state
        .sweeper
        .sweep(retention_days)
        .await
        .map_err(|e| AppError::from(e).with_request_id(&request_id.0))?;
    Ok(Json(report))
}
