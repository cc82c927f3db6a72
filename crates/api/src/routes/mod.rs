pub mod events;
pub mod favorites;
pub mod health;
pub mod sweep;
pub mod sync;

use axum::{
    body::Bytes,
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::middleware::{auth::service_token_auth, request_id::request_id};
use crate::state::AppState;

pub fn v1_router(state: AppState) -> Router {
    Router::new()
        .merge(sync::router(state.clone()))
        .merge(sweep::router(state.clone()))
        .merge(events::router(state.clone()))
        .merge(favorites::router(state))
}

pub fn health_router(state: AppState) -> Router {
    health::router(state)
}

/// The full service: health is open, `/v1` sits behind the service token check,
/// and every response carries a request id.
pub fn app(state: AppState) -> Router {
    let v1 = v1_router(state.clone()).layer(from_fn_with_state(state.clone(), service_token_auth));

    Router::new()
        .merge(health_router(state))
        .merge(v1)
        .layer(from_fn(request_id))
}

/// Trigger endpoints accept an empty body as "all defaults".
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    required_json(body)
}

pub(crate) fn required_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))
}
