use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{
    error::{ApiError, AppError},
    state::{AppState, RequestId},
};

/// Requires `Authorization: Bearer <token>` on `/v1` when a service token is configured.
pub async fn service_token_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.settings.service_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let header_value = req.headers().get(header::AUTHORIZATION).ok_or_else(|| {
        AppError::Unauthorized("missing authorization header".to_string())
            .with_request_id(&request_id)
    })?;
    let token = parse_bearer(header_value).map_err(|e| e.with_request_id(&request_id))?;

    if !tokens_match(token, expected) {
        return Err(AppError::Unauthorized("invalid service token".to_string())
            .with_request_id(&request_id));
    }

    Ok(next.run(req).await)
}

fn parse_bearer(value: &HeaderValue) -> Result<&str, AppError> {
    let invalid = || AppError::Unauthorized("invalid authorization header".to_string());
    let value = value.to_str().map_err(|_| invalid())?;
    let mut parts = value.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default();
    if scheme != "Bearer" || token.is_empty() {
        return Err(invalid());
    }
    Ok(token)
}

/// Digests first so the comparison length never depends on the input.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented.as_slice().ct_eq(expected.as_slice()).into()
}
