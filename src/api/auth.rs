//! Static shared-secret check
//!
//! Callers authenticate with an opaque bearer token; no cryptographic
//! protocol is involved. When no token is configured the middleware passes
//! everything through. The health endpoint stays open either way.

use crate::api::ApiState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Middleware enforcing the configured bearer token, if any
pub async fn require_bearer(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(request).await;
    };

    if request.uri().path() == "/api/health" {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if presented == Some(expected) {
        next.run(request).await
    } else {
        let body = Json(json!({
            "error": "Missing or invalid bearer token",
            "code": "Unauthorized",
            "status": StatusCode::UNAUTHORIZED.as_u16(),
        }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
