use crate::error::error_response;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use hub_common::auth::{bearer_token, token_matches};
use std::sync::Arc;

/// Admin gate: requires `Authorization: Bearer <API_TOKEN>`.
///
/// With no token configured every request is refused.
pub async fn require_token(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let authorized = match state.config.api_token.as_deref() {
        Some(expected) => req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .is_some_and(|token| token_matches(token, expected)),
        None => false,
    };

    if authorized {
        next.run(req).await
    } else {
        error_response(StatusCode::UNAUTHORIZED, "missing or invalid bearer token")
    }
}
