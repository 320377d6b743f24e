use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::warn;

use crate::service::auth::decode_claims;

use super::api::AppState;

/// Rejects requests without a valid bearer token and threads the decoded
/// claims to handlers as a request extension.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    match decode_claims(
        token,
        &state.args.jwt_secret,
        &state.args.jwt_issuer,
        &state.args.jwt_audience,
    ) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            warn!("Rejected bearer token: {}", e);
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}
