use axum::extract::OriginalUri;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;

use super::ApiProblem;
use crate::inbound::http::router::AppState;

/// Serve the PEM public key so that other services can verify access tokens.
pub async fn jwt_public_key(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiProblem> {
    let pem = state
        .account_service
        .jwt_public_key()
        .await
        .map_err(|e| state.problem(&e, uri.path()))?;

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], pem).into_response())
}
