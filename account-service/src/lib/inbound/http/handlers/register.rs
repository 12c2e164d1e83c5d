use axum::extract::rejection::JsonRejection;
use axum::extract::OriginalUri;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::malformed_body;
use super::ApiProblem;
use super::ApiSuccess;
use crate::account::models::RegisterCommand;
use crate::inbound::http::router::AppState;

/// Create an account; the confirmation email is sent in the background.
pub async fn register(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<RegisterCommand>, JsonRejection>,
) -> Result<ApiSuccess<()>, ApiProblem> {
    let Json(command) = body.map_err(|e| state.problem(&malformed_body(e), uri.path()))?;

    state
        .account_service
        .register(command)
        .await
        .map_err(|e| state.problem(&e, uri.path()))
        .map(|()| ApiSuccess::new(StatusCode::OK, ()))
}
