use axum::extract::rejection::JsonRejection;
use axum::extract::OriginalUri;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::malformed_body;
use super::ApiProblem;
use super::ApiSuccess;
use crate::account::models::LoginCommand;
use crate::account::models::TokenPair;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<LoginCommand>, JsonRejection>,
) -> Result<ApiSuccess<TokenPair>, ApiProblem> {
    let Json(command) = body.map_err(|e| state.problem(&malformed_body(e), uri.path()))?;

    state
        .account_service
        .login(command)
        .await
        .map_err(|e| state.problem(&e, uri.path()))
        .map(|tokens| ApiSuccess::new(StatusCode::OK, tokens))
}
