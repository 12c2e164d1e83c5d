use axum::extract::rejection::QueryRejection;
use axum::extract::OriginalUri;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;

use super::malformed_query;
use super::ApiProblem;
use super::ApiSuccess;
use crate::account::models::ConfirmEmailCommand;
use crate::account::models::ConfirmEmailOutcome;
use crate::inbound::http::router::AppState;

/// Target of the emailed confirmation link.
pub async fn confirm_email(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    query: Result<Query<ConfirmEmailCommand>, QueryRejection>,
) -> Result<ApiSuccess<ConfirmEmailOutcome>, ApiProblem> {
    let Query(command) = query.map_err(|e| state.problem(&malformed_query(e), uri.path()))?;

    state
        .account_service
        .confirm_email(command)
        .await
        .map_err(|e| state.problem(&e, uri.path()))
        .map(|outcome| ApiSuccess::new(StatusCode::OK, outcome))
}
