use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use problem::InternalError;
use problem::ProblemTranslator;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::confirm_email::confirm_email;
use super::handlers::jwt_public_key::jwt_public_key;
use super::handlers::login::login;
use super::handlers::refresh_token::refresh_token;
use super::handlers::register::register;
use super::handlers::reset_password::reset_password;
use super::handlers::send_email_confirmation::send_email_confirmation;
use super::handlers::ApiProblem;
use crate::account::ports::AccountServicePort;

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountServicePort>,
    pub translator: Arc<ProblemTranslator>,
}

impl AppState {
    /// Turn a use case failure into the response for `request_path`.
    pub fn problem(&self, error: &InternalError, request_path: &str) -> ApiProblem {
        let document = self.translator.translate(error, request_path);

        if document.status >= 500 {
            tracing::error!(status = document.status, path = %request_path, error = %error, "Request failed");
        } else {
            tracing::info!(status = document.status, path = %request_path, error = %error, "Request rejected");
        }

        ApiProblem(document)
    }
}

pub fn create_router(
    account_service: Arc<dyn AccountServicePort>,
    translator: ProblemTranslator,
) -> Router {
    let state = AppState {
        account_service,
        translator: Arc::new(translator),
    };

    let auth_routes = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route(
            "/auth/confirm-email",
            post(send_email_confirmation).get(confirm_email),
        )
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/refresh-token", post(refresh_token))
        .route("/auth/jwt-public-key", get(jwt_public_key));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                path = %request.uri().path(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(auth_routes)
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer)
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
