use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::header;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use problem::InternalError;
use problem::ProblemDocument;
use problem::ValidationErrors;
use problem::PROBLEM_JSON_CONTENT_TYPE;
use serde::Serialize;

use crate::account::errors::AccountError;

pub mod confirm_email;
pub mod jwt_public_key;
pub mod login;
pub mod refresh_token;
pub mod register;
pub mod reset_password;
pub mod send_email_confirmation;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

/// RFC 7807 failure response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiProblem(pub ProblemDocument);

impl IntoResponse for ApiProblem {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match serde_json::to_vec(&self.0) {
            Ok(body) => (
                status,
                [(header::CONTENT_TYPE, PROBLEM_JSON_CONTENT_TYPE)],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize problem document");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

const MALFORMED_BODY: &str = "The request body is not valid JSON.";
const MALFORMED_QUERY: &str = "The query string is not valid.";

/// Failure for a request body that could not be read as the expected JSON.
pub(crate) fn malformed_body(rejection: JsonRejection) -> InternalError {
    tracing::debug!(error = %rejection, "Rejected request body");
    malformed("Body", MALFORMED_BODY)
}

/// Failure for a query string that could not be read.
pub(crate) fn malformed_query(rejection: QueryRejection) -> InternalError {
    tracing::debug!(error = %rejection, "Rejected query string");
    malformed("Query", MALFORMED_QUERY)
}

fn malformed(field: &str, message: &str) -> InternalError {
    let mut errors = ValidationErrors::new();
    errors.add(field, message);
    AccountError::ValidationFailed(errors).into()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::extract::Query;
    use axum::http::Request;
    use axum::http::Uri;
    use problem::ErrorCode;
    use problem::ExtensionValue;
    use problem::ProblemTranslator;

    use super::*;

    #[tokio::test]
    async fn test_malformed_input_hides_rejection_text() {
        let request = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username": tru"#))
            .unwrap();
        let rejection = Json::<serde_json::Value>::from_request(request, &())
            .await
            .unwrap_err();
        let error = malformed_body(rejection);
        assert_eq!(error.code(), ErrorCode::BadRequest);
        assert_eq!(
            error.extensions().get("Body"),
            Some(&ExtensionValue::Text(MALFORMED_BODY.into()))
        );

        let uri: Uri = "/auth/confirm-email?attempts=many".parse().unwrap();
        let rejection = Query::<HashMap<String, u32>>::try_from_uri(&uri).unwrap_err();
        let error = malformed_query(rejection);
        assert_eq!(
            error.extensions().get("Query"),
            Some(&ExtensionValue::Text(MALFORMED_QUERY.into()))
        );
    }

    #[tokio::test]
    async fn test_problem_response_uses_problem_json() {
        let error: InternalError = AccountError::UserNotFound.into();
        let document = ProblemTranslator::new("https://accounts.test").translate(&error, "/auth/x");

        let response = ApiProblem(document).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            PROBLEM_JSON_CONTENT_TYPE
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["type"], "https://accounts.test/errors/notfound");
        assert_eq!(json["statusCode"], ErrorCode::NotFound.as_str());
    }

    #[test]
    fn test_success_envelope() {
        let success = ApiSuccess::new(StatusCode::OK, "pem");
        assert_eq!(success, ApiSuccess::new(StatusCode::OK, "pem"));
        assert_eq!(
            serde_json::to_value(ApiResponseBody::new(StatusCode::OK, 7)).unwrap(),
            serde_json::json!({ "status_code": 200, "data": 7 })
        );
    }
}
