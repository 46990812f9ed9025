//! Tests for HTTP error mapping.

use super::*;
use crate::domain::{AccessDenied, Error, FormErrors};
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use actix_web::ResponseError;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn internal_error() -> Error {
    Error::internal("pool exhausted on host db-1")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"dsn": "postgres://secret"}))
}

async fn decode(response: HttpResponse) -> Error {
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    serde_json::from_slice(&bytes).expect("error envelope decodes")
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("taken"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_trace_id(internal_error: Error) {
    let response = internal_error.error_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    assert_eq!(header.as_deref(), Some(TRACE_ID));

    let payload = decode(response).await;
    assert_eq!(payload.message(), "Internal server error");
    assert_eq!(payload.trace_id(), Some(TRACE_ID));
    assert!(payload.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn form_errors_travel_in_details() {
    let mut errors = FormErrors::new();
    errors.add_field("title", "title is too short");
    let response = Error::from(errors).error_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(TRACE_ID_HEADER).is_none());

    let payload = decode(response).await;
    assert_eq!(payload.message(), "title: title is too short");
    assert_eq!(
        payload.details(),
        Some(&json!({"form": {"fields": {"title": ["title is too short"]}, "nonField": []}}))
    );
}

#[rstest]
#[case(Error::from(AccessDenied::LoginRequired), Some(LOGIN_PATH))]
#[case(Error::from(AccessDenied::ModeratorRequired), Some("/p/1"))]
#[case(Error::not_found("post does not exist"), Some("/p/1"))]
#[case(Error::invalid_request("title is too short"), Some("/p/1"))]
#[case(Error::conflict("account already exists"), Some("/p/1"))]
#[case(Error::service_unavailable("cache down"), None)]
#[case(Error::internal("boom"), None)]
fn page_failures_redirect_by_category(#[case] error: Error, #[case] expected: Option<&str>) {
    assert_eq!(redirect_target(&error, "/p/1").as_deref(), expected);
}

#[rstest]
fn actix_errors_become_redacted_internal_errors() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.details(), None);
}
