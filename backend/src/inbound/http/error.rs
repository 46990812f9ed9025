//! HTTP mapping for domain errors.
//!
//! JSON endpoints (login, votes, health) answer with the error envelope and a
//! status derived from [`ErrorCode`]. Page routes never render an error
//! document for caller mistakes: [`redirect_target`] decides where the user is
//! sent with the message flashed, and only infrastructure failures fall
//! through to the envelope.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

pub use crate::domain::ApiResult;
use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Landing page for anonymous visitors bounced off a member-only route.
pub const LOGIN_PATH: &str = "/accounts/login";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Where a page route redirects after `error`.
///
/// Anonymous callers go to the login page; other caller-side failures go to
/// `fallback`. `None` means the failure is not the caller's doing and must be
/// reported as an error response.
pub fn redirect_target(error: &Error, fallback: &str) -> Option<String> {
    match error.code() {
        ErrorCode::Unauthorized => Some(LOGIN_PATH.to_owned()),
        ErrorCode::InvalidRequest
        | ErrorCode::Forbidden
        | ErrorCode::NotFound
        | ErrorCode::Conflict => Some(fallback.to_owned()),
        ErrorCode::ServiceUnavailable | ErrorCode::InternalError => None,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if error.code() != ErrorCode::InternalError {
        return error.clone();
    }
    let redacted = Error::internal("Internal server error");
    match error.trace_id() {
        Some(id) => redacted.with_trace_id(id.to_owned()),
        None => redacted,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(redact_if_internal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}

#[cfg(test)]
mod tests;
