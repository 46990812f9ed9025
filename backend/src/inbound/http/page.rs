//! Page responses.
//!
//! A page handler produces a [`PageOutcome`]: a JSON document, a redirect or a
//! not-found document. [`respond`] turns it into an HTTP response, draining
//! flash messages into rendered documents and converting caller-side errors
//! into a flash message plus `303 See Other`.

use actix_web::http::header;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{ApiResult, Error, NextPage, form_messages};

use super::error::redirect_target;
use super::session::SessionContext;

/// What a page handler decided to show.
#[derive(Debug)]
pub enum PageOutcome<T> {
    /// Render `T` as the page document.
    Render(T),
    /// Send the browser elsewhere.
    Redirect(String),
    /// The resource exists but this viewer may not know that.
    NotFound,
}

impl<T> PageOutcome<T> {
    /// Redirect to the page for `next`.
    pub fn next(next: &NextPage) -> Self {
        Self::Redirect(location(next))
    }
}

#[derive(Serialize)]
struct Document<'a, T> {
    messages: Vec<String>,
    #[serde(flatten)]
    body: &'a T,
}

/// Path of the page a finished action leads to.
pub fn location(next: &NextPage) -> String {
    match next {
        NextPage::Home => "/".to_owned(),
        NextPage::SpamQueue => "/t/spam".to_owned(),
        NextPage::Post(id) => format!("/p/{id}"),
        NextPage::Profile(uid) => format!("/u/{uid}"),
    }
}

/// A `303 See Other` to `to`.
pub fn see_other(to: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, to))
        .finish()
}

/// Queue `message` for the next page, logging instead of failing when the
/// session cannot store it.
pub fn flash(session: &SessionContext, message: impl Into<String>) {
    if let Err(error) = session.flash(message) {
        warn!(%error, "flash message dropped");
    }
}

/// Turn a page handler result into a response.
///
/// Errors the caller can act on are flashed and redirect to `fallback` (or
/// the login page for anonymous callers); infrastructure errors are reported
/// through the error envelope.
pub fn respond<T: Serialize>(
    session: &SessionContext,
    fallback: &str,
    result: ApiResult<PageOutcome<T>>,
) -> HttpResponse {
    match result {
        Ok(PageOutcome::Render(body)) => HttpResponse::Ok()
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .json(Document {
                messages: session.take_flash(),
                body: &body,
            }),
        Ok(PageOutcome::Redirect(to)) => see_other(&to),
        Ok(PageOutcome::NotFound) => not_found(),
        Err(error) => fail(session, fallback, &error),
    }
}

fn not_found() -> HttpResponse {
    let mut response = Error::not_found("page not found").error_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-store"));
    response
}

fn fail(session: &SessionContext, fallback: &str, error: &Error) -> HttpResponse {
    match redirect_target(error, fallback) {
        Some(to) => {
            debug!(code = ?error.code(), message = error.message(), to = %to, "page action refused");
            for message in form_messages(error) {
                flash(session, message);
            }
            see_other(&to)
        }
        None => error.error_response(),
    }
}
