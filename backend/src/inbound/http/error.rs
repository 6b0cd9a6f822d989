//! Translation of domain errors into HTTP responses.
//!
//! The domain [`Error`] stays free of Actix types; this module decides the
//! status code, response headers, and wire body for each [`ErrorCode`].
//! Store failures are logged with their full detail before the body is
//! reduced to a generic message.

use actix_web::http::header::RETRY_AFTER;
use actix_web::{HttpResponse, HttpResponseBuilder, ResponseError, http::StatusCode};
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Result alias returned by the HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Back-off hint, in seconds, sent with `503` responses.
const RETRY_AFTER_SECONDS: &str = "1";

const REDACTED_MESSAGE: &str = "Internal server error";

fn http_status(code: ErrorCode) -> StatusCode {
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

fn log_failure(err: &Error) {
    match err.code() {
        ErrorCode::InternalError => {
            error!(message = err.message(), details = ?err.details(), "course request failed");
        }
        ErrorCode::ServiceUnavailable => {
            warn!(message = err.message(), details = ?err.details(), "course store busy or offline");
        }
        _ => {}
    }
}

/// Body sent to the client: internal failures lose their message and details
/// but keep the trace id.
fn wire_body(err: &Error) -> Error {
    if err.code() != ErrorCode::InternalError {
        return err.clone();
    }
    let redacted = Error::internal(REDACTED_MESSAGE);
    match err.trace_id() {
        Some(id) => redacted.with_trace_id(id),
        None => redacted,
    }
}

fn decorate(builder: &mut HttpResponseBuilder, err: &Error) {
    if let Some(id) = err.trace_id() {
        builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
    }
    if err.code() == ErrorCode::ServiceUnavailable {
        builder.insert_header((RETRY_AFTER, RETRY_AFTER_SECONDS));
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        http_status(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        log_failure(self);
        let mut builder = HttpResponse::build(self.status_code());
        decorate(&mut builder, self);
        builder.json(wire_body(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "framework error surfaced in a course handler");
        Self::internal(REDACTED_MESSAGE)
    }
}
