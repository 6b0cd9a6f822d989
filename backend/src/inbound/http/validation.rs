//! Shared request validation helpers for the HTTP adapter.

use serde_json::json;

use crate::domain::{CourseId, Error, UserId};

fn invalid_field(field: &str, code: &str, message: String) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code,
    }))
}

pub(crate) fn missing_field_error(field: &str) -> Error {
    invalid_field(field, "missing_field", format!("{field} is required"))
}

pub(crate) fn parse_user_id(raw: &str, field: &str) -> Result<UserId, Error> {
    UserId::new(raw)
        .map_err(|_| invalid_field(field, "invalid_uuid", format!("{field} must be a valid UUID")))
}

pub(crate) fn parse_course_id(raw: &str) -> Result<CourseId, Error> {
    raw.parse::<CourseId>().map_err(|_| {
        invalid_field(
            "courseId",
            "invalid_uuid",
            "courseId must be a valid UUID".to_owned(),
        )
    })
}
