//! Translation of port failures into domain errors for the course use-cases.

use serde_json::json;

use crate::domain::ports::{CourseRepositoryError, UserDirectoryError};
use crate::domain::{CourseId, CourseValidationError, Error};

pub(crate) fn course_not_found(course_id: CourseId) -> Error {
    Error::not_found("course not found").with_details(json!({
        "courseId": course_id.to_string(),
        "code": "course_not_found",
    }))
}

pub(crate) fn validation_error(error: &CourseValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({
        "field": error.field(),
        "code": error.code(),
    }))
}

pub(crate) fn enrollment_conflict(course_id: CourseId, attempts: u32) -> Error {
    Error::service_unavailable("course roster is busy; try again").with_details(json!({
        "courseId": course_id.to_string(),
        "attempts": attempts,
        "code": "enrollment_conflict",
    }))
}

pub(crate) fn map_course_repository_error(error: CourseRepositoryError) -> Error {
    match error {
        CourseRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("course repository unavailable: {message}"))
        }
        CourseRepositoryError::Query { message } => {
            Error::internal(format!("course repository error: {message}"))
        }
        CourseRepositoryError::RevisionMismatch { expected, actual } => {
            Error::conflict("revision mismatch").with_details(json!({
                "expectedRevision": expected,
                "actualRevision": actual,
                "code": "revision_mismatch",
            }))
        }
        CourseRepositoryError::NotFound { course_id } => {
            Error::not_found("course not found").with_details(json!({
                "courseId": course_id,
                "code": "course_not_found",
            }))
        }
    }
}

pub(crate) fn map_user_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserDirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}
