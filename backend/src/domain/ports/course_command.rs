//! Driving port for course mutations.
//!
//! Inbound adapters call this port with the caller's [`Principal`]; the
//! implementation enforces the authorization policy before any store access.

use async_trait::async_trait;

use crate::domain::{CourseId, Error, JoinResult, LeaveResult, Principal};

/// Raw course creation fields as received from a client.
///
/// Validation happens inside the service, after the policy check.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_ref: String,
}

/// Domain use-case port for course mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseCommand: Send + Sync {
    /// Publish a new course owned by `principal`.
    async fn create_course(
        &self,
        principal: &Principal,
        request: CreateCourseRequest,
    ) -> Result<CourseId, Error>;

    /// Add `principal` to the course roster.
    async fn enroll(&self, principal: &Principal, course_id: CourseId)
    -> Result<JoinResult, Error>;

    /// Remove `principal` from the course roster.
    async fn unenroll(
        &self,
        principal: &Principal,
        course_id: CourseId,
    ) -> Result<LeaveResult, Error>;

    /// Delete a course owned by `principal`.
    async fn delete_course(&self, principal: &Principal, course_id: CourseId)
    -> Result<(), Error>;
}
