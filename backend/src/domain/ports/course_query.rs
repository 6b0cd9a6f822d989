//! Driving port for course reads.

use async_trait::async_trait;

use crate::domain::{Course, CourseId, Error, InstructorProfile, Principal, UserId};

use super::TitleMatch;

/// A course decorated with its owner's public profile.
///
/// `instructor` is `None` when the owning account no longer exists.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseView {
    pub course: Course,
    pub instructor: Option<InstructorProfile>,
}

/// Domain use-case port for course lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseQuery: Send + Sync {
    /// Every course, oldest first.
    async fn list_all(&self, principal: &Principal) -> Result<Vec<CourseView>, Error>;

    /// Courses owned by `instructor_id`.
    async fn list_by_instructor(
        &self,
        principal: &Principal,
        instructor_id: UserId,
    ) -> Result<Vec<CourseView>, Error>;

    /// Courses whose roster contains `student_id`.
    async fn list_by_student(
        &self,
        principal: &Principal,
        student_id: UserId,
    ) -> Result<Vec<CourseView>, Error>;

    /// Courses whose title matches `title` under `mode`.
    async fn find_by_title(
        &self,
        principal: &Principal,
        title: &str,
        mode: TitleMatch,
    ) -> Result<Vec<CourseView>, Error>;

    /// A single course; `not_found` when it does not exist.
    async fn get_course(
        &self,
        principal: &Principal,
        course_id: CourseId,
    ) -> Result<CourseView, Error>;
}
