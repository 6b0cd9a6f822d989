//! Port for course persistence.
//!
//! The [`CourseRepository`] trait is the contract the enrolment engine and
//! course service rely on: point lookup, filtered scan, revision-checked
//! roster update, and delete. Adapters must make `save_roster` atomic with
//! respect to the revision check so concurrent writers cannot lose updates.

use async_trait::async_trait;

use crate::domain::{Course, CourseId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by course repository adapters.
    pub enum CourseRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "course repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "course repository query failed: {message}",
        /// Optimistic concurrency check failed.
        RevisionMismatch { expected: u32, actual: u32 } =>
            "revision mismatch: expected {expected}, found {actual}",
        /// The course vanished between read and write.
        NotFound { course_id: String } =>
            "course not found: {course_id}",
    }
}

/// How a title query is compared against stored titles.
///
/// Both modes ignore letter case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TitleMatch {
    #[default]
    Exact,
    Contains,
}

/// Selection criteria for [`CourseRepository::find_matching`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseFilter {
    All,
    Instructor(UserId),
    Student(UserId),
    Title { query: String, mode: TitleMatch },
}

impl CourseFilter {
    /// Evaluate the filter against a single course.
    ///
    /// Adapters that cannot push the filter down to their backing store use
    /// this to stay consistent with those that can.
    pub fn matches(&self, course: &Course) -> bool {
        match self {
            Self::All => true,
            Self::Instructor(id) => course.instructor_id() == *id,
            Self::Student(id) => course.students().contains(id),
            Self::Title { query, mode } => {
                let title = course.title().to_lowercase();
                let query = query.to_lowercase();
                match mode {
                    TitleMatch::Exact => title == query,
                    TitleMatch::Contains => title.contains(&query),
                }
            }
        }
    }
}

/// Port for course storage and retrieval.
///
/// # Revision Semantics
///
/// - New courses are stored at [`Course::INITIAL_REVISION`].
/// - The caller bumps the revision on the course value before calling
///   [`CourseRepository::save_roster`]; the repository never increments it.
/// - `save_roster` succeeds only while the stored revision still equals
///   `expected_revision`, otherwise it reports
///   [`CourseRepositoryError::RevisionMismatch`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist a newly created course.
    async fn insert(&self, course: &Course) -> Result<(), CourseRepositoryError>;

    /// Fetch a course by id, or `None` when it does not exist.
    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, CourseRepositoryError>;

    /// Return every course matching `filter`, oldest first.
    async fn find_matching(
        &self,
        filter: &CourseFilter,
    ) -> Result<Vec<Course>, CourseRepositoryError>;

    /// Replace the stored roster and revision of `course` if the stored
    /// revision equals `expected_revision`.
    ///
    /// Returns [`CourseRepositoryError::NotFound`] when the course has been
    /// deleted.
    async fn save_roster(
        &self,
        course: &Course,
        expected_revision: u32,
    ) -> Result<(), CourseRepositoryError>;

    /// Delete a course. Returns `Ok(false)` when it did not exist.
    async fn delete(&self, id: &CourseId) -> Result<bool, CourseRepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CourseDraft;
    use chrono::Utc;
    use rstest::rstest;

    fn course_titled(title: &str) -> Course {
        let draft = CourseDraft::try_new(title, "", 0.0, "").expect("valid draft");
        Course::create(CourseId::random(), draft, UserId::random(), Utc::now())
    }

    #[rstest]
    #[case("algebra", TitleMatch::Exact, false)]
    #[case("ALGEBRA I", TitleMatch::Exact, true)]
    #[case("algebra", TitleMatch::Contains, true)]
    #[case("bra i", TitleMatch::Contains, true)]
    #[case("geometry", TitleMatch::Contains, false)]
    fn title_filter_ignores_case(
        #[case] query: &str,
        #[case] mode: TitleMatch,
        #[case] expected: bool,
    ) {
        let course = course_titled("Algebra I");
        let filter = CourseFilter::Title {
            query: query.to_owned(),
            mode,
        };
        assert_eq!(filter.matches(&course), expected);
    }

    #[rstest]
    fn student_filter_checks_roster() {
        let mut course = course_titled("Algebra");
        let student = UserId::random();
        assert!(!CourseFilter::Student(student).matches(&course));
        course.add_student(student).expect("not the owner");
        assert!(CourseFilter::Student(student).matches(&course));
    }

    #[rstest]
    fn instructor_filter_checks_owner() {
        let course = course_titled("Algebra");
        assert!(CourseFilter::Instructor(course.instructor_id()).matches(&course));
        assert!(!CourseFilter::Instructor(UserId::random()).matches(&course));
    }

    #[test]
    fn revision_mismatch_message_names_both_revisions() {
        let err = CourseRepositoryError::revision_mismatch(2_u32, 3_u32);
        assert_eq!(err.to_string(), "revision mismatch: expected 2, found 3");
    }
}
