//! Course domain service implementing the course driving ports.
//!
//! Every operation consults the authorization policy before touching the
//! store. Roster mutations are delegated to the [`EnrollmentEngine`].

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::course_errors::{
    course_not_found, map_course_repository_error, map_user_directory_error, validation_error,
};
use super::enrollment::{EnrollmentEngine, JoinResult, LeaveResult, RetryPolicy};
use super::policy::{Action, decide};
use crate::domain::ports::{
    CourseCommand, CourseFilter, CourseQuery, CourseRepository, CourseView, CreateCourseRequest,
    TitleMatch, UserDirectory,
};
use crate::domain::{Course, CourseDraft, CourseId, Error, Principal, UserId};

/// Course service implementing [`CourseCommand`] and [`CourseQuery`].
pub struct CourseService<R, D> {
    repo: Arc<R>,
    directory: Arc<D>,
    engine: EnrollmentEngine<R>,
    clock: Arc<dyn Clock>,
}

impl<R, D> CourseService<R, D> {
    /// Create a service over a course store and user directory.
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use courses_backend::domain::{CourseService, RetryPolicy};
    /// # use courses_backend::outbound::memory::{InMemoryAccountStore, InMemoryCourseRepository};
    /// # use mockable::DefaultClock;
    /// let service = CourseService::new(
    ///     Arc::new(InMemoryCourseRepository::default()),
    ///     Arc::new(InMemoryAccountStore::new()),
    ///     Arc::new(DefaultClock),
    ///     RetryPolicy::default(),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(
        repo: Arc<R>,
        directory: Arc<D>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            engine: EnrollmentEngine::new(Arc::clone(&repo), retry),
            repo,
            directory,
            clock,
        }
    }
}

impl<R, D> CourseService<R, D>
where
    R: CourseRepository,
    D: UserDirectory,
{
    async fn load(&self, course_id: CourseId) -> Result<Course, Error> {
        self.repo
            .find_by_id(&course_id)
            .await
            .map_err(map_course_repository_error)?
            .ok_or_else(|| course_not_found(course_id))
    }

    async fn list(&self, filter: &CourseFilter) -> Result<Vec<CourseView>, Error> {
        let courses = self
            .repo
            .find_matching(filter)
            .await
            .map_err(map_course_repository_error)?;
        self.decorate(courses).await
    }

    /// Attach instructor profiles, resolving each distinct owner once.
    async fn decorate(&self, mut courses: Vec<Course>) -> Result<Vec<CourseView>, Error> {
        if courses.is_empty() {
            return Ok(Vec::new());
        }
        courses.sort_by_key(Course::created_at);
        let owners: Vec<UserId> = courses
            .iter()
            .map(Course::instructor_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let profiles: HashMap<UserId, _> = self
            .directory
            .find_profiles(&owners)
            .await
            .map_err(map_user_directory_error)?
            .into_iter()
            .map(|profile| (profile.id, profile))
            .collect();

        Ok(courses
            .into_iter()
            .map(|course| {
                let instructor = profiles.get(&course.instructor_id()).cloned();
                CourseView { course, instructor }
            })
            .collect())
    }
}

#[async_trait]
impl<R, D> CourseCommand for CourseService<R, D>
where
    R: CourseRepository,
    D: UserDirectory,
{
    async fn create_course(
        &self,
        principal: &Principal,
        request: CreateCourseRequest,
    ) -> Result<CourseId, Error> {
        decide(principal, Action::CreateCourse, None).into_result()?;
        let draft = CourseDraft::try_new(
            &request.title,
            &request.description,
            request.price,
            &request.image_ref,
        )
        .map_err(|err| validation_error(&err))?;

        let course = Course::create(CourseId::random(), draft, principal.id(), self.clock.utc());
        self.repo
            .insert(&course)
            .await
            .map_err(map_course_repository_error)?;
        info!(course_id = %course.id(), instructor_id = %principal.id(), "course created");
        Ok(course.id())
    }

    async fn enroll(
        &self,
        principal: &Principal,
        course_id: CourseId,
    ) -> Result<JoinResult, Error> {
        decide(principal, Action::Enroll, None).into_result()?;
        let result = self.engine.join(course_id, principal.id()).await?;
        info!(%course_id, student_id = %principal.id(), ?result, "enrol request handled");
        Ok(result)
    }

    async fn unenroll(
        &self,
        principal: &Principal,
        course_id: CourseId,
    ) -> Result<LeaveResult, Error> {
        decide(principal, Action::Unenroll, None).into_result()?;
        let result = self.engine.leave(course_id, principal.id()).await?;
        info!(%course_id, student_id = %principal.id(), ?result, "unenrol request handled");
        Ok(result)
    }

    async fn delete_course(&self, principal: &Principal, course_id: CourseId) -> Result<(), Error> {
        decide(principal, Action::DeleteCourse, None).into_result()?;
        let course = self.load(course_id).await?;
        decide(principal, Action::DeleteCourse, Some(&course)).into_result()?;

        let deleted = self
            .repo
            .delete(&course_id)
            .await
            .map_err(map_course_repository_error)?;
        if !deleted {
            return Err(course_not_found(course_id));
        }
        info!(%course_id, instructor_id = %principal.id(), "course deleted");
        Ok(())
    }
}

#[async_trait]
impl<R, D> CourseQuery for CourseService<R, D>
where
    R: CourseRepository,
    D: UserDirectory,
{
    async fn list_all(&self, principal: &Principal) -> Result<Vec<CourseView>, Error> {
        decide(principal, Action::ListAll, None).into_result()?;
        self.list(&CourseFilter::All).await
    }

    async fn list_by_instructor(
        &self,
        principal: &Principal,
        instructor_id: UserId,
    ) -> Result<Vec<CourseView>, Error> {
        decide(principal, Action::ListByInstructor, None).into_result()?;
        self.list(&CourseFilter::Instructor(instructor_id)).await
    }

    async fn list_by_student(
        &self,
        principal: &Principal,
        student_id: UserId,
    ) -> Result<Vec<CourseView>, Error> {
        decide(principal, Action::ListByStudent, None).into_result()?;
        self.list(&CourseFilter::Student(student_id)).await
    }

    async fn find_by_title(
        &self,
        principal: &Principal,
        title: &str,
        mode: TitleMatch,
    ) -> Result<Vec<CourseView>, Error> {
        decide(principal, Action::FindByTitle, None).into_result()?;
        self.list(&CourseFilter::Title {
            query: title.trim().to_owned(),
            mode,
        })
        .await
    }

    async fn get_course(
        &self,
        principal: &Principal,
        course_id: CourseId,
    ) -> Result<CourseView, Error> {
        decide(principal, Action::GetCourse, None).into_result()?;
        let course = self.load(course_id).await?;
        let mut views = self.decorate(vec![course]).await?;
        views.pop().ok_or_else(|| course_not_found(course_id))
    }
}
