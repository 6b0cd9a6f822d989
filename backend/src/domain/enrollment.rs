//! Enrolment engine: idempotent join and leave with per-course serialisation.
//!
//! Every roster edit runs under an async mutex keyed by course id, so edits
//! to one course inside this process never interleave. The store write is a
//! compare-and-store on the course revision, which also protects against
//! writers in other processes; a lost race is retried a bounded number of
//! times with jittered backoff before it surfaces as a transient failure.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::course_errors::{course_not_found, enrollment_conflict, map_course_repository_error};
use crate::domain::ports::{CourseRepository, CourseRepositoryError};
use crate::domain::{Course, CourseId, Error, RosterError, UserId};

/// Outcome of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JoinResult {
    Enrolled,
    AlreadyEnrolled,
}

/// Outcome of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeaveResult {
    Unenrolled,
    NotEnrolled,
}

/// Bounded retry settings for revision conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_jitter: Duration,
}

impl RetryPolicy {
    /// Default number of attempts per roster edit.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Build a policy; `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, base_delay: Duration, max_jitter: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_jitter,
        }
    }

    /// Policy with the default delays and a custom attempt budget.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Linear backoff plus uniform jitter.
    fn delay_for(&self, attempt: u32) -> Duration {
        let jitter_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(SmallRng::from_entropy().gen_range(0..=jitter_ms))
        };
        self.base_delay.saturating_mul(attempt).saturating_add(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(5),
            max_jitter: Duration::from_millis(10),
        }
    }
}

/// Registry of per-course mutexes.
///
/// Entries are weak so a course that nobody is editing costs nothing; dead
/// entries are pruned whenever a new lock is created.
#[derive(Debug, Default)]
struct CourseLocks {
    handles: Mutex<HashMap<CourseId, Weak<tokio::sync::Mutex<()>>>>,
}

impl CourseLocks {
    fn handle(&self, course_id: CourseId) -> Arc<tokio::sync::Mutex<()>> {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = handles.get(&course_id).and_then(Weak::upgrade) {
            return existing;
        }
        handles.retain(|_, handle| handle.strong_count() > 0);
        let lock = Arc::new(tokio::sync::Mutex::new(()));
        handles.insert(course_id, Arc::downgrade(&lock));
        lock
    }

    #[cfg(test)]
    fn live_entries(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|handle| handle.strong_count() > 0)
            .count()
    }
}

/// Join/leave engine over a [`CourseRepository`].
pub struct EnrollmentEngine<R> {
    repo: Arc<R>,
    locks: CourseLocks,
    retry: RetryPolicy,
}

impl<R> EnrollmentEngine<R> {
    pub fn new(repo: Arc<R>, retry: RetryPolicy) -> Self {
        Self {
            repo,
            locks: CourseLocks::default(),
            retry,
        }
    }
}

impl<R> EnrollmentEngine<R>
where
    R: CourseRepository,
{
    /// Add `student` to the roster of `course_id`.
    ///
    /// Joining twice is a no-op reported as [`JoinResult::AlreadyEnrolled`].
    pub async fn join(&self, course_id: CourseId, student: UserId) -> Result<JoinResult, Error> {
        self.edit_roster(course_id, move |course| match course.add_student(student) {
            Ok(true) => Ok((JoinResult::Enrolled, true)),
            Ok(false) => Ok((JoinResult::AlreadyEnrolled, false)),
            Err(RosterError::OwnerCannotEnroll) => Err(Error::invalid_request(
                RosterError::OwnerCannotEnroll.to_string(),
            )
            .with_details(json!({ "code": "owner_cannot_enroll" }))),
        })
        .await
    }

    /// Remove `student` from the roster of `course_id`.
    pub async fn leave(&self, course_id: CourseId, student: UserId) -> Result<LeaveResult, Error> {
        self.edit_roster(course_id, move |course| {
            if course.remove_student(&student) {
                Ok((LeaveResult::Unenrolled, true))
            } else {
                Ok((LeaveResult::NotEnrolled, false))
            }
        })
        .await
    }

    /// Load, edit, and compare-and-store a course under its lock.
    ///
    /// `edit` returns the outcome and whether it changed the course; an
    /// unchanged course is not written back.
    async fn edit_roster<T, F>(&self, course_id: CourseId, mut edit: F) -> Result<T, Error>
    where
        F: FnMut(&mut Course) -> Result<(T, bool), Error> + Send,
        T: Send,
    {
        let lock = self.locks.handle(course_id);
        let _guard = lock.lock().await;

        let mut attempt = 1;
        loop {
            let mut course = self
                .repo
                .find_by_id(&course_id)
                .await
                .map_err(map_course_repository_error)?
                .ok_or_else(|| course_not_found(course_id))?;
            let expected_revision = course.revision();
            let (outcome, changed) = edit(&mut course)?;
            if !changed {
                return Ok(outcome);
            }

            match self.repo.save_roster(&course, expected_revision).await {
                Ok(()) => return Ok(outcome),
                Err(CourseRepositoryError::RevisionMismatch { expected, actual })
                    if attempt < self.retry.max_attempts =>
                {
                    debug!(
                        %course_id,
                        attempt,
                        expected,
                        actual,
                        "roster revision changed underneath us; retrying"
                    );
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(CourseRepositoryError::RevisionMismatch { .. }) => {
                    warn!(%course_id, attempts = attempt, "roster update retries exhausted");
                    return Err(enrollment_conflict(course_id, attempt));
                }
                Err(CourseRepositoryError::NotFound { .. }) => {
                    return Err(course_not_found(course_id));
                }
                Err(other) => return Err(map_course_repository_error(other)),
            }
        }
    }
}
