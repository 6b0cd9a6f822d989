//! In-process adapters for the course store and account store.
//!
//! Used when no database is configured and by integration tests. The course
//! store honours the same revision contract as the PostgreSQL adapter, so
//! the enrolment engine behaves identically against either.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{
    AccountRepository, AccountRepositoryError, CourseFilter, CourseRepository,
    CourseRepositoryError, FIXTURE_ACCOUNTS, FIXTURE_PASSWORD, PasswordHashError, PasswordHasher,
    StoredAccount, UserDirectory, UserDirectoryError,
};
use crate::domain::{Course, CourseId, InstructorProfile, UserId};

/// Course store backed by a `HashMap` behind an async read/write lock.
#[derive(Debug, Default)]
pub struct InMemoryCourseRepository {
    courses: RwLock<HashMap<CourseId, Course>>,
}

impl InMemoryCourseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    async fn insert(&self, course: &Course) -> Result<(), CourseRepositoryError> {
        let mut courses = self.courses.write().await;
        if courses.contains_key(&course.id()) {
            return Err(CourseRepositoryError::query(format!(
                "course {} already exists",
                course.id()
            )));
        }
        courses.insert(course.id(), course.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, CourseRepositoryError> {
        Ok(self.courses.read().await.get(id).cloned())
    }

    async fn find_matching(
        &self,
        filter: &CourseFilter,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let mut matching: Vec<Course> = self
            .courses
            .read()
            .await
            .values()
            .filter(|course| filter.matches(course))
            .cloned()
            .collect();
        matching.sort_by_key(|course| (course.created_at(), *course.id().as_uuid()));
        Ok(matching)
    }

    async fn save_roster(
        &self,
        course: &Course,
        expected_revision: u32,
    ) -> Result<(), CourseRepositoryError> {
        let mut courses = self.courses.write().await;
        let Some(stored) = courses.get_mut(&course.id()) else {
            return Err(CourseRepositoryError::not_found(course.id().to_string()));
        };
        if stored.revision() != expected_revision {
            return Err(CourseRepositoryError::revision_mismatch(
                expected_revision,
                stored.revision(),
            ));
        }
        *stored = course.clone();
        Ok(())
    }

    async fn delete(&self, id: &CourseId) -> Result<bool, CourseRepositoryError> {
        Ok(self.courses.write().await.remove(id).is_some())
    }
}

/// Account store keyed by normalised email.
///
/// Also serves as the [`UserDirectory`] so registered instructors show up on
/// their courses.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, StoredAccount>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the development accounts, each using
    /// [`FIXTURE_PASSWORD`].
    pub fn with_fixture_accounts(hasher: &dyn PasswordHasher) -> Result<Self, PasswordHashError> {
        let password_hash = hasher.hash(FIXTURE_PASSWORD)?;
        let accounts = FIXTURE_ACCOUNTS
            .iter()
            .map(|fixture| {
                (
                    fixture.email.to_owned(),
                    StoredAccount {
                        account: fixture.account(),
                        password_hash: password_hash.clone(),
                    },
                )
            })
            .collect();
        Ok(Self {
            accounts: RwLock::new(accounts),
        })
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountStore {
    async fn insert(&self, account: &StoredAccount) -> Result<(), AccountRepositoryError> {
        let mut accounts = self.accounts.write().await;
        let email = account.account.email();
        if accounts.contains_key(email) {
            return Err(AccountRepositoryError::duplicate_email(email));
        }
        accounts.insert(email.to_owned(), account.clone());
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StoredAccount>, AccountRepositoryError> {
        Ok(self.accounts.read().await.get(email).cloned())
    }
}

#[async_trait]
impl UserDirectory for InMemoryAccountStore {
    async fn find_profiles(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<InstructorProfile>, UserDirectoryError> {
        let wanted: HashSet<UserId> = ids.iter().copied().collect();
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|stored| wanted.contains(&stored.account.id()))
            .map(|stored| stored.account.profile())
            .collect())
    }
}
