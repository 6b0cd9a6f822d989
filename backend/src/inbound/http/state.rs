//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and depend only on driving
//! ports, so they can be exercised with mocks and no I/O.

use std::sync::Arc;

use crate::domain::ports::{CourseCommand, CourseQuery, LoginService, RegistrationService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub registration: Arc<dyn RegistrationService>,
    pub courses: Arc<dyn CourseCommand>,
    pub courses_query: Arc<dyn CourseQuery>,
}

impl HttpState {
    /// Bundle the ports used by the HTTP handlers.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use courses_backend::domain::{AccountService, CourseService, RetryPolicy};
    /// use courses_backend::inbound::http::state::HttpState;
    /// use courses_backend::outbound::memory::{InMemoryAccountStore, InMemoryCourseRepository};
    /// use courses_backend::outbound::password::Argon2PasswordHasher;
    /// use mockable::DefaultClock;
    ///
    /// let store = Arc::new(InMemoryAccountStore::new());
    /// let accounts = Arc::new(AccountService::new(
    ///     Arc::clone(&store),
    ///     Arc::new(Argon2PasswordHasher::default()),
    /// ));
    /// let courses = Arc::new(CourseService::new(
    ///     Arc::new(InMemoryCourseRepository::default()),
    ///     store,
    ///     Arc::new(DefaultClock),
    ///     RetryPolicy::default(),
    /// ));
    /// let state = HttpState::new(accounts.clone(), accounts, courses.clone(), courses);
    /// # let _ = state;
    /// ```
    pub fn new(
        login: Arc<dyn LoginService>,
        registration: Arc<dyn RegistrationService>,
        courses: Arc<dyn CourseCommand>,
        courses_query: Arc<dyn CourseQuery>,
    ) -> Self {
        Self {
            login,
            registration,
            courses,
            courses_query,
        }
    }
}
