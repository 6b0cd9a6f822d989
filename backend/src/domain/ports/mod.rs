//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_repository;
mod course_command;
mod course_query;
mod course_repository;
mod login_service;
mod password_hasher;
mod registration_service;
mod user_directory;

#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{AccountRepository, AccountRepositoryError, StoredAccount};
#[cfg(test)]
pub use course_command::MockCourseCommand;
pub use course_command::{CourseCommand, CreateCourseRequest};
#[cfg(test)]
pub use course_query::MockCourseQuery;
pub use course_query::{CourseQuery, CourseView};
#[cfg(test)]
pub use course_repository::MockCourseRepository;
pub use course_repository::{CourseFilter, CourseRepository, CourseRepositoryError, TitleMatch};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::{
    FIXTURE_ACCOUNTS, FIXTURE_INSTRUCTOR, FIXTURE_PASSWORD, FIXTURE_STUDENT, FixtureAccount,
    LoginService,
};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use registration_service::MockRegistrationService;
pub use registration_service::RegistrationService;
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{UserDirectory, UserDirectoryError};
