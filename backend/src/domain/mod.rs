//! Domain primitives, policy, and services for course enrolment.
//!
//! Purpose: keep the rules for who may create, read, join, leave, and delete
//! a course free of transport and storage concerns. Inbound adapters talk to
//! the driving ports in [`ports`]; outbound adapters implement the driven
//! ports.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - UserId, Role, Principal, Account, InstructorProfile: caller identity.
//! - LoginCredentials, Registration: validated account payloads.
//! - Course, CourseDraft, CourseId, Price, StudentRoster: the aggregate.
//! - decide / Action / Decision: the authorization policy.
//! - EnrollmentEngine, CourseService, AccountService: the use-cases.

mod account_service;
mod auth;
mod course;
mod course_errors;
mod course_service;
mod enrollment;
pub mod error;
pub mod policy;
pub mod ports;
mod trace_id;
mod user;

pub use self::account_service::AccountService;
pub use self::auth::{
    EMAIL_MAX_LENGTH, LoginCredentials, LoginValidationError, PASSWORD_LENGTH, Registration,
    RegistrationValidationError, USERNAME_LENGTH,
};
pub use self::course::{
    Course, CourseDraft, CourseId, CourseRecord, CourseValidationError, Price, RosterError,
    StudentRoster,
};
pub use self::course_service::CourseService;
pub use self::enrollment::{EnrollmentEngine, JoinResult, LeaveResult, RetryPolicy};
pub use self::error::{Error, ErrorCode};
pub use self::policy::{Action, Decision, DenyReason, decide};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{Account, InstructorProfile, Principal, Role, UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use courses_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
