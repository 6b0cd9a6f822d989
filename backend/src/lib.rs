//! Course publishing and enrolment backend.
//!
//! The [`domain`] module holds the rules for who may create, read, join,
//! leave, and delete a course. [`inbound`] exposes them over HTTP and
//! [`outbound`] provides the course and account store adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
