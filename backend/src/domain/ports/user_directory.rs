//! Port for resolving public instructor profiles.
//!
//! Course listings show who teaches each course. The directory is read-only
//! from the course service's point of view; accounts are created through
//! the registration port.

use async_trait::async_trait;

use crate::domain::{InstructorProfile, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } =>
            "user directory connection failed: {message}",
        /// Lookup failed during execution.
        Query { message: String } =>
            "user directory query failed: {message}",
    }
}

/// Port for instructor profile lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve profiles for the given ids.
    ///
    /// Ids without an account are silently omitted; the result order is
    /// unspecified.
    async fn find_profiles(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<InstructorProfile>, UserDirectoryError>;
}
