//! Driving port for account sign-up.

use async_trait::async_trait;

use crate::domain::{Account, Error, Registration};

/// Domain use-case port for creating accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Create an account; a taken email is a conflict.
    async fn register(&self, registration: &Registration) -> Result<Account, Error>;
}
