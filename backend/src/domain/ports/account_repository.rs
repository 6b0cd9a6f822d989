//! Driven port for registered accounts and their password hashes.

use async_trait::async_trait;

use crate::domain::Account;

use super::define_port_error;

define_port_error! {
    /// Errors raised by account store adapters.
    pub enum AccountRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "account store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "account store query failed: {message}",
        /// Another account already uses this email.
        DuplicateEmail { email: String } =>
            "an account already exists for {email}",
    }
}

/// Account together with the hash its password is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAccount {
    pub account: Account,
    pub password_hash: String,
}

/// Port for account persistence.
///
/// Emails are stored already normalised and are unique across the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persist a new account.
    ///
    /// Fails with [`AccountRepositoryError::DuplicateEmail`] when the email
    /// is taken.
    async fn insert(&self, account: &StoredAccount) -> Result<(), AccountRepositoryError>;

    /// Look an account up by its normalised email.
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StoredAccount>, AccountRepositoryError>;
}
