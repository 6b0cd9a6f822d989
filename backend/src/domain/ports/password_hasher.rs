//! Port for one-way password hashing.
//!
//! Implementations are CPU bound; callers run them off the async executor.

use super::define_port_error;

define_port_error! {
    /// Errors raised while configuring a hasher or producing a hash.
    pub enum PasswordHashError {
        /// Hash parameters were rejected.
        Config { message: String } =>
            "password hasher misconfigured: {message}",
        /// Hashing itself failed.
        Hash { message: String } =>
            "password hashing failed: {message}",
    }
}

/// Hashes passwords for storage and verifies candidates against them.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing hash string, salt included.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Check a candidate password. Unparseable hashes never verify.
    fn verify(&self, password: &str, hash: &str) -> bool;
}
