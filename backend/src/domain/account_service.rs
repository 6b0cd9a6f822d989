//! Account service implementing the login and registration driving ports.
//!
//! Passwords are hashed and verified on the blocking pool; the account store
//! only ever sees the resulting hash.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    AccountRepository, AccountRepositoryError, LoginService, PasswordHashError, PasswordHasher,
    RegistrationService, StoredAccount,
};
use crate::domain::{Account, Error, LoginCredentials, Principal, Registration, UserId};

const INVALID_CREDENTIALS: &str = "invalid credentials";

fn map_account_repository_error(error: AccountRepositoryError) -> Error {
    match error {
        AccountRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("account store unavailable: {message}"))
        }
        AccountRepositoryError::Query { message } => {
            Error::internal(format!("account store error: {message}"))
        }
        AccountRepositoryError::DuplicateEmail { email } => {
            Error::conflict(format!("an account already exists for {email}")).with_details(
                json!({
                    "field": "email",
                    "code": "email_taken",
                }),
            )
        }
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

/// Account service implementing [`LoginService`] and [`RegistrationService`].
pub struct AccountService<R> {
    repo: Arc<R>,
    hasher: Arc<dyn PasswordHasher>,
}

impl<R> AccountService<R> {
    /// Create a service over an account store and password hasher.
    pub fn new(repo: Arc<R>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repo, hasher }
    }

    async fn hash(&self, password: &str) -> Result<String, Error> {
        let hasher = Arc::clone(&self.hasher);
        let password = zeroize::Zeroizing::new(password.to_owned());
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(map_hash_error)
    }

    async fn verify(&self, password: &str, hash: String) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        let password = zeroize::Zeroizing::new(password.to_owned());
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|err| Error::internal(format!("password check task failed: {err}")))
    }
}

#[async_trait]
impl<R> LoginService for AccountService<R>
where
    R: AccountRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Principal, Error> {
        let Some(stored) = self
            .repo
            .find_by_email(credentials.email())
            .await
            .map_err(map_account_repository_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        if !self
            .verify(credentials.password(), stored.password_hash)
            .await?
        {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        Ok(stored.account.principal())
    }
}

#[async_trait]
impl<R> RegistrationService for AccountService<R>
where
    R: AccountRepository,
{
    async fn register(&self, registration: &Registration) -> Result<Account, Error> {
        let password_hash = self.hash(registration.password()).await?;
        let account = Account::new(
            UserId::random(),
            registration.username(),
            registration.email(),
            registration.role(),
        );
        self.repo
            .insert(&StoredAccount {
                account: account.clone(),
                password_hash,
            })
            .await
            .map_err(map_account_repository_error)?;
        info!(user_id = %account.id(), role = %account.role(), "account registered");
        Ok(account)
    }
}
