//! Driving port for login.
//!
//! Inbound adapters call this port to turn credentials into a [`Principal`]
//! without knowing which identity provider backs it.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, Error, LoginCredentials, Principal, Role, UserId};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated principal.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Principal, Error>;
}

/// Password shared by every development account.
pub const FIXTURE_PASSWORD: &str = "password";

/// Development account seeded into the in-memory account store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureAccount {
    pub id: UserId,
    pub role: Role,
    pub username: &'static str,
    pub email: &'static str,
}

impl FixtureAccount {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.role)
    }

    pub fn account(&self) -> Account {
        Account::new(self.id, self.username, self.email, self.role)
    }
}

/// Development instructor account.
pub const FIXTURE_INSTRUCTOR: FixtureAccount = FixtureAccount {
    id: UserId::from_uuid(Uuid::from_u128(0x123e_4567_e89b_12d3_a456_4266_1417_4000)),
    role: Role::Instructor,
    username: "instructor",
    email: "instructor@example.com",
};

/// Development student account.
pub const FIXTURE_STUDENT: FixtureAccount = FixtureAccount {
    id: UserId::from_uuid(Uuid::from_u128(0x123e_4567_e89b_12d3_a456_4266_1417_4001)),
    role: Role::Student,
    username: "student",
    email: "student@example.com",
};

/// Every development account, instructor first.
pub const FIXTURE_ACCOUNTS: [FixtureAccount; 2] = [FIXTURE_INSTRUCTOR, FIXTURE_STUDENT];
