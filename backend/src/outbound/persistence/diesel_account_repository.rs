//! PostgreSQL-backed `AccountRepository` implementation.
//!
//! Email uniqueness is enforced by the `users_email_key` constraint, so two
//! concurrent sign-ups with one address cannot both succeed.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AccountRepository, AccountRepositoryError, StoredAccount};
use crate::domain::{Account, Role, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AccountRow, NewAccountRow};
use super::pool::DbPool;
use super::schema::users;

const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Diesel-backed implementation of the `AccountRepository` port.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn diesel_error(error: DieselError) -> AccountRepositoryError {
    map_diesel_error(
        error,
        AccountRepositoryError::query,
        AccountRepositoryError::connection,
    )
}

fn insert_error(error: DieselError, email: &str) -> AccountRepositoryError {
    match &error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.constraint_name() == Some(EMAIL_CONSTRAINT) =>
        {
            AccountRepositoryError::duplicate_email(email)
        }
        _ => diesel_error(error),
    }
}

fn row_to_stored(row: AccountRow) -> Result<StoredAccount, AccountRepositoryError> {
    let role: Role = row.role.parse().map_err(|err| {
        AccountRepositoryError::query(format!("stored account {} has {err}", row.id))
    })?;
    Ok(StoredAccount {
        account: Account::new(UserId::from_uuid(row.id), row.username, row.email, role),
        password_hash: row.password_hash,
    })
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn insert(&self, stored: &StoredAccount) -> Result<(), AccountRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, AccountRepositoryError::connection))?;

        let account = &stored.account;
        let row = NewAccountRow {
            id: *account.id().as_uuid(),
            username: account.username(),
            email: account.email(),
            password_hash: &stored.password_hash,
            role: account.role().as_str(),
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| insert_error(err, account.email()))
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StoredAccount>, AccountRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, AccountRepositoryError::connection))?;

        let row: Option<AccountRow> = users::table
            .filter(users::email.eq(email))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(row_to_stored).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    fn row(role: &str) -> AccountRow {
        AccountRow {
            id: Uuid::new_v4(),
            username: "ada".to_owned(),
            email: "ada@example.com".to_owned(),
            password_hash: "$argon2id$stub".to_owned(),
            role: role.to_owned(),
        }
    }

    #[rstest]
    fn row_to_stored_parses_role() {
        let stored = row_to_stored(row("instructor")).expect("valid row");
        assert_eq!(stored.account.role(), Role::Instructor);
        assert_eq!(stored.password_hash, "$argon2id$stub");
    }

    #[rstest]
    fn unknown_stored_role_is_a_query_error() {
        let err = row_to_stored(row("admin")).expect_err("corrupt row");
        assert!(matches!(err, AccountRepositoryError::Query { .. }));
    }

    #[rstest]
    fn other_failures_fall_back_to_generic_mapping() {
        let err = insert_error(DieselError::NotFound, "ada@example.com");
        assert_eq!(err, AccountRepositoryError::query("record not found"));
    }
}
