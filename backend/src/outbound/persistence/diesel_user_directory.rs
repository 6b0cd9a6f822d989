//! PostgreSQL-backed `UserDirectory` implementation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{InstructorProfile, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::ProfileRow;
use super::pool::DbPool;
use super::schema::users;

/// Resolves instructor profiles from the `users` table.
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_profile(row: ProfileRow) -> InstructorProfile {
    InstructorProfile {
        id: UserId::from_uuid(row.id),
        username: row.username,
        email: row.email,
    }
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn find_profiles(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<InstructorProfile>, UserDirectoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserDirectoryError::connection))?;

        let wanted: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<ProfileRow> = users::table
            .filter(users::id.eq_any(wanted))
            .select(ProfileRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| {
                map_diesel_error(err, UserDirectoryError::query, UserDirectoryError::connection)
            })?;

        Ok(rows.into_iter().map(row_to_profile).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_to_profile_copies_public_fields() {
        let id = Uuid::new_v4();
        let profile = row_to_profile(ProfileRow {
            id,
            username: "ada".to_owned(),
            email: "ada@example.com".to_owned(),
        });

        assert_eq!(profile.id, UserId::from_uuid(id));
        assert_eq!(profile.username, "ada");
        assert_eq!(profile.email, "ada@example.com");
    }
}
