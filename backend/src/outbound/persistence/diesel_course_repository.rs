//! PostgreSQL-backed `CourseRepository` implementation using Diesel ORM.
//!
//! Roster updates are a single `UPDATE ... WHERE id = $1 AND revision = $2`,
//! so concurrent writers in other processes cannot overwrite each other.
//! When no row matches, a follow-up read distinguishes a stale revision from
//! a deleted course.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{CourseFilter, CourseRepository, CourseRepositoryError, TitleMatch};
use crate::domain::{Course, CourseId, CourseRecord, Price, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{CourseRow, NewCourseRow, RosterUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::courses;

/// Diesel-backed implementation of the `CourseRepository` port.
#[derive(Clone)]
pub struct DieselCourseRepository {
    pool: DbPool,
}

impl DieselCourseRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> CourseRepositoryError {
    map_pool_error(error, CourseRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> CourseRepositoryError {
    map_diesel_error(
        error,
        CourseRepositoryError::query,
        CourseRepositoryError::connection,
    )
}

fn revision_to_db(revision: u32) -> Result<i32, CourseRepositoryError> {
    i32::try_from(revision)
        .map_err(|_| CourseRepositoryError::query(format!("revision {revision} out of range")))
}

fn revision_from_db(revision: i32) -> Result<u32, CourseRepositoryError> {
    u32::try_from(revision)
        .map_err(|_| CourseRepositoryError::query(format!("stored revision {revision} is negative")))
}

/// Escape `LIKE` metacharacters so user input only matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn title_pattern(query: &str, mode: TitleMatch) -> String {
    let escaped = escape_like(query);
    match mode {
        TitleMatch::Exact => escaped,
        TitleMatch::Contains => format!("%{escaped}%"),
    }
}

/// Convert a database row into a domain course.
fn row_to_course(row: CourseRow) -> Result<Course, CourseRepositoryError> {
    let price = Price::new(row.price).map_err(|err| {
        CourseRepositoryError::query(format!("stored course {} has {err}", row.id))
    })?;
    Ok(Course::from_record(CourseRecord {
        id: CourseId::from_uuid(row.id),
        title: row.title,
        description: row.description,
        price,
        image_ref: row.image_ref,
        instructor_id: UserId::from_uuid(row.instructor_id),
        students: row.students.into_iter().map(UserId::from_uuid).collect(),
        created_at: row.created_at,
        revision: revision_from_db(row.revision)?,
    }))
}

fn student_uuids(course: &Course) -> Vec<Uuid> {
    course.students().iter().map(|id| *id.as_uuid()).collect()
}

/// Explain why a revision-checked update touched no rows.
async fn handle_roster_update_failure<C>(
    conn: &mut C,
    course_id: CourseId,
    expected_revision: u32,
) -> CourseRepositoryError
where
    C: diesel_async::AsyncConnection<Backend = diesel::pg::Pg> + Send,
{
    let current = courses::table
        .filter(courses::id.eq(course_id.as_uuid()))
        .select(courses::revision)
        .first::<i32>(conn)
        .await
        .optional()
        .map_err(diesel_error);

    match current {
        Ok(Some(actual)) => match revision_from_db(actual) {
            Ok(actual) => CourseRepositoryError::revision_mismatch(expected_revision, actual),
            Err(err) => err,
        },
        Ok(None) => CourseRepositoryError::not_found(course_id.to_string()),
        Err(err) => err,
    }
}

#[async_trait]
impl CourseRepository for DieselCourseRepository {
    async fn insert(&self, course: &Course) -> Result<(), CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let students = student_uuids(course);

        let row = NewCourseRow {
            id: *course.id().as_uuid(),
            title: course.title(),
            description: course.description(),
            price: course.price().value(),
            image_ref: course.image_ref(),
            instructor_id: *course.instructor_id().as_uuid(),
            students: &students,
            revision: revision_to_db(course.revision())?,
            created_at: course.created_at(),
        };

        diesel::insert_into(courses::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<CourseRow> = courses::table
            .filter(courses::id.eq(id.as_uuid()))
            .select(CourseRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(row_to_course).transpose()
    }

    async fn find_matching(
        &self,
        filter: &CourseFilter,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let mut query = courses::table
            .select(CourseRow::as_select())
            .order((courses::created_at.asc(), courses::id.asc()))
            .into_boxed();

        query = match filter {
            CourseFilter::All => query,
            CourseFilter::Instructor(id) => query.filter(courses::instructor_id.eq(*id.as_uuid())),
            CourseFilter::Student(id) => {
                query.filter(courses::students.contains(vec![*id.as_uuid()]))
            }
            CourseFilter::Title { query: title, mode } => {
                query.filter(courses::title.ilike(title_pattern(title, *mode)))
            }
        };

        let rows: Vec<CourseRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        rows.into_iter().map(row_to_course).collect()
    }

    async fn save_roster(
        &self,
        course: &Course,
        expected_revision: u32,
    ) -> Result<(), CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let students = student_uuids(course);

        let update = RosterUpdate {
            students: &students,
            revision: revision_to_db(course.revision())?,
        };

        let updated_rows = diesel::update(courses::table)
            .filter(
                courses::id
                    .eq(course.id().as_uuid())
                    .and(courses::revision.eq(revision_to_db(expected_revision)?)),
            )
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;

        if updated_rows == 0 {
            return Err(
                handle_roster_update_failure(&mut conn, course.id(), expected_revision).await,
            );
        }
        Ok(())
    }

    async fn delete(&self, id: &CourseId) -> Result<bool, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let deleted = diesel::delete(courses::table.filter(courses::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(deleted > 0)
    }
}
