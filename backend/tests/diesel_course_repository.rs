//! Integration tests for `DieselCourseRepository` against embedded PostgreSQL.
//!
//! Covers the behaviour the in-memory store cannot vouch for: the
//! revision-checked `UPDATE`, array containment for student listings, and
//! `ILIKE` escaping for title search.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use courses_backend::domain::ports::{
    CourseFilter, CourseRepository, CourseRepositoryError, TitleMatch, UserDirectory,
};
use courses_backend::domain::{
    Course, CourseDraft, CourseId, EnrollmentEngine, JoinResult, RetryPolicy, UserId,
};
use courses_backend::outbound::persistence::{
    DbPool, DieselCourseRepository, DieselUserDirectory, PoolConfig,
};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

mod support;

use support::{handle_cluster_setup_failure, provision_database};

struct TestContext {
    runtime: Runtime,
    pool: DbPool,
    repository: DieselCourseRepository,
    _database: TemporaryDatabase,
}

fn setup_test_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let database = provision_database()?;
    let config = PoolConfig::new(database.url().to_string()).with_max_size(4);
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;
    Ok(TestContext {
        runtime,
        repository: DieselCourseRepository::new(pool.clone()),
        pool,
        _database: database,
    })
}

#[fixture]
fn context() -> Option<TestContext> {
    match setup_test_context() {
        Ok(context) => Some(context),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn at_minute(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 10, minute, 0)
        .single()
        .expect("valid timestamp")
}

fn course(title: &str, owner: UserId, minute: u32) -> Course {
    let draft = CourseDraft::try_new(title, "", 15.0, "").expect("valid draft");
    Course::create(CourseId::random(), draft, owner, at_minute(minute))
}

fn titles(courses: &[Course]) -> Vec<&str> {
    courses.iter().map(Course::title).collect()
}

#[rstest]
fn stale_revision_is_rejected_with_the_stored_revision(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: stale_revision_is_rejected_with_the_stored_revision");
        return;
    };
    let repo = &ctx.repository;

    ctx.runtime.block_on(async {
        let stored = course("Algebra", UserId::random(), 0);
        repo.insert(&stored).await.expect("insert");

        let mut first = stored.clone();
        first.add_student(UserId::random()).expect("not the owner");
        repo.save_roster(&first, stored.revision())
            .await
            .expect("first write wins");

        let mut second = stored.clone();
        second.add_student(UserId::random()).expect("not the owner");
        let err = repo
            .save_roster(&second, stored.revision())
            .await
            .expect_err("stale revision");

        assert_eq!(
            err,
            CourseRepositoryError::revision_mismatch(stored.revision(), first.revision())
        );
        let current = repo
            .find_by_id(&stored.id())
            .await
            .expect("lookup")
            .expect("still stored");
        assert_eq!(current.students().as_slice(), first.students().as_slice());
        assert_eq!(current.revision(), first.revision());
    });
}

#[rstest]
fn save_after_delete_is_not_found(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: save_after_delete_is_not_found");
        return;
    };
    let repo = &ctx.repository;

    ctx.runtime.block_on(async {
        let mut stored = course("Algebra", UserId::random(), 0);
        repo.insert(&stored).await.expect("insert");
        assert!(repo.delete(&stored.id()).await.expect("delete"));

        let expected = stored.revision();
        stored.add_student(UserId::random()).expect("not the owner");
        let err = repo
            .save_roster(&stored, expected)
            .await
            .expect_err("course is gone");

        assert_eq!(
            err,
            CourseRepositoryError::not_found(stored.id().to_string())
        );
        assert!(!repo.delete(&stored.id()).await.expect("second delete"));
    });
}

#[rstest]
fn student_filter_matches_roster_membership(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: student_filter_matches_roster_membership");
        return;
    };
    let repo = &ctx.repository;

    ctx.runtime.block_on(async {
        let owner = UserId::random();
        let student = UserId::random();
        let classmate = UserId::random();

        let mut algebra = course("Algebra", owner, 0);
        let mut geometry = course("Geometry", owner, 1);
        let untouched = course("Topology", owner, 2);
        for stored in [&algebra, &geometry, &untouched] {
            repo.insert(stored).await.expect("insert");
        }

        let expected = algebra.revision();
        algebra.add_student(classmate).expect("not the owner");
        algebra.add_student(student).expect("not the owner");
        repo.save_roster(&algebra, expected).await.expect("save");
        let expected = geometry.revision();
        geometry.add_student(student).expect("not the owner");
        repo.save_roster(&geometry, expected).await.expect("save");

        let mine = repo
            .find_matching(&CourseFilter::Student(student))
            .await
            .expect("scan");
        let theirs = repo
            .find_matching(&CourseFilter::Student(classmate))
            .await
            .expect("scan");
        let nobody = repo
            .find_matching(&CourseFilter::Student(UserId::random()))
            .await
            .expect("scan");

        assert_eq!(titles(&mine), ["Algebra", "Geometry"]);
        assert_eq!(titles(&theirs), ["Algebra"]);
        assert!(nobody.is_empty());
        let roster = mine.first().expect("algebra listed").students().as_slice();
        assert_eq!(roster, &[classmate, student]);
    });
}

#[rstest]
fn title_search_treats_wildcards_literally(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: title_search_treats_wildcards_literally");
        return;
    };
    let repo = &ctx.repository;

    ctx.runtime.block_on(async {
        let owner = UserId::random();
        for (minute, title) in ["100% Algebra", "100 Algebra", "a_b", "axb", "C:\\Paths"]
            .into_iter()
            .enumerate()
        {
            let minute = u32::try_from(minute).expect("small index");
            repo.insert(&course(title, owner, minute))
                .await
                .expect("insert");
        }

        let search = |query: &str, mode: TitleMatch| {
            let filter = CourseFilter::Title {
                query: query.to_owned(),
                mode,
            };
            async move { repo.find_matching(&filter).await.expect("scan") }
        };

        assert_eq!(
            titles(&search("100%", TitleMatch::Contains).await),
            ["100% Algebra"]
        );
        assert_eq!(titles(&search("A_B", TitleMatch::Exact).await), ["a_b"]);
        assert_eq!(titles(&search("_", TitleMatch::Contains).await), ["a_b"]);
        assert_eq!(
            titles(&search(":\\p", TitleMatch::Contains).await),
            ["C:\\Paths"]
        );
        assert!(search("%", TitleMatch::Exact).await.is_empty());
        assert_eq!(search("algebra", TitleMatch::Contains).await.len(), 2);
    });
}

#[rstest]
fn course_outlives_a_missing_instructor_account(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: course_outlives_a_missing_instructor_account");
        return;
    };
    let repo = &ctx.repository;
    let directory = DieselUserDirectory::new(ctx.pool.clone());

    ctx.runtime.block_on(async {
        let owner = UserId::random();
        let stored = course("Orphaned", owner, 0);
        repo.insert(&stored).await.expect("no account row is required");

        let listed = repo
            .find_matching(&CourseFilter::Instructor(owner))
            .await
            .expect("scan");
        let profiles = directory.find_profiles(&[owner]).await.expect("lookup");

        assert_eq!(titles(&listed), ["Orphaned"]);
        assert!(profiles.is_empty());
    });
}

#[rstest]
fn engines_sharing_the_database_do_not_lose_joins(context: Option<TestContext>) {
    let Some(ctx) = context else {
        eprintln!("SKIP-TEST-CLUSTER: engines_sharing_the_database_do_not_lose_joins");
        return;
    };
    let repo = Arc::new(ctx.repository.clone());
    let retry = RetryPolicy::new(50, Duration::from_millis(2), Duration::from_millis(5));
    let per_engine = 4;

    ctx.runtime.block_on(async {
        let stored = course("Algebra", UserId::random(), 0);
        repo.insert(&stored).await.expect("insert");
        let course_id = stored.id();

        let engines = [
            Arc::new(EnrollmentEngine::new(Arc::clone(&repo), retry)),
            Arc::new(EnrollmentEngine::new(Arc::clone(&repo), retry)),
        ];
        let handles: Vec<_> = engines
            .iter()
            .flat_map(|engine| {
                (0..per_engine).map(move |_| {
                    let engine = Arc::clone(engine);
                    tokio::spawn(async move { engine.join(course_id, UserId::random()).await })
                })
            })
            .collect();
        for handle in handles {
            let status = handle.await.expect("task completes").expect("join succeeds");
            assert_eq!(status, JoinResult::Enrolled);
        }

        let current = repo
            .find_by_id(&course_id)
            .await
            .expect("lookup")
            .expect("course exists");
        assert_eq!(current.students().len(), 2 * per_engine);
        let joins = u32::try_from(2 * per_engine).expect("small count");
        assert_eq!(current.revision(), Course::INITIAL_REVISION + joins);
    });
}
