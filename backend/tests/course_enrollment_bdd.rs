//! Behaviour tests for course publishing and enrolment.
//!
//! Scenarios drive the course service through its driving ports with the
//! in-memory adapters, covering the role gate, the ownership gate, and
//! idempotent joins.

use std::future::Future;
use std::sync::Arc;

use courses_backend::domain::ports::{
    CourseCommand, CourseQuery, CreateCourseRequest, FIXTURE_INSTRUCTOR, FIXTURE_STUDENT,
};
use courses_backend::domain::{
    CourseId, CourseService, Error, ErrorCode, JoinResult, LeaveResult, Principal, RetryPolicy,
    UserId,
};
use courses_backend::outbound::memory::{InMemoryAccountStore, InMemoryCourseRepository};
use courses_backend::outbound::password::Argon2PasswordHasher;
use mockable::DefaultClock;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use serde_json::Value;
use tokio::runtime::Runtime;

type Service = CourseService<InMemoryCourseRepository, InMemoryAccountStore>;

fn fixture_accounts() -> InMemoryAccountStore {
    let hasher = Argon2PasswordHasher::with_cost(8, 1).expect("cheap params are valid");
    InMemoryAccountStore::with_fixture_accounts(&hasher).expect("seed accounts")
}

#[derive(Clone)]
struct RuntimeHandle(Arc<Runtime>);

#[derive(Default, ScenarioState)]
struct CourseWorld {
    runtime: Slot<RuntimeHandle>,
    service: Slot<Arc<Service>>,
    course_id: Slot<CourseId>,
    last_join: Slot<JoinResult>,
    last_leave: Slot<LeaveResult>,
    last_error: Slot<Error>,
}

impl CourseWorld {
    fn run<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce(Arc<Service>) -> Fut,
        Fut: Future<Output = T>,
    {
        let runtime = self.runtime.get().expect("runtime");
        let service = self.service.get().expect("service");
        runtime.0.block_on(operation(service))
    }

    fn course_id(&self) -> CourseId {
        self.course_id.get().expect("a course was created")
    }

    fn create(&self, principal: Principal, title: &str) -> Result<CourseId, Error> {
        let request = CreateCourseRequest {
            title: title.to_owned(),
            description: format!("{title} for beginners"),
            price: 10.0,
            image_ref: String::new(),
        };
        self.run(|service| async move { service.create_course(&principal, request).await })
    }

    fn record_error(&self, result: Result<impl Sized, Error>) {
        match result {
            Ok(_) => panic!("expected the request to fail"),
            Err(err) => self.last_error.set(err),
        }
    }

    fn course_titles(&self, student: Option<UserId>) -> Vec<String> {
        let caller = FIXTURE_STUDENT.principal();
        let views = self
            .run(|service| async move {
                match student {
                    Some(id) => service.list_by_student(&caller, id).await,
                    None => {
                        service
                            .list_by_instructor(&caller, FIXTURE_INSTRUCTOR.id)
                            .await
                    }
                }
            })
            .expect("listing succeeds");
        views
            .iter()
            .map(|view| view.course.title().to_owned())
            .collect()
    }
}

#[fixture]
fn world() -> CourseWorld {
    CourseWorld::default()
}

#[given("an in-memory course service")]
fn an_in_memory_course_service(world: &CourseWorld) {
    let runtime = Runtime::new().expect("create runtime");
    let service = CourseService::new(
        Arc::new(InMemoryCourseRepository::new()),
        Arc::new(fixture_accounts()),
        Arc::new(DefaultClock),
        RetryPolicy::default(),
    );
    world.runtime.set(RuntimeHandle(Arc::new(runtime)));
    world.service.set(Arc::new(service));
}

fn publish_as_instructor(world: &CourseWorld, title: &str) {
    let id = world
        .create(FIXTURE_INSTRUCTOR.principal(), title)
        .expect("instructor may publish");
    world.course_id.set(id);
}

#[given("the instructor has published a course titled {title}")]
fn the_instructor_has_published_a_course(world: &CourseWorld, title: String) {
    publish_as_instructor(world, &title);
}

#[when("the instructor creates a course titled {title}")]
fn the_instructor_creates_a_course(world: &CourseWorld, title: String) {
    publish_as_instructor(world, &title);
}

#[given("another instructor owns a course titled {title}")]
fn another_instructor_owns_a_course(world: &CourseWorld, title: String) {
    let id = world
        .create(Principal::instructor(UserId::random()), &title)
        .expect("instructor may publish");
    world.course_id.set(id);
}

#[when("the student tries to create a course titled {title}")]
fn the_student_tries_to_create_a_course(world: &CourseWorld, title: String) {
    let result = world.create(FIXTURE_STUDENT.principal(), &title);
    world.record_error(result);
}

#[when("the student enrols in the course")]
fn the_student_enrols(world: &CourseWorld) {
    let course_id = world.course_id();
    let status = world
        .run(|service| async move {
            service
                .enroll(&FIXTURE_STUDENT.principal(), course_id)
                .await
        })
        .expect("student may enrol");
    world.last_join.set(status);
}

#[when("the student leaves the course")]
fn the_student_leaves(world: &CourseWorld) {
    let course_id = world.course_id();
    let status = world
        .run(|service| async move {
            service
                .unenroll(&FIXTURE_STUDENT.principal(), course_id)
                .await
        })
        .expect("student may leave");
    world.last_leave.set(status);
}

#[when("the instructor deletes the course")]
fn the_instructor_deletes_the_course(world: &CourseWorld) {
    let course_id = world.course_id();
    world
        .run(|service| async move {
            service
                .delete_course(&FIXTURE_INSTRUCTOR.principal(), course_id)
                .await
        })
        .expect("owner may delete");
}

#[when("the instructor tries to delete the course")]
fn the_instructor_tries_to_delete_the_course(world: &CourseWorld) {
    let course_id = world.course_id();
    let result = world.run(|service| async move {
        service
            .delete_course(&FIXTURE_INSTRUCTOR.principal(), course_id)
            .await
    });
    world.record_error(result);
}

#[then("listing the instructor's courses returns {title}")]
fn listing_instructor_courses(world: &CourseWorld, title: String) {
    assert_eq!(world.course_titles(None), vec![title]);
}

#[then("listing the student's courses returns {title}")]
fn listing_student_courses(world: &CourseWorld, title: String) {
    assert_eq!(world.course_titles(Some(FIXTURE_STUDENT.id)), vec![title]);
}

#[then("the student has no courses")]
fn the_student_has_no_courses(world: &CourseWorld) {
    assert!(world.course_titles(Some(FIXTURE_STUDENT.id)).is_empty());
}

#[then("the enrolment status is {status}")]
fn the_enrolment_status_is(world: &CourseWorld, status: String) {
    let observed = world.last_join.get().expect("an enrolment happened");
    assert_eq!(serde_json::to_value(observed).expect("serialise"), Value::String(status));
}

#[then("the unenrolment status is {status}")]
fn the_unenrolment_status_is(world: &CourseWorld, status: String) {
    let observed = world.last_leave.get().expect("an unenrolment happened");
    assert_eq!(serde_json::to_value(observed).expect("serialise"), Value::String(status));
}

#[then("the course has {count} student")]
fn the_course_has_students(world: &CourseWorld, count: usize) {
    let course_id = world.course_id();
    let view = world
        .run(|service| async move {
            service
                .get_course(&FIXTURE_INSTRUCTOR.principal(), course_id)
                .await
        })
        .expect("course exists");
    assert_eq!(view.course.students().len(), count);
}

#[then("fetching the course reports not found")]
fn fetching_the_course_reports_not_found(world: &CourseWorld) {
    let course_id = world.course_id();
    let err = world
        .run(|service| async move {
            service
                .get_course(&FIXTURE_STUDENT.principal(), course_id)
                .await
        })
        .expect_err("course was deleted");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[then("the request is forbidden with reason {reason}")]
fn the_request_is_forbidden(world: &CourseWorld, reason: String) {
    let err = world.last_error.get().expect("a request failed");
    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(
        err.details()
            .and_then(|details| details.get("reason"))
            .and_then(Value::as_str),
        Some(reason.as_str())
    );
}

#[scenario(
    path = "tests/features/course_enrollment.feature",
    name = "Algebra course lifecycle"
)]
fn algebra_course_lifecycle(world: CourseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/course_enrollment.feature",
    name = "Students cannot publish courses"
)]
fn students_cannot_publish_courses(world: CourseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/course_enrollment.feature",
    name = "Only the owner may delete a course"
)]
fn only_the_owner_may_delete_a_course(world: CourseWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/course_enrollment.feature",
    name = "Joining twice is idempotent"
)]
fn joining_twice_is_idempotent(world: CourseWorld) {
    let _ = world;
}
