//! Course API handlers.
//!
//! ```text
//! POST   /api/v1/courses                       create (instructor)
//! GET    /api/v1/courses                       list all
//! GET    /api/v1/courses/instructor/{id}       list by owner
//! GET    /api/v1/courses/student/{id}          list by enrolled student
//! GET    /api/v1/courses/findByName/{name}     title search (?mode=exact|contains)
//! GET    /api/v1/courses/{id}                  single course or null
//! POST   /api/v1/courses/enroll/{id}           join (student)
//! DELETE /api/v1/courses/enroll/{id}           leave (student)
//! DELETE /api/v1/courses/{id}                  delete (owning instructor)
//! ```
//!
//! Every route requires a session. Handlers only translate between JSON and
//! the course driving ports; a few status codes are adjusted here to keep
//! the wire contract existing clients rely on.

use actix_web::{HttpResponse, delete, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CourseView, CreateCourseRequest, TitleMatch};
use crate::domain::{
    CourseId, Error, ErrorCode, InstructorProfile, JoinResult, LeaveResult, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{missing_field_error, parse_course_id, parse_user_id};

/// Course creation body for `POST /api/v1/courses`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseBody {
    #[schema(example = "Algebra I")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[schema(example = 49.5)]
    pub price: Option<f64>,
    /// Opaque media reference; may be empty.
    #[serde(default)]
    pub image_ref: String,
}

impl TryFrom<CreateCourseBody> for CreateCourseRequest {
    type Error = Error;

    fn try_from(body: CreateCourseBody) -> Result<Self, Self::Error> {
        let CreateCourseBody {
            title,
            description,
            price,
            image_ref,
        } = body;
        Ok(Self {
            title: title.ok_or_else(|| missing_field_error("title"))?,
            description,
            price: price.ok_or_else(|| missing_field_error("price"))?,
            image_ref,
        })
    }
}

/// Response for a newly created course.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub id: CourseId,
    #[schema(example = "course created")]
    pub message: String,
}

/// Wire representation of a course.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_ref: String,
    pub instructor_id: UserId,
    /// Owner profile; `null` when the account no longer exists.
    pub instructor: Option<InstructorProfile>,
    pub students: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl From<CourseView> for CourseResponse {
    fn from(view: CourseView) -> Self {
        let CourseView { course, instructor } = view;
        Self {
            id: course.id(),
            title: course.title().to_owned(),
            description: course.description().to_owned(),
            price: course.price().value(),
            image_ref: course.image_ref().to_owned(),
            instructor_id: course.instructor_id(),
            instructor,
            students: course.students().as_slice().to_vec(),
            created_at: course.created_at(),
        }
    }
}

fn into_responses(views: Vec<CourseView>) -> web::Json<Vec<CourseResponse>> {
    web::Json(views.into_iter().map(CourseResponse::from).collect())
}

/// Outcome of a join request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrollResponse {
    #[schema(example = "enrolled")]
    pub status: JoinResult,
}

/// Outcome of a leave request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnenrollResponse {
    #[schema(example = "unenrolled")]
    pub status: LeaveResult,
}

/// Plain confirmation message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "course deleted")]
    pub message: String,
}

/// Query string for title search.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TitleSearchParams {
    /// `exact` (default) or `contains`; both ignore case.
    pub mode: Option<String>,
}

fn parse_title_mode(mode: Option<&str>) -> Result<TitleMatch, Error> {
    match mode {
        None | Some("exact") => Ok(TitleMatch::Exact),
        Some("contains") => Ok(TitleMatch::Contains),
        Some(other) => Err(
            Error::invalid_request(format!("mode must be `exact` or `contains`, got `{other}`"))
                .with_details(json!({ "field": "mode", "code": "invalid_mode" })),
        ),
    }
}

/// Publish a new course owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CreateCourseBody,
    responses(
        (status = 200, description = "Course created", body = CreatedResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not an instructor", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "createCourse"
)]
#[post("/courses")]
pub async fn create_course(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateCourseBody>,
) -> ApiResult<web::Json<CreatedResponse>> {
    let principal = session.require_principal()?;
    let request = CreateCourseRequest::try_from(payload.into_inner())?;
    let id = state.courses.create_course(&principal, request).await?;
    Ok(web::Json(CreatedResponse {
        id,
        message: "course created".to_owned(),
    }))
}

/// List every course.
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    responses(
        (status = 200, description = "Courses", body = [CourseResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "listCourses"
)]
#[get("/courses")]
pub async fn list_courses(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<CourseResponse>>> {
    let principal = session.require_principal()?;
    state
        .courses_query
        .list_all(&principal)
        .await
        .map(into_responses)
}

/// List courses owned by an instructor.
#[utoipa::path(
    get,
    path = "/api/v1/courses/instructor/{instructor_id}",
    params(("instructor_id" = String, Path, description = "Instructor id")),
    responses(
        (status = 200, description = "Courses", body = [CourseResponse]),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "listCoursesByInstructor"
)]
#[get("/courses/instructor/{instructor_id}")]
pub async fn list_by_instructor(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<CourseResponse>>> {
    let principal = session.require_principal()?;
    let instructor_id = parse_user_id(&path, "instructorId")?;
    state
        .courses_query
        .list_by_instructor(&principal, instructor_id)
        .await
        .map(into_responses)
}

/// List courses a student is enrolled in.
#[utoipa::path(
    get,
    path = "/api/v1/courses/student/{student_id}",
    params(("student_id" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "Courses", body = [CourseResponse]),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "listCoursesByStudent"
)]
#[get("/courses/student/{student_id}")]
pub async fn list_by_student(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<CourseResponse>>> {
    let principal = session.require_principal()?;
    let student_id = parse_user_id(&path, "studentId")?;
    state
        .courses_query
        .list_by_student(&principal, student_id)
        .await
        .map(into_responses)
}

/// Find courses by title.
#[utoipa::path(
    get,
    path = "/api/v1/courses/findByName/{name}",
    params(("name" = String, Path, description = "Title to match"), TitleSearchParams),
    responses(
        (status = 200, description = "Matching courses", body = [CourseResponse]),
        (status = 400, description = "Invalid mode", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "findCoursesByName"
)]
#[get("/courses/findByName/{name}")]
pub async fn find_by_name(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<TitleSearchParams>,
) -> ApiResult<web::Json<Vec<CourseResponse>>> {
    let principal = session.require_principal()?;
    let mode = parse_title_mode(query.mode.as_deref())?;
    state
        .courses_query
        .find_by_title(&principal, &path, mode)
        .await
        .map(into_responses)
}

/// Fetch one course; responds with `null` when it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}",
    params(("course_id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course, or null when absent", body = Option<CourseResponse>),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "getCourse"
)]
#[get("/courses/{course_id}")]
pub async fn get_course(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Option<CourseResponse>>> {
    let principal = session.require_principal()?;
    let course_id = parse_course_id(&path)?;
    match state.courses_query.get_course(&principal, course_id).await {
        Ok(view) => Ok(web::Json(Some(CourseResponse::from(view)))),
        Err(err) if err.code() == ErrorCode::NotFound => Ok(web::Json(None)),
        Err(err) => Err(err),
    }
}

/// Enrol the calling student.
#[utoipa::path(
    post,
    path = "/api/v1/courses/enroll/{course_id}",
    params(("course_id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Enrolled or already enrolled", body = EnrollResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not a student", body = Error),
        (status = 404, description = "Course not found", body = Error),
        (status = 503, description = "Roster busy; retry", body = Error)
    ),
    tags = ["courses"],
    operation_id = "enrollInCourse"
)]
#[post("/courses/enroll/{course_id}")]
pub async fn enroll(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<EnrollResponse>> {
    let principal = session.require_principal()?;
    let course_id = parse_course_id(&path)?;
    let status = state.courses.enroll(&principal, course_id).await?;
    Ok(web::Json(EnrollResponse { status }))
}

/// Remove the calling student from a course.
///
/// Leaving a course the caller is not enrolled in answers `404`.
#[utoipa::path(
    delete,
    path = "/api/v1/courses/enroll/{course_id}",
    params(("course_id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Unenrolled", body = UnenrollResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller is not a student", body = Error),
        (status = 404, description = "Course missing or caller not enrolled", body = Error),
        (status = 503, description = "Roster busy; retry", body = Error)
    ),
    tags = ["courses"],
    operation_id = "unenrollFromCourse"
)]
#[delete("/courses/enroll/{course_id}")]
pub async fn unenroll(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UnenrollResponse>> {
    let principal = session.require_principal()?;
    let course_id = parse_course_id(&path)?;
    match state.courses.unenroll(&principal, course_id).await? {
        LeaveResult::Unenrolled => Ok(web::Json(UnenrollResponse {
            status: LeaveResult::Unenrolled,
        })),
        LeaveResult::NotEnrolled => Err(Error::not_found("not enrolled in this course")
            .with_details(json!({
                "courseId": course_id.to_string(),
                "code": "not_enrolled",
            }))),
    }
}

/// Delete a course owned by the caller.
///
/// A missing course answers `400` rather than `404`.
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{course_id}",
    params(("course_id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course deleted", body = MessageResponse),
        (status = 400, description = "Invalid id or course not found", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Wrong role or not the owner", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "deleteCourse"
)]
#[delete("/courses/{course_id}")]
pub async fn delete_course(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let principal = session.require_principal()?;
    let course_id = parse_course_id(&path)?;
    state
        .courses
        .delete_course(&principal, course_id)
        .await
        .map_err(|err| {
            if err.code() != ErrorCode::NotFound {
                return err;
            }
            let invalid = Error::invalid_request(err.message());
            match err.details() {
                Some(details) => invalid.with_details(details.clone()),
                None => invalid,
            }
        })?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "course deleted".to_owned(),
    }))
}

/// Register every course route on `cfg`.
///
/// Fixed-prefix routes are registered before `/courses/{course_id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_course)
        .service(list_courses)
        .service(list_by_instructor)
        .service(list_by_student)
        .service(find_by_name)
        .service(enroll)
        .service(unenroll)
        .service(get_course)
        .service(delete_course);
}
