//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer (accounts,
//! courses, health), the wire schemas they exchange, and the session cookie
//! security scheme. Swagger UI serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    Account, Error, ErrorCode, InstructorProfile, JoinResult, LeaveResult, Principal, Role,
};
use crate::inbound::http::courses::{
    CourseResponse, CreateCourseBody, CreatedResponse, EnrollResponse, MessageResponse,
    UnenrollResponse,
};
use crate::inbound::http::users::{LoginRequest, RegisterRequest};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Courses backend API",
        description = "Course publishing and enrolment for instructors and students."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::courses::create_course,
        crate::inbound::http::courses::list_courses,
        crate::inbound::http::courses::list_by_instructor,
        crate::inbound::http::courses::list_by_student,
        crate::inbound::http::courses::find_by_name,
        crate::inbound::http::courses::get_course,
        crate::inbound::http::courses::enroll,
        crate::inbound::http::courses::unenroll,
        crate::inbound::http::courses::delete_course,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Principal,
        Role,
        InstructorProfile,
        Account,
        LoginRequest,
        RegisterRequest,
        CreateCourseBody,
        CreatedResponse,
        CourseResponse,
        EnrollResponse,
        UnenrollResponse,
        MessageResponse,
        JoinResult,
        LeaveResult,
    )),
    tags(
        (name = "users", description = "Account and session endpoints"),
        (name = "courses", description = "Course publishing and enrolment"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn schema_named<'a>(doc: &'a utoipa::openapi::OpenApi, name: &str) -> &'a RefOr<Schema> {
        let components = doc.components.as_ref().expect("components");
        components
            .schemas
            .iter()
            .find(|(key, _)| key.rsplit(['.', ':']).next() == Some(name))
            .map(|(_, schema)| schema)
            .unwrap_or_else(|| panic!("schema {name} registered"))
    }

    fn assert_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => assert!(
                obj.properties.contains_key(field),
                "schema should have field '{field}'"
            ),
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/v1/register")]
    #[case("/api/v1/login")]
    #[case("/api/v1/courses")]
    #[case("/api/v1/courses/findByName/{name}")]
    #[case("/api/v1/courses/enroll/{course_id}")]
    #[case("/health/ready")]
    fn documents_path(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[test]
    fn course_schema_uses_camel_case_fields() {
        let doc = ApiDoc::openapi();
        let course = schema_named(&doc, "CourseResponse");

        for field in ["id", "imageRef", "instructorId", "instructor", "students", "createdAt"] {
            assert_has_field(course, field);
        }
    }

    #[test]
    fn error_schema_has_code_and_message() {
        let doc = ApiDoc::openapi();
        let error = schema_named(&doc, "Error");

        assert_has_field(error, "code");
        assert_has_field(error, "message");
    }

    #[test]
    fn session_cookie_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.as_ref().expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
