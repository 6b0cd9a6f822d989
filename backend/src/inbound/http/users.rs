//! Account and session endpoints.
//!
//! ```text
//! POST /api/v1/register {"username":"ada","email":"ada@example.com","password":"secret","role":"instructor"}
//! POST /api/v1/login {"email":"instructor@example.com","password":"password"}
//! POST /api/v1/logout
//! GET  /api/v1/users/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::domain::{
    Account, Error, LoginCredentials, LoginValidationError, Principal, Registration,
    RegistrationValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "instructor@example.com")]
    pub email: String,
    #[schema(example = "password")]
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn map_login_validation_error(err: &LoginValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": err.field(), "code": err.code() }))
}

/// Sign-up request body for `POST /api/v1/register`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "secret")]
    pub password: String,
    /// `instructor` or `student`.
    #[schema(example = "instructor")]
    pub role: String,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = RegistrationValidationError;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.email, &value.password, &value.role)
    }
}

fn map_registration_validation_error(err: &RegistrationValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": err.field(), "code": err.code() }))
}

/// Create an account. The caller still has to log in afterwards.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())
        .map_err(|err| map_registration_validation_error(&err))?;
    let account = state.registration.register(&registration).await?;
    Ok(HttpResponse::Created().json(account))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = Principal, headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<Principal>> {
    let credentials = LoginCredentials::try_from(payload.into_inner())
        .map_err(|err| map_login_validation_error(&err))?;
    let principal = state.login.authenticate(&credentials).await?;
    session.persist_principal(&principal)?;
    info!(user_id = %principal.id(), role = %principal.role(), "user logged in");
    Ok(web::Json(principal))
}

/// Drop the current session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Return the principal bound to the current session.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current principal", body = Principal),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(session: SessionContext) -> ApiResult<web::Json<Principal>> {
    session.require_principal().map(web::Json)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{AccountService, Role};
    use crate::domain::ports::{FIXTURE_INSTRUCTOR, MockCourseCommand, MockCourseQuery};
    use crate::inbound::http::test_utils::test_session_middleware;
    use crate::outbound::memory::InMemoryAccountStore;
    use crate::outbound::password::Argon2PasswordHasher;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;

    fn test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let hasher = Argon2PasswordHasher::with_cost(8, 1).expect("cheap params are valid");
        let store = InMemoryAccountStore::with_fixture_accounts(&hasher).expect("seed accounts");
        let accounts = Arc::new(AccountService::new(Arc::new(store), Arc::new(hasher)));
        let state = HttpState::new(
            accounts.clone(),
            accounts,
            Arc::new(MockCourseCommand::new()),
            Arc::new(MockCourseQuery::new()),
        );
        App::new()
            .app_data(web::Data::new(state))
            .wrap(test_session_middleware())
            .service(
                web::scope("/api/v1")
                    .service(register)
                    .service(login)
                    .service(logout)
                    .service(current_user),
            )
    }

    fn login_request(email: &str, password: &str) -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(&LoginRequest {
                email: email.into(),
                password: password.into(),
            })
    }

    fn register_request(email: &str, role: &str) -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri("/api/v1/register")
            .set_json(&RegisterRequest {
                username: "ada".into(),
                email: email.into(),
                password: "secret".into(),
                role: role.into(),
            })
    }

    #[actix_web::test]
    async fn registered_account_can_log_in() {
        let app = actix_test::init_service(test_app()).await;

        let res = actix_test::call_service(
            &app,
            register_request("Ada@Example.com", "instructor").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.get("email").and_then(Value::as_str), Some("ada@example.com"));
        assert_eq!(body.get("role").and_then(Value::as_str), Some("instructor"));
        assert!(body.get("password").is_none());
        assert!(body.get("passwordHash").is_none());

        let res = actix_test::call_service(
            &app,
            login_request("ada@example.com", "secret").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let principal: Principal = actix_test::read_body_json(res).await;
        assert_eq!(principal.role(), Role::Instructor);
    }

    #[actix_web::test]
    async fn duplicate_email_is_a_conflict() {
        let app = actix_test::init_service(test_app()).await;

        let res = actix_test::call_service(
            &app,
            register_request("instructor@example.com", "student").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CONFLICT);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.pointer("/details/field").and_then(Value::as_str), Some("email"));
        assert_eq!(body.pointer("/details/code").and_then(Value::as_str), Some("email_taken"));
    }

    #[rstest]
    #[case("admin")]
    #[case("")]
    #[actix_web::test]
    async fn unknown_role_is_rejected(#[case] role: &str) {
        let app = actix_test::init_service(test_app()).await;

        let res = actix_test::call_service(
            &app,
            register_request("ada@example.com", role).to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.pointer("/details/field").and_then(Value::as_str), Some("role"));
        assert_eq!(body.pointer("/details/code").and_then(Value::as_str), Some("invalid_role"));
    }

    #[actix_web::test]
    async fn login_then_me_returns_principal() {
        let app = actix_test::init_service(test_app()).await;

        let res = actix_test::call_service(
            &app,
            login_request("instructor@example.com", "password").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned();

        let me = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/users/me")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(me.status(), StatusCode::OK);
        let principal: Principal = actix_test::read_body_json(me).await;
        assert_eq!(principal, FIXTURE_INSTRUCTOR.principal());
    }

    #[rstest]
    #[case("", "password", "email", "empty_email")]
    #[case("instructor", "password", "email", "malformed_email")]
    #[case("instructor@example.com", "", "password", "empty_password")]
    #[actix_web::test]
    async fn login_validation_errors_name_the_field(
        #[case] email: &str,
        #[case] password: &str,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let app = actix_test::init_service(test_app()).await;

        let res = actix_test::call_service(&app, login_request(email, password).to_request()).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.pointer("/details/field").and_then(Value::as_str), Some(field));
        assert_eq!(body.pointer("/details/code").and_then(Value::as_str), Some(code));
    }

    #[actix_web::test]
    async fn wrong_password_is_unauthorised() {
        let app = actix_test::init_service(test_app()).await;

        let res = actix_test::call_service(
            &app,
            login_request("student@example.com", "nope").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn me_without_session_is_unauthorised() {
        let app = actix_test::init_service(test_app()).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/v1/users/me").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn logout_is_no_content() {
        let app = actix_test::init_service(test_app()).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post().uri("/api/v1/logout").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }
}
