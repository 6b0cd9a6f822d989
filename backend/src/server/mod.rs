//! Server construction and middleware wiring.

mod config;

pub use config::{ServerConfig, ServerSettings};

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::info;

use courses_backend::Trace;
#[cfg(debug_assertions)]
use courses_backend::doc::ApiDoc;
use courses_backend::domain::ports::{
    AccountRepository, CourseRepository, PasswordHashError, PasswordHasher, UserDirectory,
};
use courses_backend::domain::{AccountService, CourseService, RetryPolicy};
use courses_backend::inbound::http::courses;
use courses_backend::inbound::http::health::{HealthState, live, ready};
use courses_backend::inbound::http::state::HttpState;
use courses_backend::inbound::http::users::{current_user, login, logout, register};
use courses_backend::outbound::memory::{InMemoryAccountStore, InMemoryCourseRepository};
use courses_backend::outbound::password::Argon2PasswordHasher;
use courses_backend::outbound::persistence::{
    DbPool, DieselAccountRepository, DieselCourseRepository, DieselUserDirectory,
};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn wire_http_state<R, A, D>(
    repo: R,
    accounts: Arc<A>,
    directory: Arc<D>,
    hasher: Arc<dyn PasswordHasher>,
    retry: RetryPolicy,
) -> HttpState
where
    R: CourseRepository + 'static,
    A: AccountRepository + 'static,
    D: UserDirectory + 'static,
{
    let account_service = Arc::new(AccountService::new(accounts, hasher));
    let course_service = Arc::new(CourseService::new(
        Arc::new(repo),
        directory,
        Arc::new(DefaultClock),
        retry,
    ));
    HttpState::new(
        account_service.clone(),
        account_service,
        course_service.clone(),
        course_service,
    )
}

/// Wire the services to PostgreSQL when a pool is configured, otherwise to
/// the in-memory adapters seeded with the development accounts.
///
/// # Errors
/// Fails when the development account passwords cannot be hashed.
fn build_http_state(
    db_pool: Option<&DbPool>,
    retry: RetryPolicy,
) -> Result<HttpState, PasswordHashError> {
    let hasher = Arc::new(Argon2PasswordHasher::default());
    match db_pool {
        Some(pool) => {
            info!("using PostgreSQL course and account stores");
            Ok(wire_http_state(
                DieselCourseRepository::new(pool.clone()),
                Arc::new(DieselAccountRepository::new(pool.clone())),
                Arc::new(DieselUserDirectory::new(pool.clone())),
                hasher,
                retry,
            ))
        }
        None => {
            info!("using in-memory course and account stores");
            let accounts = Arc::new(InMemoryAccountStore::with_fixture_accounts(hasher.as_ref())?);
            Ok(wire_http_state(
                InMemoryCourseRepository::new(),
                Arc::clone(&accounts),
                accounts,
                hasher,
                retry,
            ))
        }
    }
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let api = web::scope("/api/v1")
        .wrap(session)
        .service(register)
        .service(login)
        .service(logout)
        .service(current_user)
        .configure(courses::configure);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct the Actix HTTP server.
///
/// Readiness flips to healthy once the socket is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails or the
/// development accounts cannot be seeded.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        db_pool,
        retry,
    } = config;
    let http_state = web::Data::new(
        build_http_state(db_pool.as_ref(), retry).map_err(std::io::Error::other)?,
    );
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "server listening");
    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    fn deps() -> AppDependencies {
        let health_state = web::Data::new(HealthState::new());
        health_state.mark_ready();
        AppDependencies {
            health_state,
            http_state: web::Data::new(
                build_http_state(None, RetryPolicy::default()).expect("in-memory state"),
            ),
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        }
    }

    #[actix_web::test]
    async fn instructor_can_log_in_and_publish() {
        let app = test::init_service(build_app(deps())).await;

        let login_res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(json!({ "email": "instructor@example.com", "password": "password" }))
                .to_request(),
        )
        .await;
        assert_eq!(login_res.status(), StatusCode::OK);
        let cookie = login_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned();

        let create_res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/courses")
                .cookie(cookie.clone())
                .set_json(json!({ "title": "Algebra", "price": 10.0 }))
                .to_request(),
        )
        .await;
        assert_eq!(create_res.status(), StatusCode::OK);
        assert!(create_res.headers().contains_key("trace-id"));

        let list_res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/courses")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(list_res).await;
        assert_eq!(
            body.pointer("/0/instructor/username").and_then(Value::as_str),
            Some("instructor")
        );
    }

    #[actix_web::test]
    async fn registered_instructor_can_publish_under_their_name() {
        let app = test::init_service(build_app(deps())).await;

        let register_res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/register")
                .set_json(json!({
                    "username": "grace",
                    "email": "grace@example.com",
                    "password": "hopper",
                    "role": "instructor"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(register_res.status(), StatusCode::CREATED);

        let login_res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(json!({ "email": "grace@example.com", "password": "hopper" }))
                .to_request(),
        )
        .await;
        assert_eq!(login_res.status(), StatusCode::OK);
        let cookie = login_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned();

        let create_res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/courses")
                .cookie(cookie.clone())
                .set_json(json!({ "title": "Compilers", "price": 0.0 }))
                .to_request(),
        )
        .await;
        assert_eq!(create_res.status(), StatusCode::OK);

        let list_res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/courses")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(list_res).await;
        assert_eq!(
            body.pointer("/0/instructor/username").and_then(Value::as_str),
            Some("grace")
        );
    }

    #[actix_web::test]
    async fn health_probes_are_mounted_outside_the_api_scope() {
        let app = test::init_service(build_app(deps())).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/health/ready").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
    }
}
