//! Test helpers for inbound HTTP components.

use std::sync::OnceLock;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::{App, HttpResponse, test, web};

use super::session::SessionContext;
use crate::domain::{Error, Principal};

static TEST_KEY: OnceLock<Key> = OnceLock::new();

/// Build a session middleware configured for tests.
///
/// Every middleware built here shares one process-wide key, so a cookie
/// minted by [`session_cookie`] is accepted by any test app. The `Secure`
/// flag is off for plain HTTP test requests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    let key = TEST_KEY.get_or_init(Key::generate).clone();
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Mint a session cookie for `principal`.
pub async fn session_cookie(principal: &Principal) -> Cookie<'static> {
    let principal = *principal;
    let app = test::init_service(App::new().wrap(test_session_middleware()).route(
        "/__login",
        web::post().to(move |session: SessionContext| async move {
            session.persist_principal(&principal)?;
            Ok::<_, Error>(HttpResponse::NoContent().finish())
        }),
    ))
    .await;
    let res = test::call_service(
        &app,
        test::TestRequest::post().uri("/__login").to_request(),
    )
    .await;
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}
