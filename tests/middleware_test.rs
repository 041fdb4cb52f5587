//! Auth gate, admin gate and JSON content-type guard, exercised through the
//! real route table without a database.

use actix_session::{Session, SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::http::{StatusCode, header};
use actix_web::{App, HttpResponse, test, web};

use studio::auth::session::{CurrentUser, Roles, sign_in};
use studio::config::Config;
use studio::routes;

fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused".to_string()),
        "APP_NAME" => Some("Test Studio".to_string()),
        _ => None,
    })
    .unwrap()
}

/// Signs in member #7 with the comma-separated roles in the path.
async fn sign_in_as(session: Session, path: web::Path<String>) -> HttpResponse {
    let roles = match path.as_str() {
        "member" => Roles::default(),
        csv => Roles::from_csv(csv),
    };
    let user = CurrentUser {
        id: 7,
        email: "seven@example.com".into(),
        display_name: "Seven".into(),
        roles,
    };
    sign_in(&session, &user).unwrap();
    HttpResponse::Ok().finish()
}

macro_rules! test_app {
    () => {
        test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::new(test_config()))
                .route("/test-sign-in/{roles}", web::get().to(sign_in_as))
                .configure(routes::configure),
        )
        .await
    };
}

fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_rt::test]
async fn test_signed_out_visitor_is_sent_to_login_with_next() {
    let app = test_app!();

    let req = test::TestRequest::get().uri("/mypage").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login?next=%2Fmypage");

    let req = test::TestRequest::get().uri("/calendar?view=week&date=2030-05-06").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        location(&resp),
        "/login?next=%2Fcalendar%3Fview%3Dweek%26date%3D2030-05-06"
    );

    let req = test::TestRequest::get().uri("/admin/passes").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(location(&resp).starts_with("/login?next="));
}

#[actix_rt::test]
async fn test_public_pages_render() {
    let app = test_app!();

    for uri in ["/", "/login", "/signup"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }

    let req = test::TestRequest::get().uri("/login").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let html = String::from_utf8(body.to_vec()).unwrap();
    let token = regex::Regex::new(r#"name="csrf_token" value="([0-9a-f]+)""#)
        .unwrap()
        .captures(&html)
        .map(|c| c[1].to_string())
        .expect("csrf token in login form");
    assert_eq!(token.len(), 64);
    assert!(html.contains("Test Studio"));

    let req = test::TestRequest::get().uri("/403").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

/// Session cookie of a visitor signed in through `/test-sign-in`.
macro_rules! signed_in_cookie {
    ($app:expr, $roles:expr) => {{
        let req = test::TestRequest::get()
            .uri(&format!("/test-sign-in/{}", $roles))
            .to_request();
        let resp = test::call_service($app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie: Cookie<'static> = resp
            .response()
            .cookies()
            .next()
            .map(|c| c.into_owned())
            .expect("session cookie");
        cookie
    }};
}

#[actix_rt::test]
async fn test_member_is_turned_away_from_admin_without_database() {
    let app = test_app!();
    let cookie = signed_in_cookie!(&app, "member");

    let req = test::TestRequest::get().uri("/admin").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/403");

    let req = test::TestRequest::get().uri("/api/admin/sessions").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/403");
}

#[actix_rt::test]
async fn test_signed_in_visitor_skips_login_page() {
    let app = test_app!();
    let cookie = signed_in_cookie!(&app, "member");

    let req = test::TestRequest::get().uri("/login").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/mypage");

    let req = test::TestRequest::get()
        .uri("/login?next=%2F%2Fevil.example")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/mypage");

    let req = test::TestRequest::get()
        .uri("/login?next=%2Fcalendar")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/calendar");
}

#[actix_rt::test]
async fn test_session_time_update_requires_json() {
    let app = test_app!();
    let cookie = signed_in_cookie!(&app, "instructor");

    let req = test::TestRequest::post()
        .uri("/api/sessions/1/time")
        .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
        .set_payload("start=x&end=y")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_unknown_path_is_not_found_once_signed_in() {
    let app = test_app!();
    let cookie = signed_in_cookie!(&app, "member");

    let req = test::TestRequest::get().uri("/no/such/page").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
