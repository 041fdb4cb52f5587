//! End-to-end walk through the web layer: sign-up, pass grant, lesson
//! booking and the member's views of both.

mod common;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};

use studio::auth::rate_limit::RateLimiter;
use studio::config::Config;
use studio::models::class_session::{self, SessionStatus, SessionWrite};
use studio::models::{member, pass};
use studio::routes;

use chrono::{Duration, TimeZone, Utc};
use common::{TEST_PASS, create_instructor, create_member, setup_test_db};

fn csrf_token(html: &str) -> String {
    regex::Regex::new(r#"name="csrf_token" value="([0-9a-f]+)""#)
        .unwrap()
        .captures(html)
        .map(|c| c[1].to_string())
        .expect("csrf token in page")
}

/// GET a form page; returns its session cookie and CSRF token.
macro_rules! open_form {
    ($app:expr, $uri:expr) => {{
        let resp = test::call_service($app, test::TestRequest::get().uri($uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", $uri);
        let cookie: Cookie<'static> = resp
            .response()
            .cookies()
            .next()
            .map(|c| c.into_owned())
            .expect("session cookie");
        let body = test::read_body(resp).await;
        let token = csrf_token(std::str::from_utf8(&body).unwrap());
        (cookie, token)
    }};
}

/// Sign in through the login form; returns the renewed cookie and token.
macro_rules! sign_in {
    ($app:expr, $email:expr, $password:expr) => {{
        let (cookie, token) = open_form!($app, "/login");
        let req = test::TestRequest::post()
            .uri("/login")
            .cookie(cookie)
            .set_form([("email", $email), ("password", $password), ("csrf_token", token.as_str())])
            .to_request();
        let resp = test::call_service($app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/mypage");
        let cookie: Cookie<'static> = resp
            .response()
            .cookies()
            .next()
            .map(|c| c.into_owned())
            .expect("renewed session cookie");
        (cookie, token)
    }};
}

macro_rules! get_html {
    ($app:expr, $uri:expr, $cookie:expr) => {{
        let req = test::TestRequest::get().uri($uri).cookie($cookie.clone()).to_request();
        let resp = test::call_service($app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", $uri);
        let body = test::read_body(resp).await;
        String::from_utf8(body.to_vec()).unwrap()
    }};
}

/// The full route table over `pool`, with a fresh session key and limiter.
macro_rules! studio_app {
    ($pool:expr) => {{
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://unused".to_string()),
            _ => None,
        })
        .unwrap();
        test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(config))
                .app_data(web::Data::new(RateLimiter::new()))
                .configure(routes::configure),
        )
        .await
    }};
}

macro_rules! get_json {
    ($app:expr, $uri:expr, $cookie:expr) => {{
        let req = test::TestRequest::get().uri($uri).cookie($cookie.clone()).to_request();
        let resp = test::call_service($app, req).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        (status, json)
    }};
}

async fn book(pool: &sqlx::PgPool, title: &str, instructor: i64, member: Option<i64>) -> i64 {
    let starts_at = Utc.with_ymd_and_hms(2030, 5, 10, 1, 0, 0).unwrap();
    class_session::create(
        pool,
        &SessionWrite {
            title: title.to_string(),
            starts_at,
            ends_at: Some(starts_at + Duration::minutes(50)),
            status: SessionStatus::Scheduled,
            location: None,
            memo: None,
            instructor_id: Some(instructor),
            member_id: member,
        },
    )
    .await
    .unwrap()
}

#[actix_rt::test]
async fn test_signup_grant_and_booking_flow() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool().clone();

    create_member(&pool, "admin@example.com", "Admin", "admin").await;
    create_instructor(&pool, "yui@example.com", "Yui").await;

    let app = studio_app!(pool);

    // A new member signs up and lands on an empty my page.
    let (cookie, token) = open_form!(&app, "/signup");
    let req = test::TestRequest::post()
        .uri("/signup")
        .cookie(cookie)
        .set_form([
            ("email", "mia@example.com"),
            ("name", "Mia"),
            ("password", "long enough pw"),
            ("csrf_token", token.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/mypage");
    let mia_cookie: Cookie<'static> = resp.response().cookies().next().map(|c| c.into_owned()).unwrap();

    let html = get_html!(&app, "/mypage", mia_cookie);
    assert!(html.contains("Hello, Mia"));
    assert!(html.contains("No passes granted yet"));
    assert!(html.contains("Your account is ready"));

    let mia = member::id_by_email(&pool, "mia@example.com").await.unwrap().unwrap();

    // The admin grants her eight sessions.
    let (admin_cookie, admin_token) = sign_in!(&app, "admin@example.com", TEST_PASS);
    let html = get_html!(&app, "/admin/passes", admin_cookie);
    assert!(html.contains("mia@example.com"));

    let member_field = mia.to_string();
    let req = test::TestRequest::post()
        .uri("/admin/passes")
        .cookie(admin_cookie.clone())
        .set_form([
            ("member_id", member_field.as_str()),
            ("base_sessions", "8"),
            ("csrf_token", admin_token.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let balance = pass::balance_for(&pool, mia).await.unwrap().unwrap();
    assert_eq!(balance.remaining, 8);
    let html = get_html!(&app, "/mypage", mia_cookie);
    assert!(html.contains("<strong>8</strong> / 8"));
    assert!(html.contains("8 + 0 + 0 = 8"));

    // The instructor books a lesson for her.
    let (yui_cookie, yui_token) = sign_in!(&app, "yui@example.com", TEST_PASS);
    let req = test::TestRequest::post()
        .uri("/instructor/sessions")
        .cookie(yui_cookie.clone())
        .set_form([
            ("title", "Lesson with Mia"),
            ("start_at", "2030-05-03T10:00"),
            ("end_at", "2030-05-03T10:50"),
            ("member", "mia@example.com"),
            ("csrf_token", yui_token.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/instructor/sessions?month=2030-05"
    );

    let req = test::TestRequest::get()
        .uri("/api/sessions?from=2030-05-01&to=2030-06-01")
        .cookie(yui_cookie.clone())
        .to_request();
    let events: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["title"], "Lesson with Mia");
    assert_eq!(events[0]["member_id"], mia);

    let html = get_html!(&app, "/mypage/calendar?month=2030-05", mia_cookie);
    assert!(html.contains("Lesson with Mia"));

    // Members cannot open the session editor.
    let req = test::TestRequest::get()
        .uri("/calendar/sessions/new")
        .cookie(mia_cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/403");

    db.teardown().await;
}

#[actix_rt::test]
async fn test_wrong_password_is_rejected() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool().clone();
    create_member(&pool, "ken@example.com", "Ken", "member").await;

    let app = studio_app!(pool);

    let (cookie, token) = open_form!(&app, "/login");
    let req = test::TestRequest::post()
        .uri("/login")
        .cookie(cookie)
        .set_form([("email", "ken@example.com"), ("password", "nope"), ("csrf_token", token.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("Invalid e-mail or password"));

    db.teardown().await;
}

#[actix_rt::test]
async fn test_member_search_is_gated_by_role() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool().clone();
    create_member(&pool, "ken@example.com", "Ken", "member").await;
    let yui = create_instructor(&pool, "yui@example.com", "Yui").await;
    let mia = create_member(&pool, "mia@example.com", "Mia", "member").await;
    book(&pool, "Lesson with Mia", yui, Some(mia)).await;
    let app = studio_app!(pool);

    let (ken_cookie, _) = sign_in!(&app, "ken@example.com", TEST_PASS);
    let (status, _) = get_json!(&app, "/api/members/search?q=ab", ken_cookie);
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (yui_cookie, _) = sign_in!(&app, "yui@example.com", TEST_PASS);
    let (status, found) = get_json!(&app, "/api/members/search?q=m", yui_cookie);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found, serde_json::json!([]));

    let (status, found) = get_json!(&app, "/api/members/search?q=mi", yui_cookie);
    assert_eq!(status, StatusCode::OK);
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], mia);

    db.teardown().await;
}

#[actix_rt::test]
async fn test_session_listing_is_scoped_to_the_caller() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool().clone();
    create_member(&pool, "admin@example.com", "Admin", "admin").await;
    let yui = create_instructor(&pool, "yui@example.com", "Yui").await;
    let rin = create_instructor(&pool, "rin@example.com", "Rin").await;
    let mia = create_member(&pool, "mia@example.com", "Mia", "member").await;
    let mias = book(&pool, "Yui and Mia", yui, Some(mia)).await;
    let open = book(&pool, "Yui open class", yui, None).await;
    let rins = book(&pool, "Rin open class", rin, None).await;
    let app = studio_app!(pool);

    let ids = |events: &serde_json::Value| -> Vec<i64> {
        let mut ids: Vec<i64> = events
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_i64().unwrap())
            .collect();
        ids.sort();
        ids
    };
    let uri = "/api/sessions?from=2030-05-01&to=2030-06-01";

    let (cookie, _) = sign_in!(&app, "yui@example.com", TEST_PASS);
    let (status, events) = get_json!(&app, uri, cookie);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&events), vec![mias, open]);

    let (cookie, _) = sign_in!(&app, "mia@example.com", TEST_PASS);
    let (_, events) = get_json!(&app, uri, cookie);
    assert_eq!(ids(&events), vec![mias]);

    let (cookie, _) = sign_in!(&app, "admin@example.com", TEST_PASS);
    let (_, events) = get_json!(&app, uri, cookie);
    assert_eq!(ids(&events), vec![mias, open, rins]);

    let (status, _) = get_json!(&app, "/api/sessions?from=%2B262142-12-31", cookie);
    assert_eq!(status, StatusCode::BAD_REQUEST);

    db.teardown().await;
}

#[actix_rt::test]
async fn test_sixth_failed_login_is_locked_out() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool().clone();
    create_member(&pool, "ken@example.com", "Ken", "member").await;
    let app = studio_app!(pool);

    let (cookie, token) = open_form!(&app, "/login");
    let attempt = |password: &'static str| {
        test::TestRequest::post()
            .uri("/login")
            .cookie(cookie.clone())
            .set_form([("email", "ken@example.com"), ("password", password), ("csrf_token", token.as_str())])
            .to_request()
    };

    for _ in 0..5 {
        let resp = test::call_service(&app, attempt("nope")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("Invalid e-mail or password"));
    }

    // Locked out even with the right password.
    let resp = test::call_service(&app, attempt(TEST_PASS)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("Too many failed sign-in attempts"));

    db.teardown().await;
}

#[actix_rt::test]
async fn test_promotion_after_sign_in_is_cached() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool().clone();
    let ken = create_member(&pool, "ken@example.com", "Ken", "member").await;
    let app = studio_app!(pool);

    let (cookie, _) = sign_in!(&app, "ken@example.com", TEST_PASS);
    let req = test::TestRequest::get().uri("/admin").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/403");

    member::set_role(&pool, ken, "admin").await.unwrap();
    let req = test::TestRequest::get().uri("/admin").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let refreshed: Cookie<'static> = resp
        .response()
        .cookies()
        .next()
        .map(|c| c.into_owned())
        .expect("cookie with cached roles");

    // The refreshed cookie carries the admin role without another lookup.
    member::set_role(&pool, ken, "member").await.unwrap();
    let req = test::TestRequest::get().uri("/admin").cookie(refreshed).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    db.teardown().await;
}
