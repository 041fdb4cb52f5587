use actix_web::{HttpResponse, middleware::from_fn, web};

use crate::auth::middleware::{require_admin, require_auth};
use crate::handlers::{
    account_handlers, admin_handlers, api, auth_handlers, calendar_handlers, instructor_handlers, mypage_handlers,
};

const NOT_FOUND_PAGE: &str = include_str!("../templates/errors/404.html");

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(NOT_FOUND_PAGE)
}

/// Every application route. Public pages first; the catch-all scope that
/// follows requires a signed-in member.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Public routes
        .route("/", web::get().to(auth_handlers::home))
        .route("/login", web::get().to(auth_handlers::login_page))
        .route("/login", web::post().to(auth_handlers::login_submit))
        .route("/signup", web::get().to(auth_handlers::signup_page))
        .route("/signup", web::post().to(auth_handlers::signup_submit))
        .route("/403", web::get().to(auth_handlers::forbidden))
        // Protected routes
        .service(
            web::scope("")
                .wrap(from_fn(require_auth))
                .route("/logout", web::post().to(auth_handlers::logout))
                .route("/profile", web::get().to(account_handlers::profile))
                // Member pages
                .route("/mypage", web::get().to(mypage_handlers::index))
                .route("/mypage/calendar", web::get().to(mypage_handlers::calendar_page))
                // Calendar: /calendar/sessions/new before /calendar/sessions/{id}
                .route("/calendar", web::get().to(calendar_handlers::index))
                .route("/calendar/sessions/new", web::get().to(calendar_handlers::new_form))
                .route("/calendar/sessions", web::post().to(calendar_handlers::create))
                .route("/calendar/sessions/{id}/edit", web::get().to(calendar_handlers::edit_form))
                .route("/calendar/sessions/{id}", web::post().to(calendar_handlers::update))
                .route("/calendar/sessions/{id}/delete", web::post().to(calendar_handlers::delete))
                // Instructor tools
                .route("/instructor", web::get().to(|| async {
                    HttpResponse::SeeOther()
                        .insert_header(("Location", "/calendar"))
                        .finish()
                }))
                .route("/instructor/sessions", web::get().to(instructor_handlers::sessions_page))
                .route("/instructor/sessions", web::post().to(instructor_handlers::quick_create))
                .route("/instructor/sessions/{id}/title", web::post().to(instructor_handlers::rename))
                .route("/instructor/sessions/{id}/delete", web::post().to(instructor_handlers::delete))
                .route("/instructor/schedule", web::get().to(instructor_handlers::schedule_page))
                .route("/instructor/schedule", web::post().to(instructor_handlers::schedule_save))
                // Admin
                .service(
                    web::scope("/admin")
                        .wrap(from_fn(require_admin))
                        .route("", web::get().to(admin_handlers::index))
                        .route("/passes", web::get().to(admin_handlers::passes::grant_page))
                        .route("/passes", web::post().to(admin_handlers::passes::grant_submit))
                        .route("/bonus", web::get().to(admin_handlers::bonus::bonus_page))
                        .route("/bonus", web::post().to(admin_handlers::bonus::bonus_submit)),
                )
                // JSON API
                .service(web::scope("/api").configure(api::configure))
                .default_service(web::to(not_found)),
        );
}
