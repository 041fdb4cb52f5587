pub mod admin;
pub mod members;
pub mod sessions;

use actix_web::{HttpResponse, web};

use crate::auth::middleware::{require_admin, require_json_content_type};

pub(crate) fn json_error(status: actix_web::http::StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({ "error": message }))
}

/// Configure `/api` routes. The caller wraps the scope in `require_auth`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(actix_web::middleware::from_fn(require_admin))
            .route("/sessions", web::get().to(admin::sessions)),
    );
    cfg.service(
        web::scope("/sessions")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("", web::get().to(sessions::list))
            .route("/{id}/time", web::post().to(sessions::update_time)),
    );
    cfg.service(web::scope("/members").route("/search", web::get().to(members::search)));
}
