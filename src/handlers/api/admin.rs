use actix_web::{HttpResponse, http::StatusCode, web};
use chrono::Utc;
use sqlx::PgPool;

use super::json_error;
use crate::errors::db_message;
use crate::models::class_session::{self, SessionEvent};

/// GET /api/admin/sessions: every session, newest first. Failures come back as `{"error": ...}`.
pub async fn sessions(pool: web::Data<PgPool>) -> HttpResponse {
    match class_session::list_all_desc(&pool).await {
        Ok(rows) => {
            let now = Utc::now();
            let events: Vec<SessionEvent> = rows.iter().map(|s| s.to_event(now)).collect();
            HttpResponse::Ok().json(events)
        }
        Err(e) => {
            log::error!("admin session listing failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, &db_message(&e))
        }
    }
}
