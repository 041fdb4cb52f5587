use actix_session::Session;
use actix_web::{HttpResponse, http::StatusCode, web};
use serde::Deserialize;
use sqlx::PgPool;

use super::json_error;
use crate::auth::session::current_user;
use crate::errors::AppError;
use crate::models::member::{self, MemberOption, SearchScope};

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Picker queries shorter than two characters return nothing.
pub fn search_term(raw: &str) -> Option<&str> {
    let q = raw.trim();
    if q.chars().count() < 2 { None } else { Some(q) }
}

/// GET /api/members/search?q=: admins search everyone, instructors their own members.
pub async fn search(
    pool: web::Data<PgPool>,
    session: Session,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    let scope = if user.is_admin() {
        SearchScope::All
    } else if user.is_instructor() {
        SearchScope::TaughtBy(user.id)
    } else {
        return Ok(json_error(StatusCode::FORBIDDEN, "Member search is for instructors and admins"));
    };

    let Some(q) = search_term(&query.q) else {
        return Ok(HttpResponse::Ok().json(Vec::<MemberOption>::new()));
    };
    let found = member::search(&pool, q, scope).await?;
    Ok(HttpResponse::Ok().json(found))
}
