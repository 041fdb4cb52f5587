use actix_session::Session;
use actix_web::{HttpResponse, http::StatusCode, web};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::PgPool;

use super::json_error;
use crate::audit::{self, Action};
use crate::auth::session::current_user;
use crate::config::Config;
use crate::errors::AppError;
use crate::handlers::calendar_handlers::NOT_FOUND_OR_NOT_YOURS;
use crate::models::calendar::{self, MonthKey, Range};
use crate::models::class_session::{self, Scope, SessionEvent};

pub const MAX_RANGE_DAYS: i64 = 92;

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub canceled: Option<String>,
}

#[derive(Deserialize)]
pub struct TimeUpdate {
    pub start: String,
    pub end: String,
}

/// RFC 3339 timestamp, local datetime, or `YYYY-MM-DD` (local midnight).
pub fn parse_bound(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    calendar::parse_timestamp(raw, offset)
        .or_else(|| calendar::parse_date(raw).map(|d| calendar::local_midnight(d, offset)))
}

/// Requested listing window. Missing bounds default to the current month.
pub fn resolve_range(
    from: Option<&str>,
    to: Option<&str>,
    offset: FixedOffset,
    today: NaiveDate,
) -> Result<Range, String> {
    let month = calendar::month_range(MonthKey::from_date(today), offset);
    let from = match from.filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_bound(raw, offset).ok_or_else(|| format!("Invalid 'from': {raw}"))?,
        None => month.from,
    };
    let to = match to.filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_bound(raw, offset).ok_or_else(|| format!("Invalid 'to': {raw}"))?,
        None if from == month.from => month.to,
        None => from + Duration::days(31),
    };
    if to <= from {
        return Err("'to' must be after 'from'".to_string());
    }
    if to - from > Duration::days(MAX_RANGE_DAYS) {
        return Err(format!("Date range must not exceed {MAX_RANGE_DAYS} days"));
    }
    Ok(Range { from, to })
}

/// GET /api/sessions?from=&to=: events visible to the caller as JSON.
pub async fn list(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<RangeQuery>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    let offset = config.utc_offset;
    let range = match resolve_range(query.from.as_deref(), query.to.as_deref(), offset, calendar::today(offset)) {
        Ok(r) => r,
        Err(e) => return Ok(json_error(StatusCode::BAD_REQUEST, &e)),
    };
    let include_canceled = matches!(query.canceled.as_deref(), Some("1") | Some("true"));

    let rows = class_session::list_in_range(&pool, range, Scope::for_user(&user), include_canceled).await?;
    let now = Utc::now();
    let events: Vec<SessionEvent> = rows.iter().map(|s| s.to_event(now)).collect();
    Ok(HttpResponse::Ok().json(events))
}

/// POST /api/sessions/{id}/time: drag/resize from the calendar.
pub async fn update_time(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<TimeUpdate>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    if !user.can_manage_sessions() {
        return Ok(json_error(StatusCode::FORBIDDEN, "Only instructors and admins can move sessions"));
    }
    let id = path.into_inner();

    let (Some(start), Some(end)) = (
        calendar::parse_timestamp(&body.start, config.utc_offset),
        calendar::parse_timestamp(&body.end, config.utc_offset),
    ) else {
        return Ok(json_error(StatusCode::BAD_REQUEST, "start and end must be RFC 3339 timestamps"));
    };
    if end <= start {
        return Ok(json_error(StatusCode::BAD_REQUEST, "End must be after start"));
    }

    if !class_session::update_time(&pool, id, start, end, user.owner_filter()).await? {
        return Ok(json_error(StatusCode::NOT_FOUND, NOT_FOUND_OR_NOT_YOURS));
    }
    let summary = format!("{} – {}", start.to_rfc3339(), end.to_rfc3339());
    audit::log(&pool, user.id, Action::SessionMoved, id, &summary).await;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true, "id": id })))
}
