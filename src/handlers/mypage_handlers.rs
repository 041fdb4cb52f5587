use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::session::current_user;
use crate::config::Config;
use crate::errors::{AppError, render};
use crate::models::calendar::{self, MonthKey, WEEKDAY_NAMES};
use crate::models::class_session::{self, MemberCalendarEvent};
use crate::models::pass;
use crate::templates_structs::{GrantView, MemberCalendarTemplate, MemberEventView, MyPageTemplate, PageContext};

#[derive(Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

/// GET /mypage: balance and grant history.
pub async fn index(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    let balance = pass::balance_for(&pool, user.id).await?;
    let grants = pass::grants_for(&pool, user.id)
        .await?
        .iter()
        .map(|g| {
            let created = calendar::format_local(g.created_at, config.utc_offset, "%Y-%m-%d %H:%M");
            GrantView::from_record(g, created)
        })
        .collect();

    let ctx = PageContext::for_user(&session, &config, &user, "/mypage");
    render(MyPageTemplate { ctx, balance, grants })
}

/// GET /mypage/calendar: booked sessions on a month grid plus the upcoming list.
pub async fn calendar_page(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    let offset = config.utc_offset;
    let today = calendar::today(offset);
    let key = MonthKey::from_query(query.month.as_deref(), today);

    let rows = class_session::member_calendar(&pool, user.id, calendar::grid_range(key, offset)).await?;
    let now = Utc::now();
    let events: Vec<MemberEventView> = rows.iter().map(|e| event_view(e, &config, now)).collect();
    let weeks = calendar::month_grid(key, &events, |e| e.date, today);
    let upcoming = events
        .iter()
        .filter(|e| !e.past && key.contains(e.date))
        .cloned()
        .collect();

    let ctx = PageContext::for_user(&session, &config, &user, "/mypage/calendar");
    render(MemberCalendarTemplate {
        ctx,
        month_label: key.label(),
        prev_href: format!("/mypage/calendar?month={}", key.prev().label()),
        next_href: format!("/mypage/calendar?month={}", key.next().label()),
        today_href: "/mypage/calendar".to_string(),
        weekday_names: WEEKDAY_NAMES,
        weeks,
        upcoming,
    })
}

fn event_view(e: &MemberCalendarEvent, config: &Config, now: chrono::DateTime<Utc>) -> MemberEventView {
    let offset = config.utc_offset;
    MemberEventView {
        id: e.event_id,
        title: e.title.clone(),
        date: calendar::local_date(e.starts_at, offset),
        date_label: calendar::format_local(e.starts_at, offset, "%m/%d (%a)"),
        time_range: format!(
            "{}–{}",
            calendar::format_local(e.starts_at, offset, "%H:%M"),
            calendar::format_local(e.ends_at, offset, "%H:%M")
        ),
        instructor_name: e.instructor_name.clone().unwrap_or_default(),
        memo: e.memo.clone().unwrap_or_default(),
        status: e.status.clone(),
        past: e.ends_at < now,
    }
}
