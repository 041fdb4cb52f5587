use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::session::current_user;
use crate::config::Config;
use crate::errors::{AppError, render};
use crate::models::calendar::{self, MonthKey, ViewMode, WEEKDAY_NAMES};
use crate::models::class_session::{self, Scope, SessionView};
use crate::templates_structs::{CalendarTemplate, DayColumn, PageContext};

#[derive(Deserialize)]
pub struct CalendarQuery {
    pub view: Option<String>,
    pub month: Option<String>,
    pub date: Option<String>,
    pub canceled: Option<String>,
}

impl CalendarQuery {
    pub fn show_canceled(&self) -> bool {
        matches!(self.canceled.as_deref(), Some("1") | Some("true") | Some("on"))
    }
}

/// `/calendar` link that keeps the view and canceled toggle.
pub fn calendar_href(view: ViewMode, key: MonthKey, anchor: NaiveDate, canceled: bool) -> String {
    let mut href = match view {
        ViewMode::Month => format!("/calendar?view=month&month={}", key.label()),
        _ => format!("/calendar?view={}&date={}", view.as_str(), anchor.format("%Y-%m-%d")),
    };
    if canceled {
        href.push_str("&canceled=1");
    }
    href
}

/// Month and anchor day a request addresses. A `?date=` in week/day view
/// moves the month along with it.
pub fn resolve_position(view: ViewMode, q: &CalendarQuery, today: NaiveDate) -> (MonthKey, NaiveDate) {
    let key = MonthKey::from_query(q.month.as_deref(), today);
    let anchor = calendar::anchor_date(key, q.date.as_deref(), today);
    match view {
        ViewMode::Month => (key, anchor),
        _ => (MonthKey::from_date(anchor), anchor),
    }
}

/// Previous and next positions for the arrows.
pub fn neighbours(view: ViewMode, key: MonthKey, anchor: NaiveDate) -> ((MonthKey, NaiveDate), (MonthKey, NaiveDate)) {
    match view {
        ViewMode::Month => ((key.prev(), key.prev().first_day()), (key.next(), key.next().first_day())),
        ViewMode::Week | ViewMode::Day => {
            let step = Duration::days(if view == ViewMode::Week { 7 } else { 1 });
            let prev = anchor.checked_sub_signed(step).unwrap_or(anchor);
            let next = anchor.checked_add_signed(step).unwrap_or(anchor);
            ((MonthKey::from_date(prev), prev), (MonthKey::from_date(next), next))
        }
    }
}

/// GET /calendar?view=&month=&date=&canceled=
pub async fn index(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<CalendarQuery>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    let offset = config.utc_offset;
    let today = calendar::today(offset);
    let view = ViewMode::parse(query.view.as_deref());
    let show_canceled = query.show_canceled();
    let (key, anchor) = resolve_position(view, &query, today);

    let range = calendar::view_range(view, key, anchor, offset);
    let rows = class_session::list_in_range(&pool, range, Scope::for_user(&user), show_canceled).await?;
    let now = Utc::now();
    let sessions: Vec<SessionView> = rows.iter().map(|s| s.to_view(offset, now)).collect();
    let total = sessions.len();

    let (weeks, columns) = match view {
        ViewMode::Month => (calendar::month_grid(key, &sessions, |s| s.date, today), Vec::new()),
        ViewMode::Week => {
            let start = calendar::week_start(anchor);
            let days = (0..7).map(|i| start + Duration::days(i)).collect::<Vec<_>>();
            (Vec::new(), columns_for(&days, &sessions, today))
        }
        ViewMode::Day => (Vec::new(), columns_for(&[anchor], &sessions, today)),
    };

    let ((prev_key, prev_day), (next_key, next_day)) = neighbours(view, key, anchor);
    let ctx = PageContext::for_user(&session, &config, &user, "/calendar");
    render(CalendarTemplate {
        ctx,
        view: view.as_str(),
        title: calendar::view_title(view, key, anchor),
        prev_href: calendar_href(view, prev_key, prev_day, show_canceled),
        next_href: calendar_href(view, next_key, next_day, show_canceled),
        today_href: calendar_href(view, MonthKey::from_date(today), today, show_canceled),
        month_href: calendar_href(ViewMode::Month, key, anchor, show_canceled),
        week_href: calendar_href(ViewMode::Week, key, anchor, show_canceled),
        day_href: calendar_href(ViewMode::Day, key, anchor, show_canceled),
        canceled_href: calendar_href(view, key, anchor, !show_canceled),
        show_canceled,
        can_manage: user.can_manage_sessions(),
        weekday_names: WEEKDAY_NAMES,
        weeks,
        columns,
        total,
    })
}

fn columns_for(days: &[NaiveDate], sessions: &[SessionView], today: NaiveDate) -> Vec<DayColumn> {
    days.iter()
        .map(|day| DayColumn {
            iso: day.format("%Y-%m-%d").to_string(),
            label: day.format("%a %m/%d").to_string(),
            is_today: *day == today,
            sessions: sessions.iter().filter(|s| s.date == *day).cloned().collect(),
        })
        .collect()
}
