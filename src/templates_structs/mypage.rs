use askama::Template;

use super::PageContext;
use crate::models::calendar::DayCell;
use crate::models::pass::{Balance, GrantRecord};

#[derive(Template)]
#[template(path = "mypage/index.html")]
pub struct MyPageTemplate {
    pub ctx: PageContext,
    pub balance: Option<Balance>,
    pub grants: Vec<GrantView>,
}

pub struct GrantView {
    pub created: String,
    pub breakdown: String,
    pub promo_name: Option<String>,
    pub grant_type: String,
}

impl GrantView {
    pub fn from_record(g: &GrantRecord, created: String) -> Self {
        Self {
            created,
            breakdown: g.breakdown(),
            promo_name: g.promo_name.clone().filter(|n| !n.trim().is_empty()),
            grant_type: g.grant_type.clone(),
        }
    }
}

/// Booked session as shown on the member calendar.
#[derive(Debug, Clone)]
pub struct MemberEventView {
    pub id: i64,
    pub title: String,
    pub date: chrono::NaiveDate,
    pub date_label: String,
    pub time_range: String,
    pub instructor_name: String,
    pub memo: String,
    pub status: String,
    pub past: bool,
}

#[derive(Template)]
#[template(path = "mypage/calendar.html")]
pub struct MemberCalendarTemplate {
    pub ctx: PageContext,
    pub month_label: String,
    pub prev_href: String,
    pub next_href: String,
    pub today_href: String,
    pub weekday_names: [&'static str; 7],
    pub weeks: Vec<Vec<DayCell<MemberEventView>>>,
    pub upcoming: Vec<MemberEventView>,
}
