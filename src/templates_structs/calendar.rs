use askama::Template;

use super::{PageContext, SelectOption};
use crate::models::calendar::DayCell;
use crate::models::class_session::{SessionStatus, SessionView};
use crate::models::instructor::Instructor;

/// One column of the week/day views.
pub struct DayColumn {
    pub iso: String,
    pub label: String,
    pub is_today: bool,
    pub sessions: Vec<SessionView>,
}

#[derive(Template)]
#[template(path = "calendar/index.html")]
pub struct CalendarTemplate {
    pub ctx: PageContext,
    pub view: &'static str,
    pub title: String,
    pub prev_href: String,
    pub next_href: String,
    pub today_href: String,
    pub month_href: String,
    pub week_href: String,
    pub day_href: String,
    pub canceled_href: String,
    pub show_canceled: bool,
    pub can_manage: bool,
    pub weekday_names: [&'static str; 7],
    pub weeks: Vec<Vec<DayCell<SessionView>>>,
    pub columns: Vec<DayColumn>,
    pub total: usize,
}

/// Values shown in the session form.
#[derive(Debug, Default, Clone)]
pub struct SessionFormValues {
    pub title: String,
    pub start_at: String,
    pub end_at: String,
    pub status: String,
    pub location: String,
    pub instructor_id: String,
    pub member: String,
    pub memo: String,
}

#[derive(Template)]
#[template(path = "calendar/form.html")]
pub struct SessionFormTemplate {
    pub ctx: PageContext,
    pub form_title: String,
    pub form_action: String,
    pub session_id: Option<i64>,
    pub values: SessionFormValues,
    pub instructor_options: Vec<SelectOption>,
    pub status_options: Vec<SelectOption>,
    pub errors: Vec<String>,
}

impl SessionFormValues {
    pub fn instructor_options(&self, instructors: &[Instructor]) -> Vec<SelectOption> {
        instructors
            .iter()
            .map(|i| SelectOption::new(i.id, i.name.clone(), &self.instructor_id))
            .collect()
    }

    pub fn status_options(&self) -> Vec<SelectOption> {
        let current = SessionStatus::normalize(&self.status);
        SessionStatus::ALL
            .iter()
            .map(|s| SelectOption::new(s.as_str(), s.label(), current.as_str()))
            .collect()
    }
}
