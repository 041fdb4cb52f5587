use askama::Template;

use super::PageContext;
use crate::models::class_session::SessionView;
use crate::models::member::MemberOption;

#[derive(Template)]
#[template(path = "instructor/sessions.html")]
pub struct InstructorSessionsTemplate {
    pub ctx: PageContext,
    pub month_label: String,
    pub prev_href: String,
    pub next_href: String,
    pub sessions: Vec<SessionView>,
}

#[derive(Debug, Default, Clone)]
pub struct LessonFormValues {
    pub title: String,
    pub start_at: String,
    pub minutes: String,
    pub memo: String,
}

#[derive(Template)]
#[template(path = "instructor/schedule.html")]
pub struct ScheduleTemplate {
    pub ctx: PageContext,
    pub email: String,
    pub member: Option<MemberOption>,
    pub lookup_error: Option<String>,
    pub values: LessonFormValues,
    pub default_minutes: i64,
}
