use askama::Template;

use super::{PageContext, SelectOption};
use crate::models::member::MemberOption;
use crate::models::pass::Promotion;

#[derive(Template)]
#[template(path = "admin/index.html")]
pub struct AdminIndexTemplate {
    pub ctx: PageContext,
}

/// Values echoed back into the grant form after a failed submit.
#[derive(Debug, Default, Clone)]
pub struct GrantFormValues {
    pub member_id: String,
    pub base_sessions: String,
    pub promo_id: String,
    pub event_name: String,
    pub bonus_sessions: String,
}

#[derive(Template)]
#[template(path = "admin/passes.html")]
pub struct GrantPassTemplate {
    pub ctx: PageContext,
    pub member_options: Vec<SelectOption>,
    pub promo_options: Vec<SelectOption>,
    pub values: GrantFormValues,
}

impl GrantFormValues {
    pub fn member_options(&self, members: &[MemberOption]) -> Vec<SelectOption> {
        members
            .iter()
            .map(|m| SelectOption::new(m.id, m.label(), &self.member_id))
            .collect()
    }

    pub fn promo_options(&self, promotions: &[Promotion]) -> Vec<SelectOption> {
        promotions
            .iter()
            .map(|p| SelectOption::new(p.id, format!("{} (+{})", p.name, p.bonus_sessions), &self.promo_id))
            .collect()
    }
}

/// Pass row formatted for the bonus page.
pub struct PassRowView {
    pub id: i64,
    pub title: String,
    pub bonus_name: String,
    pub remaining: i32,
    pub total: i32,
    pub bonus_sessions: i32,
    pub created: String,
}

#[derive(Template)]
#[template(path = "admin/bonus.html")]
pub struct BonusTemplate {
    pub ctx: PageContext,
    pub email: String,
    pub searched: bool,
    pub search_error: Option<String>,
    pub passes: Vec<PassRowView>,
    pub pass_id: String,
    pub bonus_name: String,
    pub bonus_count: String,
}
