// Template context structures for Askama templates, organized by page area.

use actix_session::Session;

use crate::auth::csrf;
use crate::auth::session::{CurrentUser, Flash, current_user, take_flash};
use crate::config::Config;
use crate::errors::AppError;

pub mod account;
pub mod admin;
pub mod calendar;
pub mod instructor;
pub mod mypage;

pub use account::*;
pub use admin::*;
pub use calendar::*;
pub use instructor::*;
pub use mypage::*;

/// `<option>` for a select, with the selection already decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl ToString, label: impl Into<String>, current: &str) -> Self {
        let value = value.to_string();
        let selected = value == current.trim();
        Self { value, label: label.into(), selected }
    }
}

/// Common context shared by all signed-in pages.
/// Templates access these as `ctx.display_name`, `ctx.is_admin`, etc.
pub struct PageContext {
    pub member_id: i64,
    pub email: String,
    pub display_name: String,
    pub is_admin: bool,
    pub is_instructor: bool,
    pub flash: Option<Flash>,
    pub app_name: String,
    pub csrf_token: String,
    pub current_path: String,
}

impl PageContext {
    pub fn build(session: &Session, config: &Config, current_path: &str) -> Result<Self, AppError> {
        let user = current_user(session)?;
        Ok(Self::for_user(session, config, &user, current_path))
    }

    pub fn for_user(session: &Session, config: &Config, user: &CurrentUser, current_path: &str) -> Self {
        Self {
            member_id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            is_admin: user.is_admin(),
            is_instructor: user.is_instructor(),
            flash: take_flash(session),
            app_name: config.app_name.clone(),
            csrf_token: csrf::get_or_create_token(session),
            current_path: current_path.to_string(),
        }
    }

    /// `"active"` when the current page lives under `prefix`.
    pub fn nav_class(&self, prefix: &str) -> &'static str {
        let under = self.current_path == prefix
            || (prefix != "/" && self.current_path.starts_with(&format!("{prefix}/")));
        if under { "active" } else { "" }
    }

    pub fn avatar_initial(&self) -> String {
        self.display_name
            .chars()
            .next()
            .unwrap_or('?')
            .to_uppercase()
            .to_string()
    }
}
