use actix_session::Session;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_INSTRUCTOR: &str = "instructor";

/// Role codes cached in the session at sign-in, with a `has()` for templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles(pub Vec<String>);

impl Roles {
    pub fn has(&self, code: &str) -> bool {
        self.0.iter().any(|r| r == code)
    }

    pub fn from_csv(csv: &str) -> Self {
        let codes = csv
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Roles(codes)
    }

    pub fn to_csv(&self) -> String {
        self.0.join(",")
    }

    /// Roles of an account: its stored role plus `instructor` when it has an
    /// instructor profile.
    pub fn for_member(role: &str, teaches: bool) -> Self {
        let mut codes = Vec::new();
        if role == ROLE_ADMIN {
            codes.push(ROLE_ADMIN.to_string());
        }
        if teaches {
            codes.push(ROLE_INSTRUCTOR.to_string());
        }
        Roles(codes)
    }

    pub fn labels(&self) -> String {
        if self.0.is_empty() { "member".to_string() } else { self.0.join(", ") }
    }
}

/// The signed-in account as cached in the session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub roles: Roles,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.roles.has(ROLE_ADMIN)
    }

    pub fn is_instructor(&self) -> bool {
        self.roles.has(ROLE_INSTRUCTOR)
    }

    pub fn can_manage_sessions(&self) -> bool {
        self.is_admin() || self.is_instructor()
    }

    /// Row filter for session mutations: admins touch any row, everyone
    /// else only rows they teach.
    pub fn owner_filter(&self) -> Option<i64> {
        if self.is_admin() { None } else { Some(self.id) }
    }
}

/// Corrupted values read as absent.
pub fn get_member_id(session: &Session) -> Option<i64> {
    session.get::<i64>("member_id").unwrap_or(None)
}

pub fn get_roles(session: &Session) -> Roles {
    session
        .get::<String>("roles")
        .unwrap_or(None)
        .map(|csv| Roles::from_csv(&csv))
        .unwrap_or_default()
}

pub fn current_user(session: &Session) -> Result<CurrentUser, AppError> {
    let id = get_member_id(session).ok_or_else(|| AppError::Session("not signed in".to_string()))?;
    let email = session
        .get::<String>("email")
        .unwrap_or(None)
        .ok_or_else(|| AppError::Session("no e-mail in session".to_string()))?;
    let display_name = session
        .get::<String>("display_name")
        .unwrap_or(None)
        .unwrap_or_else(|| email.clone());
    Ok(CurrentUser { id, email, display_name, roles: get_roles(session) })
}

/// Store the signed-in account. Renews the session id first.
pub fn sign_in(session: &Session, user: &CurrentUser) -> Result<(), AppError> {
    session.renew();
    let stored = session
        .insert("member_id", user.id)
        .and_then(|_| session.insert("email", &user.email))
        .and_then(|_| session.insert("display_name", &user.display_name))
        .and_then(|_| session.insert("roles", user.roles.to_csv()));
    stored.map_err(|e| AppError::Session(format!("failed to store sign-in: {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn is_error(&self) -> bool {
        self.kind == FlashKind::Error
    }
}

pub fn set_flash(session: &Session, kind: FlashKind, message: impl Into<String>) {
    let flash = Flash { kind, message: message.into() };
    if let Err(e) = session.insert("flash", &flash) {
        log::warn!("Could not store flash message: {e}");
    }
}

pub fn flash_success(session: &Session, message: impl Into<String>) {
    set_flash(session, FlashKind::Success, message);
}

pub fn flash_error(session: &Session, message: impl Into<String>) {
    set_flash(session, FlashKind::Error, message);
}

pub fn take_flash(session: &Session) -> Option<Flash> {
    let flash = session.get::<Flash>("flash").unwrap_or(None);
    if flash.is_some() {
        session.remove("flash");
    }
    flash
}

/// Fails with `PermissionDenied` unless the user teaches or is an admin.
pub fn require_session_manager(user: &CurrentUser) -> Result<(), AppError> {
    if user.can_manage_sessions() {
        Ok(())
    } else {
        Err(AppError::PermissionDenied("session management".to_string()))
    }
}

/// Keep `next` only when it is a path on this site.
pub fn safe_next(next: Option<&str>) -> Option<String> {
    let n = next?.trim();
    if n.starts_with('/') && !n.starts_with("//") && !n.starts_with("/\\") {
        Some(n.to_string())
    } else {
        None
    }
}
