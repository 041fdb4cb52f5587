use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::session::CurrentUser;
use crate::models::calendar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Canceled,
}

impl SessionStatus {
    pub const ALL: [SessionStatus; 3] = [
        SessionStatus::Scheduled,
        SessionStatus::Completed,
        SessionStatus::Canceled,
    ];

    /// Unknown or missing values read as `Scheduled`.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" => SessionStatus::Completed,
            "canceled" | "cancelled" => SessionStatus::Canceled,
            _ => SessionStatus::Scheduled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
            SessionStatus::Canceled => "canceled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "Scheduled",
            SessionStatus::Completed => "Completed",
            SessionStatus::Canceled => "Canceled",
        }
    }
}

/// A row of `class_sessions` joined with instructor and member names.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClassSession {
    pub id: i64,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: String,
    pub location: Option<String>,
    pub memo: Option<String>,
    pub instructor_id: Option<i64>,
    pub member_id: Option<i64>,
    pub instructor_name: Option<String>,
    pub member_email: Option<String>,
}

impl ClassSession {
    pub fn status(&self) -> SessionStatus {
        SessionStatus::normalize(&self.status)
    }

    /// End instant; sessions stored without an end collapse to their start.
    pub fn end(&self) -> DateTime<Utc> {
        self.ends_at.unwrap_or(self.starts_at)
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end() < now
    }

    pub fn to_event(&self, now: DateTime<Utc>) -> SessionEvent {
        SessionEvent {
            id: self.id,
            title: self.title.clone(),
            start: self.starts_at,
            end: self.end(),
            status: self.status(),
            location: self.location.clone(),
            member_id: self.member_id,
            instructor_id: self.instructor_id,
            past: self.is_past(now),
        }
    }

    pub fn to_view(&self, offset: FixedOffset, now: DateTime<Utc>) -> SessionView {
        let status = self.status();
        SessionView {
            id: self.id,
            title: self.title.clone(),
            date: calendar::local_date(self.starts_at, offset),
            date_label: calendar::format_local(self.starts_at, offset, "%Y-%m-%d (%a)"),
            start_time: calendar::format_local(self.starts_at, offset, "%H:%M"),
            end_time: calendar::format_local(self.end(), offset, "%H:%M"),
            start_input: calendar::to_local_input(self.starts_at, offset),
            end_input: calendar::to_local_input(self.end(), offset),
            status: status.as_str(),
            status_label: status.label(),
            location: self.location.clone().unwrap_or_default(),
            memo: self.memo.clone().unwrap_or_default(),
            instructor_name: self.instructor_name.clone().unwrap_or_default(),
            member_label: self
                .member_email
                .clone()
                .or_else(|| self.member_id.map(|id| format!("#{id}")))
                .unwrap_or_default(),
            instructor_id: self.instructor_id,
            member_id: self.member_id,
            has_end: self.ends_at.is_some(),
            past: self.is_past(now),
        }
    }
}

/// JSON shape served to calendar scripts.
#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    pub id: i64,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: SessionStatus,
    pub location: Option<String>,
    pub member_id: Option<i64>,
    pub instructor_id: Option<i64>,
    pub past: bool,
}

/// Pre-formatted session for templates, in studio local time.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub id: i64,
    pub title: String,
    pub date: chrono::NaiveDate,
    pub date_label: String,
    pub start_time: String,
    pub end_time: String,
    pub start_input: String,
    pub end_input: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub location: String,
    pub memo: String,
    pub instructor_name: String,
    pub member_label: String,
    pub instructor_id: Option<i64>,
    pub member_id: Option<i64>,
    pub has_end: bool,
    pub past: bool,
}

/// Row of the `v_member_calendar` view.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MemberCalendarEvent {
    pub event_id: i64,
    pub member_id: i64,
    pub instructor_id: Option<i64>,
    pub title: String,
    pub memo: Option<String>,
    pub status: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub instructor_name: Option<String>,
}

/// Which rows a viewer may list. Stands in for the row-level policies of
/// the hosted backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Instructor(i64),
    Member(i64),
}

impl Scope {
    pub fn for_user(user: &CurrentUser) -> Self {
        if user.is_admin() {
            Scope::All
        } else if user.is_instructor() {
            Scope::Instructor(user.id)
        } else {
            Scope::Member(user.id)
        }
    }
}

/// Values written on create/update.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionWrite {
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub location: Option<String>,
    pub memo: Option<String>,
    /// `None` on update keeps the current instructor.
    pub instructor_id: Option<i64>,
    pub member_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::Roles;
    use chrono::TimeZone;

    fn session(ends_at: Option<DateTime<Utc>>, status: &str) -> ClassSession {
        ClassSession {
            id: 7,
            title: "Reformer".into(),
            starts_at: Utc.with_ymd_and_hms(2026, 10, 16, 1, 0, 0).unwrap(),
            ends_at,
            status: status.into(),
            location: None,
            memo: None,
            instructor_id: Some(2),
            member_id: None,
            instructor_name: Some("Jin".into()),
            member_email: None,
        }
    }

    #[test]
    fn status_normalizes_unknown_values() {
        assert_eq!(SessionStatus::normalize("completed"), SessionStatus::Completed);
        assert_eq!(SessionStatus::normalize(" Canceled "), SessionStatus::Canceled);
        assert_eq!(SessionStatus::normalize("postponed"), SessionStatus::Scheduled);
        assert_eq!(SessionStatus::normalize(""), SessionStatus::Scheduled);
    }

    #[test]
    fn missing_end_collapses_to_start() {
        let s = session(None, "scheduled");
        assert_eq!(s.end(), s.starts_at);
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 1, 0, 1).unwrap();
        assert!(s.is_past(now));
    }

    #[test]
    fn view_is_in_local_time() {
        let s = session(Some(Utc.with_ymd_and_hms(2026, 10, 16, 2, 0, 0).unwrap()), "bogus");
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let v = s.to_view(kst, Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap());
        assert_eq!(v.start_time, "10:00");
        assert_eq!(v.end_time, "11:00");
        assert_eq!(v.start_input, "2026-10-16T10:00");
        assert_eq!(v.status, "scheduled");
        assert!(!v.past);
    }

    #[test]
    fn event_serializes_lowercase_status() {
        let s = session(None, "canceled");
        let json = serde_json::to_value(s.to_event(Utc::now())).unwrap();
        assert_eq!(json["status"], "canceled");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn scope_follows_roles() {
        let mut user = CurrentUser {
            id: 5,
            email: "x@y.z".into(),
            display_name: "X".into(),
            roles: Roles::default(),
        };
        assert_eq!(Scope::for_user(&user), Scope::Member(5));
        user.roles = Roles::from_csv("instructor");
        assert_eq!(Scope::for_user(&user), Scope::Instructor(5));
        user.roles = Roles::from_csv("instructor,admin");
        assert_eq!(Scope::for_user(&user), Scope::All);
    }
}
