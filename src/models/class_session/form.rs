use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Deserialize;

use super::types::SessionStatus;
use crate::models::calendar::parse_timestamp;

pub const DEFAULT_TITLE: &str = "Untitled session";
pub const QUICK_TITLE: &str = "Class";
pub const PRIVATE_LESSON_TITLE: &str = "Private lesson";
pub const DEFAULT_LESSON_MINUTES: i64 = 50;

/// Calendar create/edit form.
#[derive(Debug, Default, Deserialize)]
pub struct SessionForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_at: String,
    #[serde(default)]
    pub end_at: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub instructor_id: String,
    #[serde(default)]
    pub member: String,
    #[serde(default)]
    pub memo: String,
    pub csrf_token: String,
}

/// How the member field was filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberRef {
    None,
    Id(i64),
    Email(String),
}

impl MemberRef {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let s = raw.trim();
        if s.is_empty() {
            return Ok(MemberRef::None);
        }
        if let Ok(id) = s.parse::<i64>() {
            return if id > 0 { Ok(MemberRef::Id(id)) } else { Err("Member id must be positive".to_string()) };
        }
        if s.contains('@') {
            return Ok(MemberRef::Email(s.to_string()));
        }
        Err("Member must be a member id or an e-mail".to_string())
    }
}

/// Form values after the checks that need no database.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDraft {
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub location: Option<String>,
    pub memo: Option<String>,
    pub instructor_id: Option<i64>,
    pub member: MemberRef,
}

impl SessionForm {
    /// Validate everything that can be checked without the database.
    /// Errors come back in form order.
    pub fn validate(&self, offset: FixedOffset) -> Result<SessionDraft, Vec<String>> {
        let mut errors = Vec::new();

        let starts_at = required_time(&self.start_at, "Start", offset, &mut errors);
        let ends_at = required_time(&self.end_at, "End", offset, &mut errors);
        if let (Some(s), Some(e)) = (starts_at, ends_at) {
            if e <= s {
                errors.push("End must be after start".to_string());
            }
        }

        let instructor_id = match self.instructor_id.trim() {
            "" => None,
            raw => match raw.parse::<i64>() {
                Ok(id) if id > 0 => Some(id),
                _ => {
                    errors.push("Invalid instructor".to_string());
                    None
                }
            },
        };

        let member = MemberRef::parse(&self.member).unwrap_or_else(|e| {
            errors.push(e);
            MemberRef::None
        });

        match (starts_at, ends_at) {
            (Some(starts_at), Some(ends_at)) if errors.is_empty() => Ok(SessionDraft {
                title: title_or(&self.title, DEFAULT_TITLE),
                starts_at,
                ends_at,
                status: SessionStatus::normalize(&self.status),
                location: non_blank(&self.location),
                memo: non_blank(&self.memo),
                instructor_id,
                member,
            }),
            _ => Err(errors),
        }
    }
}

/// The instructor a new session belongs to: the chosen one, else the caller
/// when they teach.
pub fn choose_instructor(chosen: Option<i64>, caller: i64, caller_teaches: bool) -> Result<i64, String> {
    match chosen {
        Some(id) => Ok(id),
        None if caller_teaches => Ok(caller),
        None => Err("Select an instructor".to_string()),
    }
}

/// Quick-create form on the instructor session list.
#[derive(Debug, Deserialize)]
pub struct QuickSessionForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_at: String,
    #[serde(default)]
    pub end_at: String,
    #[serde(default)]
    pub member: String,
    pub csrf_token: String,
}

impl QuickSessionForm {
    pub fn validate(&self, offset: FixedOffset) -> Result<(String, DateTime<Utc>, Option<DateTime<Utc>>), String> {
        let start = parse_timestamp(&self.start_at, offset).ok_or("Enter a valid start time")?;
        let end = match self.end_at.trim() {
            "" => None,
            raw => Some(parse_timestamp(raw, offset).ok_or("Enter a valid end time")?),
        };
        if end.is_some_and(|e| e <= start) {
            return Err("End must be after start".to_string());
        }
        Ok((title_or(&self.title, QUICK_TITLE), start, end))
    }
}

/// Private lesson booking on the instructor schedule page.
#[derive(Debug, Deserialize)]
pub struct LessonForm {
    pub member_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_at: String,
    #[serde(default)]
    pub minutes: String,
    #[serde(default)]
    pub memo: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LessonDraft {
    pub member_id: i64,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub memo: Option<String>,
}

impl LessonForm {
    pub fn validate(&self, offset: FixedOffset) -> Result<LessonDraft, String> {
        let member_id = self
            .member_id
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or("Look up a member first")?;
        let starts_at = parse_timestamp(&self.start_at, offset).ok_or("Enter a start time")?;
        let minutes = match self.minutes.trim() {
            "" => DEFAULT_LESSON_MINUTES,
            raw => raw
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0 && *m <= 24 * 60)
                .ok_or("Duration must be a positive number of minutes")?,
        };
        let ends_at = starts_at
            .checked_add_signed(Duration::minutes(minutes))
            .ok_or("Enter a start time")?;
        Ok(LessonDraft {
            member_id,
            title: title_or(&self.title, PRIVATE_LESSON_TITLE),
            starts_at,
            ends_at,
            memo: non_blank(&self.memo),
        })
    }
}

fn required_time(
    raw: &str,
    label: &str,
    offset: FixedOffset,
    errors: &mut Vec<String>,
) -> Option<DateTime<Utc>> {
    if raw.trim().is_empty() {
        errors.push(format!("{label} is required"));
        return None;
    }
    let parsed = parse_timestamp(raw, offset);
    if parsed.is_none() {
        errors.push(format!("{label} is not a valid date and time"));
    }
    parsed
}

pub fn title_or(raw: &str, default: &str) -> String {
    match raw.trim() {
        "" => default.to_string(),
        t => t.to_string(),
    }
}

fn non_blank(raw: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}
