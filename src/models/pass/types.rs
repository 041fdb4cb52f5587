use chrono::{DateTime, Utc};

/// Row of `admin_list_passes_by_email`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PassRow {
    pub id: i64,
    pub title: Option<String>,
    pub total_sessions: i32,
    pub remaining_sessions: i32,
    pub created_at: DateTime<Utc>,
    pub bonus_name: Option<String>,
    pub bonus_sessions: Option<i32>,
}

impl PassRow {
    pub fn title_or_default(&self) -> &str {
        match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => "Pass",
        }
    }
}

/// Result row of `grant_pass_unified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct GrantOutcome {
    pub pass_id: i64,
    pub total_sessions: i32,
    pub remaining_sessions: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Promotion {
    pub id: i64,
    pub name: String,
    pub bonus_sessions: i32,
}

/// Row of the `member_balances` view.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Balance {
    pub member_id: i64,
    pub total_given: i64,
    pub total_used: i64,
    pub remaining: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One entry of a member's grant history.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GrantRecord {
    pub id: i64,
    pub grant_type: String,
    pub base_count: i32,
    pub promo_name: Option<String>,
    pub promo_bonus: i32,
    pub extra_count: i32,
    pub total_granted: i32,
    pub created_at: DateTime<Utc>,
}

impl GrantRecord {
    /// `base + promo + extra = total`.
    pub fn breakdown(&self) -> String {
        format!(
            "{} + {} + {} = {}",
            self.base_count, self.promo_bonus, self.extra_count, self.total_granted
        )
    }
}
