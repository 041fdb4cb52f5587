use serde::Deserialize;
use std::fmt;

/// Raw pass-granting form.
#[derive(Debug, Default, Deserialize)]
pub struct GrantPassForm {
    #[serde(default)]
    pub member_id: String,
    #[serde(default)]
    pub base_sessions: String,
    #[serde(default)]
    pub promo_id: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub bonus_sessions: String,
    pub csrf_token: String,
}

/// Named extra credit typed in by the admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualBonus {
    pub name: String,
    pub bonus: i32,
}

/// Validated arguments of `grant_pass_unified`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantPassInput {
    pub member_id: i64,
    pub base_sessions: i32,
    pub promo_id: Option<i64>,
    pub manual: Option<ManualBonus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantError {
    NoMember,
    BadBase,
    BadPromo,
    NoEventName,
    BadBonus,
}

impl fmt::Display for GrantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            GrantError::NoMember => "Select a member",
            GrantError::BadBase => "Base sessions must be a whole number of at least 1",
            GrantError::BadPromo => "Unknown promotion",
            GrantError::NoEventName => "Enter an event name",
            GrantError::BadBonus => "Extra sessions must be a whole number of 0 or more",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for GrantError {}

impl GrantPassForm {
    /// Checks run in form order; the first failure wins.
    pub fn validate(&self) -> Result<GrantPassInput, GrantError> {
        let member_id = self
            .member_id
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or(GrantError::NoMember)?;

        let base_sessions = self
            .base_sessions
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(GrantError::BadBase)?;

        let promo_id = match self.promo_id.trim() {
            "" => None,
            raw => Some(raw.parse::<i64>().map_err(|_| GrantError::BadPromo)?),
        };

        let name = self.event_name.trim();
        let bonus_raw = self.bonus_sessions.trim();
        let manual = if name.is_empty() && bonus_raw.is_empty() {
            None
        } else {
            let bonus = match bonus_raw {
                "" => 0,
                raw => raw
                    .parse::<i32>()
                    .ok()
                    .filter(|n| *n >= 0)
                    .ok_or(GrantError::BadBonus)?,
            };
            if name.is_empty() {
                // A zero bonus with no name is the same as leaving both blank.
                if bonus == 0 {
                    None
                } else {
                    return Err(GrantError::NoEventName);
                }
            } else {
                Some(ManualBonus { name: name.to_string(), bonus })
            }
        };

        Ok(GrantPassInput { member_id, base_sessions, promo_id, manual })
    }
}

impl GrantPassInput {
    pub fn bonus(&self) -> i32 {
        self.manual.as_ref().map_or(0, |m| m.bonus)
    }

    pub fn event_name(&self) -> Option<&str> {
        self.manual.as_ref().map(|m| m.name.as_str())
    }

    /// Totals used in the confirmation when the procedure returns no row.
    pub fn fallback_totals(&self) -> (i32, i32) {
        let total = self.base_sessions + self.bonus();
        (total, total)
    }
}

pub fn granted_message(total: i32, remaining: i32) -> String {
    format!("Granted: {total} sessions total ({remaining} remaining)")
}

pub const GRANT_FAILED: &str = "Something went wrong while granting the pass.";
