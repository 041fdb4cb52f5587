use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct BonusForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub pass_id: String,
    #[serde(default)]
    pub bonus_name: String,
    #[serde(default)]
    pub bonus_count: String,
    pub csrf_token: String,
}

/// Where a bonus goes: an explicit pass wins over the member's latest one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BonusTarget {
    Pass(i64),
    LatestFor(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BonusInput {
    pub target: BonusTarget,
    pub name: String,
    pub count: i32,
}

impl BonusForm {
    pub fn validate(&self) -> Result<BonusInput, String> {
        let name = self.bonus_name.trim();
        let count = self.bonus_count.trim().parse::<i32>().ok().filter(|n| *n > 0);
        let count = match (name.is_empty(), count) {
            (false, Some(n)) => n,
            _ => return Err("Enter a bonus name and a positive number of sessions".to_string()),
        };

        let target = match (self.pass_id.trim(), self.email.trim()) {
            ("", "") => return Err("Enter a pass id or a member e-mail".to_string()),
            ("", email) => BonusTarget::LatestFor(email.to_string()),
            (raw, _) => BonusTarget::Pass(
                raw.parse::<i64>().map_err(|_| "Pass id must be a number".to_string())?,
            ),
        };

        Ok(BonusInput { target, name: name.to_string(), count })
    }
}

pub fn applied_message(target: &BonusTarget, pass_id: i64) -> String {
    match target {
        BonusTarget::Pass(_) => format!("Bonus applied to pass #{pass_id}"),
        BonusTarget::LatestFor(_) => format!("Bonus applied to latest pass #{pass_id}"),
    }
}
