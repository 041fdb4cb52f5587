use sqlx::PgPool;

use crate::errors::AppError;

/// Actions written to `audit_log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PassGranted,
    BonusApplied,
    SessionCreated,
    SessionUpdated,
    SessionMoved,
    SessionDeleted,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::PassGranted => "pass.granted",
            Action::BonusApplied => "pass.bonus_applied",
            Action::SessionCreated => "session.created",
            Action::SessionUpdated => "session.updated",
            Action::SessionMoved => "session.moved",
            Action::SessionDeleted => "session.deleted",
        }
    }

    fn target_type(&self) -> &'static str {
        match self {
            Action::PassGranted | Action::BonusApplied => "pass",
            _ => "class_session",
        }
    }
}

pub async fn try_log(
    pool: &PgPool,
    actor_id: i64,
    action: Action,
    target_id: i64,
    summary: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO audit_log (actor_id, action, target_type, target_id, summary) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(actor_id)
    .bind(action.as_str())
    .bind(action.target_type())
    .bind(target_id)
    .bind(summary)
    .execute(pool)
    .await?;
    Ok(())
}

/// Record an audit entry. Failures are logged and swallowed.
pub async fn log(pool: &PgPool, actor_id: i64, action: Action, target_id: i64, summary: &str) {
    if let Err(e) = try_log(pool, actor_id, action, target_id, summary).await {
        log::warn!("audit {} #{target_id} not recorded: {e}", action.as_str());
    }
}
