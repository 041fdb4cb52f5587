use sqlx::PgPool;

use super::grant::GrantPassInput;
use super::types::{Balance, GrantOutcome, GrantRecord, PassRow, Promotion};
use crate::errors::AppError;

/// `grant_pass_unified`. `None` when the procedure returned no row.
pub async fn grant(
    pool: &PgPool,
    input: &GrantPassInput,
    granted_by: i64,
) -> Result<Option<GrantOutcome>, AppError> {
    let row = sqlx::query_as::<_, GrantOutcome>(
        "SELECT pass_id, total_sessions, remaining_sessions \
         FROM grant_pass_unified($1, $2, $3, $4, $5, $6)",
    )
    .bind(input.member_id)
    .bind(granted_by)
    .bind(input.base_sessions)
    .bind(input.bonus())
    .bind(input.promo_id)
    .bind(input.event_name())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn active_promotions(pool: &PgPool) -> Result<Vec<Promotion>, AppError> {
    let rows = sqlx::query_as::<_, Promotion>(
        "SELECT id, name, bonus_sessions FROM promotions WHERE is_active ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// `admin_list_passes_by_email`, newest first.
pub async fn list_by_email(pool: &PgPool, email: &str) -> Result<Vec<PassRow>, AppError> {
    let rows = sqlx::query_as::<_, PassRow>(
        "SELECT id, title, total_sessions, remaining_sessions, created_at, bonus_name, bonus_sessions \
         FROM admin_list_passes_by_email($1)",
    )
    .bind(email.trim())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// `admin_add_bonus_to_pass`; returns the pass id.
pub async fn add_bonus_to_pass(pool: &PgPool, pass_id: i64, name: &str, count: i32) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar("SELECT admin_add_bonus_to_pass($1, $2, $3)")
        .bind(pass_id)
        .bind(name)
        .bind(count)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

/// `admin_add_bonus_to_latest_pass_by_email`; returns the pass id.
pub async fn add_bonus_to_latest(pool: &PgPool, email: &str, name: &str, count: i32) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar("SELECT admin_add_bonus_to_latest_pass_by_email($1, $2, $3)")
        .bind(email.trim())
        .bind(name)
        .bind(count)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

pub async fn balance_for(pool: &PgPool, member_id: i64) -> Result<Option<Balance>, AppError> {
    let row = sqlx::query_as::<_, Balance>(
        "SELECT member_id, total_given, total_used, remaining, updated_at \
         FROM member_balances WHERE member_id = $1",
    )
    .bind(member_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Grant history, newest first.
pub async fn grants_for(pool: &PgPool, member_id: i64) -> Result<Vec<GrantRecord>, AppError> {
    let rows = sqlx::query_as::<_, GrantRecord>(
        "SELECT id, grant_type, base_count, promo_name, promo_bonus, extra_count, total_granted, created_at \
         FROM grants WHERE member_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
