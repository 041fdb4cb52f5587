use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::types::{ClassSession, MemberCalendarEvent, Scope, SessionWrite};
use crate::errors::AppError;
use crate::models::calendar::Range;

const SELECT_SESSION: &str = "\
    SELECT s.id, s.title, s.starts_at, s.ends_at, s.status, s.location, s.memo, \
           s.instructor_id, s.member_id, i.name AS instructor_name, m.email AS member_email \
    FROM class_sessions s \
    LEFT JOIN instructors i ON i.id = s.instructor_id \
    LEFT JOIN members m ON m.id = s.member_id";

/// Sessions starting inside `range`, visible to `scope`, ordered by start.
pub async fn list_in_range(
    pool: &PgPool,
    range: Range,
    scope: Scope,
    include_canceled: bool,
) -> Result<Vec<ClassSession>, AppError> {
    let (instructor, member) = match scope {
        Scope::All => (None, None),
        Scope::Instructor(id) => (Some(id), None),
        Scope::Member(id) => (None, Some(id)),
    };
    let sql = format!(
        "{SELECT_SESSION} \
         WHERE s.starts_at >= $1 AND s.starts_at < $2 \
           AND ($3::BIGINT IS NULL OR s.instructor_id = $3) \
           AND ($4::BIGINT IS NULL OR s.member_id = $4) \
           AND ($5 OR s.status <> 'canceled') \
         ORDER BY s.starts_at ASC, s.id ASC"
    );
    let rows = sqlx::query_as::<_, ClassSession>(&sql)
        .bind(range.from)
        .bind(range.to)
        .bind(instructor)
        .bind(member)
        .bind(include_canceled)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Every session, newest first.
pub async fn list_all_desc(pool: &PgPool) -> Result<Vec<ClassSession>, AppError> {
    let sql = format!("{SELECT_SESSION} ORDER BY s.starts_at DESC, s.id DESC");
    let rows = sqlx::query_as::<_, ClassSession>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<ClassSession>, AppError> {
    let sql = format!("{SELECT_SESSION} WHERE s.id = $1");
    let row = sqlx::query_as::<_, ClassSession>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &PgPool, s: &SessionWrite) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO class_sessions \
             (title, starts_at, ends_at, status, location, memo, instructor_id, member_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
    )
    .bind(&s.title)
    .bind(s.starts_at)
    .bind(s.ends_at)
    .bind(s.status.as_str())
    .bind(&s.location)
    .bind(&s.memo)
    .bind(s.instructor_id)
    .bind(s.member_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Overwrite a session. `owner` restricts the update to rows taught by that
/// instructor. Returns false when no row matched.
pub async fn update(
    pool: &PgPool,
    id: i64,
    s: &SessionWrite,
    owner: Option<i64>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE class_sessions SET \
             title = $2, starts_at = $3, ends_at = $4, status = $5, location = $6, \
             memo = $7, instructor_id = COALESCE($8, instructor_id), member_id = $9 \
         WHERE id = $1 AND ($10::BIGINT IS NULL OR instructor_id = $10)",
    )
    .bind(id)
    .bind(&s.title)
    .bind(s.starts_at)
    .bind(s.ends_at)
    .bind(s.status.as_str())
    .bind(&s.location)
    .bind(&s.memo)
    .bind(s.instructor_id)
    .bind(s.member_id)
    .bind(owner)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Move or resize a session.
pub async fn update_time(
    pool: &PgPool,
    id: i64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    owner: Option<i64>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE class_sessions SET starts_at = $2, ends_at = $3 \
         WHERE id = $1 AND ($4::BIGINT IS NULL OR instructor_id = $4)",
    )
    .bind(id)
    .bind(starts_at)
    .bind(ends_at)
    .bind(owner)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_title(pool: &PgPool, id: i64, title: &str, owner: Option<i64>) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE class_sessions SET title = $2 \
         WHERE id = $1 AND ($3::BIGINT IS NULL OR instructor_id = $3)",
    )
    .bind(id)
    .bind(title)
    .bind(owner)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: i64, owner: Option<i64>) -> Result<bool, AppError> {
    let result = sqlx::query(
        "DELETE FROM class_sessions WHERE id = $1 AND ($2::BIGINT IS NULL OR instructor_id = $2)",
    )
    .bind(id)
    .bind(owner)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// The caller's booked sessions from `v_member_calendar`.
pub async fn member_calendar(
    pool: &PgPool,
    member_id: i64,
    range: Range,
) -> Result<Vec<MemberCalendarEvent>, AppError> {
    let rows = sqlx::query_as::<_, MemberCalendarEvent>(
        "SELECT event_id, member_id, instructor_id, title, memo, status, starts_at, ends_at, instructor_name \
         FROM v_member_calendar \
         WHERE member_id = $1 AND starts_at >= $2 AND starts_at < $3 \
         ORDER BY starts_at ASC, event_id ASC",
    )
    .bind(member_id)
    .bind(range.from)
    .bind(range.to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
