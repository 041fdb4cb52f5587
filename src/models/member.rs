use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::errors::AppError;

/// Account row for display. Never carries the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Member {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn display_name(&self) -> &str {
        display_name(self.name.as_deref(), &self.email)
    }
}

/// Account row used by the login flow.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MemberAuth {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub role: String,
}

pub struct NewMember {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub role: String,
}

/// Lightweight member reference for selects and the member picker.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MemberOption {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
}

impl MemberOption {
    pub fn label(&self) -> String {
        format!("{} ({})", display_name(self.name.as_deref(), &self.email), self.email)
    }
}

/// Whose members a picker search may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    All,
    TaughtBy(i64),
}

pub fn display_name<'a>(name: Option<&'a str>, email: &'a str) -> &'a str {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n,
        _ => email,
    }
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<MemberAuth>, AppError> {
    let row = sqlx::query_as::<_, MemberAuth>(
        "SELECT id, email, name, password_hash, role FROM members WHERE lower(email) = lower($1)",
    )
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Member>, AppError> {
    let row = sqlx::query_as::<_, Member>(
        "SELECT id, email, name, role, created_at FROM members WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AppError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM members WHERE lower(email) = lower($1))",
    )
    .bind(email.trim())
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

pub async fn create(pool: &PgPool, new: &NewMember) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO members (email, name, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(new.email.trim())
    .bind(new.name.as_deref().map(str::trim).filter(|n| !n.is_empty()))
    .bind(&new.password_hash)
    .bind(&new.role)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn set_role(pool: &PgPool, id: i64, role: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE members SET role = $2 WHERE id = $1")
        .bind(id)
        .bind(role)
        .execute(pool)
        .await?;
    Ok(())
}

/// All members ordered by e-mail, for the grant form.
pub async fn list_options(pool: &PgPool) -> Result<Vec<MemberOption>, AppError> {
    let rows = sqlx::query_as::<_, MemberOption>(
        "SELECT id, email, name FROM members ORDER BY email ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// `get_member_id_by_email` procedure.
pub async fn id_by_email(pool: &PgPool, email: &str) -> Result<Option<i64>, AppError> {
    let id: Option<i64> = sqlx::query_scalar("SELECT get_member_id_by_email($1)")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

/// `admin_whoami` procedure.
pub async fn is_admin(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let row: Option<bool> = sqlx::query_scalar("SELECT is_admin FROM admin_whoami($1)")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.unwrap_or(false))
}

/// Member picker search through `admin_search_members` or
/// `instructor_search_my_members`.
pub async fn search(pool: &PgPool, q: &str, scope: SearchScope) -> Result<Vec<MemberOption>, AppError> {
    let rows = match scope {
        SearchScope::All => {
            sqlx::query_as::<_, MemberOption>("SELECT id, email, name FROM admin_search_members($1)")
                .bind(q)
                .fetch_all(pool)
                .await?
        }
        SearchScope::TaughtBy(instructor_id) => {
            sqlx::query_as::<_, MemberOption>(
                "SELECT id, email, name FROM instructor_search_my_members($1, $2)",
            )
            .bind(instructor_id)
            .bind(q)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}
