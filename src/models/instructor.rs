use sqlx::PgPool;

use crate::errors::AppError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Instructor {
    pub id: i64,
    pub name: String,
}

pub async fn list(pool: &PgPool) -> Result<Vec<Instructor>, AppError> {
    let rows = sqlx::query_as::<_, Instructor>("SELECT id, name FROM instructors ORDER BY name ASC")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn exists(pool: &PgPool, id: i64) -> Result<bool, AppError> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM instructors WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(found)
}

/// Register a member as an instructor (idempotent; renames on conflict).
pub async fn upsert(pool: &PgPool, member_id: i64, name: &str) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO instructors (id, name) VALUES ($1, $2) \
         ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name",
    )
    .bind(member_id)
    .bind(name.trim())
    .execute(pool)
    .await?;
    Ok(())
}
