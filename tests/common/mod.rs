//! Shared test infrastructure for the database-backed tests.
//!
//! Every test gets its own throw-away PostgreSQL database, created next to
//! the one `DATABASE_URL` points at and migrated from `migrations/`. When
//! `DATABASE_URL` is unset or unreachable the test is skipped.

#![allow(dead_code)]

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use studio::auth::password;
use studio::models::instructor;
use studio::models::member::{self, NewMember};

pub const TEST_PASS: &str = "correct horse";

pub struct TestDb {
    pool: PgPool,
    admin: PgPool,
    name: String,
}

impl TestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the pool and drop the database.
    pub async fn teardown(self) {
        self.pool.close().await;
        let sql = format!("DROP DATABASE IF EXISTS \"{}\"", self.name);
        if let Err(e) = sqlx::query(&sql).execute(&self.admin).await {
            eprintln!("could not drop {}: {e}", self.name);
        }
        self.admin.close().await;
    }
}

/// Fresh migrated database, or `None` (with a note on stderr) when no
/// server is available.
pub async fn setup_test_db() -> Option<TestDb> {
    let _ = dotenvy::dotenv();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database test");
        return None;
    };
    let base = match PgConnectOptions::from_str(&url) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("bad DATABASE_URL ({e}); skipping database test");
            return None;
        }
    };

    let admin = match PgPoolOptions::new().max_connections(1).connect_with(base.clone()).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("database unreachable ({e}); skipping database test");
            return None;
        }
    };

    let name = format!("studio_test_{}", hex::encode(rand::random::<[u8; 6]>()));
    sqlx::query(&format!("CREATE DATABASE \"{name}\""))
        .execute(&admin)
        .await
        .expect("create test database");

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect_with(base.database(&name))
        .await
        .expect("connect to test database");
    studio::db::run_migrations(&pool).await.expect("run migrations");

    Some(TestDb { pool, admin, name })
}

/// Member with a known password. `role` is `member` or `admin`.
pub async fn create_member(pool: &PgPool, email: &str, name: &str, role: &str) -> i64 {
    member::create(
        pool,
        &NewMember {
            email: email.to_string(),
            name: Some(name.to_string()),
            password_hash: password::hash_password(TEST_PASS).expect("hash"),
            role: role.to_string(),
        },
    )
    .await
    .expect("create member")
}

/// Member who also has an instructor profile.
pub async fn create_instructor(pool: &PgPool, email: &str, name: &str) -> i64 {
    let id = create_member(pool, email, name, "member").await;
    instructor::upsert(pool, id, name).await.expect("create instructor");
    id
}

pub async fn create_promotion(pool: &PgPool, name: &str, bonus: i32, active: bool) -> i64 {
    sqlx::query_scalar("INSERT INTO promotions (name, bonus_sessions, is_active) VALUES ($1, $2, $3) RETURNING id")
        .bind(name)
        .bind(bonus)
        .bind(active)
        .fetch_one(pool)
        .await
        .expect("create promotion")
}
