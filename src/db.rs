use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::password;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::member::{self, NewMember};

pub async fn init_pool(config: &Config) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Create the bootstrap admin from ADMIN_EMAIL / ADMIN_PASSWORD when no
/// account with that e-mail exists yet. An existing account is promoted.
pub async fn seed_admin(pool: &PgPool, config: &Config) -> Result<(), AppError> {
    let (Some(email), Some(pass)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    if let Some(existing) = member::find_by_email(pool, email).await? {
        if existing.role != "admin" {
            member::set_role(pool, existing.id, "admin").await?;
            log::info!("Promoted {email} to admin");
        }
        return Ok(());
    }

    let password_hash = password::hash_password(pass).map_err(AppError::Hash)?;
    let id = member::create(
        pool,
        &NewMember {
            email: email.clone(),
            name: Some("Administrator".to_string()),
            password_hash,
            role: "admin".to_string(),
        },
    )
    .await?;
    log::info!("Created bootstrap admin {email} (#{id})");
    Ok(())
}
