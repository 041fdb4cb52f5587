use actix_session::Session;
use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::auth::session::current_user;
use crate::config::Config;
use crate::errors::{AppError, render};
use crate::models::{calendar, member};
use crate::templates_structs::{PageContext, ProfileTemplate};

/// GET /profile
pub async fn profile(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    let member = member::find_by_id(&pool, user.id)
        .await?
        .ok_or_else(|| AppError::Session(format!("member {} no longer exists", user.id)))?;

    let ctx = PageContext::for_user(&session, &config, &user, "/profile");
    let created_label = calendar::format_local(member.created_at, config.utc_offset, "%Y-%m-%d %H:%M");
    render(ProfileTemplate {
        ctx,
        member,
        created_label,
        roles_label: user.roles.labels(),
    })
}
