use actix_session::Session;
use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::audit::{self, Action};
use crate::auth::csrf;
use crate::auth::session::{CurrentUser, current_user, flash_error, flash_success};
use crate::config::Config;
use crate::errors::{AppError, render, see_other};
use crate::models::member;
use crate::models::pass::{self, GRANT_FAILED, GrantPassForm, granted_message};
use crate::templates_structs::{GrantFormValues, GrantPassTemplate, PageContext};

const PAGE: &str = "/admin/passes";

async fn render_page(
    pool: &PgPool,
    config: &Config,
    session: &Session,
    user: &CurrentUser,
    values: GrantFormValues,
) -> Result<HttpResponse, AppError> {
    let members = member::list_options(pool).await?;
    let promotions = pass::active_promotions(pool).await?;
    let ctx = PageContext::for_user(session, config, user, PAGE);
    render(GrantPassTemplate {
        ctx,
        member_options: values.member_options(&members),
        promo_options: values.promo_options(&promotions),
        values,
    })
}

/// GET /admin/passes: grant form with members and active promotions.
pub async fn grant_page(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    render_page(&pool, &config, &session, &user, GrantFormValues::default()).await
}

/// POST /admin/passes: validate and call `grant_pass_unified`.
pub async fn grant_submit(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    form: web::Form<GrantPassForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let user = current_user(&session)?;

    let values = GrantFormValues {
        member_id: form.member_id.clone(),
        base_sessions: form.base_sessions.clone(),
        promo_id: form.promo_id.clone(),
        event_name: form.event_name.clone(),
        bonus_sessions: form.bonus_sessions.clone(),
    };

    let input = match form.validate() {
        Ok(input) => input,
        Err(e) => {
            flash_error(&session, e.to_string());
            return render_page(&pool, &config, &session, &user, values).await;
        }
    };

    let (total, remaining) = match pass::grant(&pool, &input, user.id).await {
        Ok(Some(outcome)) => {
            let summary = format!("member #{} +{}", input.member_id, outcome.total_sessions);
            audit::log(&pool, user.id, Action::PassGranted, outcome.pass_id, &summary).await;
            (outcome.total_sessions, outcome.remaining_sessions)
        }
        Ok(None) => input.fallback_totals(),
        Err(e) => {
            log::error!("grant_pass_unified failed for member {}: {e}", input.member_id);
            flash_error(&session, GRANT_FAILED);
            return render_page(&pool, &config, &session, &user, values).await;
        }
    };

    flash_success(&session, granted_message(total, remaining));
    Ok(see_other(PAGE))
}
