use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::PgPool;

use crate::audit::{self, Action};
use crate::auth::csrf;
use crate::auth::session::{CurrentUser, current_user, flash_error, flash_success};
use crate::config::Config;
use crate::errors::{AppError, db_message, render, see_other};
use crate::models::calendar;
use crate::models::pass::{self, BonusForm, BonusTarget, PassRow, applied_message};
use crate::templates_structs::{BonusTemplate, PageContext, PassRowView};

const PAGE: &str = "/admin/bonus";

#[derive(Deserialize)]
pub struct SearchQuery {
    pub email: Option<String>,
}

struct FormEcho {
    pass_id: String,
    bonus_name: String,
    bonus_count: String,
}

fn row_view(row: &PassRow, config: &Config) -> PassRowView {
    PassRowView {
        id: row.id,
        title: row.title_or_default().to_string(),
        bonus_name: row.bonus_name.clone().unwrap_or_default(),
        remaining: row.remaining_sessions,
        total: row.total_sessions,
        bonus_sessions: row.bonus_sessions.unwrap_or(0),
        created: calendar::format_local(row.created_at, config.utc_offset, "%Y-%m-%d %H:%M"),
    }
}

async fn render_page(
    pool: &PgPool,
    config: &Config,
    session: &Session,
    user: &CurrentUser,
    email: Option<&str>,
    echo: FormEcho,
) -> Result<HttpResponse, AppError> {
    let email = email.map(str::trim);
    let (passes, search_error) = match email {
        None => (Vec::new(), None),
        Some("") => (Vec::new(), Some("Enter the member's e-mail".to_string())),
        Some(e) => match pass::list_by_email(pool, e).await {
            Ok(rows) => (rows.iter().map(|r| row_view(r, config)).collect(), None),
            Err(err) => {
                log::error!("admin_list_passes_by_email failed: {err}");
                (Vec::new(), Some(format!("Search failed: {}", db_message(&err))))
            }
        },
    };

    let ctx = PageContext::for_user(session, config, user, PAGE);
    render(BonusTemplate {
        ctx,
        email: email.unwrap_or_default().to_string(),
        searched: email.is_some_and(|e| !e.is_empty()),
        search_error,
        passes,
        pass_id: echo.pass_id,
        bonus_name: echo.bonus_name,
        bonus_count: echo.bonus_count,
    })
}

/// GET /admin/bonus: passes of `?email=` and the bonus form.
pub async fn bonus_page(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    let echo = FormEcho { pass_id: String::new(), bonus_name: String::new(), bonus_count: String::new() };
    render_page(&pool, &config, &session, &user, query.email.as_deref(), echo).await
}

/// POST /admin/bonus: add bonus sessions to one pass or to the latest.
pub async fn bonus_submit(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    form: web::Form<BonusForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let user = current_user(&session)?;

    let echo = FormEcho {
        pass_id: form.pass_id.clone(),
        bonus_name: form.bonus_name.clone(),
        bonus_count: form.bonus_count.clone(),
    };
    let email = Some(form.email.as_str()).filter(|e| !e.trim().is_empty());

    let input = match form.validate() {
        Ok(input) => input,
        Err(e) => {
            flash_error(&session, e);
            return render_page(&pool, &config, &session, &user, email, echo).await;
        }
    };

    let applied = match &input.target {
        BonusTarget::Pass(id) => pass::add_bonus_to_pass(&pool, *id, &input.name, input.count).await,
        BonusTarget::LatestFor(email) => pass::add_bonus_to_latest(&pool, email, &input.name, input.count).await,
    };
    let pass_id = match applied {
        Ok(id) => id,
        Err(e) => {
            log::error!("bonus for {:?} failed: {e}", input.target);
            flash_error(&session, format!("Apply failed: {}", db_message(&e)));
            return render_page(&pool, &config, &session, &user, email, echo).await;
        }
    };

    let summary = format!("{} +{}", input.name, input.count);
    audit::log(&pool, user.id, Action::BonusApplied, pass_id, &summary).await;
    flash_success(&session, applied_message(&input.target, pass_id));

    let location = match email {
        Some(e) => format!("{PAGE}?{}", serde_urlencoded::to_string([("email", e.trim())]).unwrap_or_default()),
        None => PAGE.to_string(),
    };
    Ok(see_other(&location))
}
