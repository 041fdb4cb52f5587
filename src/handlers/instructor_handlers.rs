use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;

use crate::audit::{self, Action};
use crate::auth::csrf;
use crate::auth::session::{CurrentUser, current_user, flash_error, flash_success, require_session_manager};
use crate::config::Config;
use crate::errors::{AppError, render, see_other};
use crate::handlers::calendar_handlers::{NOT_FOUND_OR_NOT_YOURS, resolve_member};
use crate::models::calendar::{self, MonthKey};
use crate::models::class_session::{
    self, DEFAULT_LESSON_MINUTES, LessonForm, MemberRef, QuickSessionForm, Scope, SessionStatus, SessionWrite,
    title_or, QUICK_TITLE,
};
use crate::models::member::{self, MemberOption};
use crate::templates_structs::{InstructorSessionsTemplate, LessonFormValues, PageContext, ScheduleTemplate};

const SESSIONS_PAGE: &str = "/instructor/sessions";
const SCHEDULE_PAGE: &str = "/instructor/schedule";

#[derive(Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Deserialize)]
pub struct RenameForm {
    #[serde(default)]
    pub title: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct LookupQuery {
    pub email: Option<String>,
}

/// Instructor column for rows the caller creates. Admins without an
/// instructor profile leave it empty.
fn own_instructor(user: &CurrentUser) -> Option<i64> {
    if user.is_instructor() { Some(user.id) } else { None }
}

/// GET /instructor/sessions: own sessions for one month.
pub async fn sessions_page(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    require_session_manager(&user)?;

    let offset = config.utc_offset;
    let key = MonthKey::from_query(query.month.as_deref(), calendar::today(offset));
    let range = calendar::month_range(key, offset);
    let rows = class_session::list_in_range(&pool, range, Scope::for_user(&user), true).await?;
    let now = Utc::now();

    let ctx = PageContext::for_user(&session, &config, &user, SESSIONS_PAGE);
    render(InstructorSessionsTemplate {
        ctx,
        month_label: key.label(),
        prev_href: format!("{SESSIONS_PAGE}?month={}", key.prev().label()),
        next_href: format!("{SESSIONS_PAGE}?month={}", key.next().label()),
        sessions: rows.iter().map(|s| s.to_view(offset, now)).collect(),
    })
}

/// POST /instructor/sessions: quick create from the list page.
pub async fn quick_create(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    form: web::Form<QuickSessionForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let user = current_user(&session)?;
    require_session_manager(&user)?;

    let (title, starts_at, ends_at) = match form.validate(config.utc_offset) {
        Ok(v) => v,
        Err(e) => {
            flash_error(&session, e);
            return Ok(see_other(SESSIONS_PAGE));
        }
    };
    let member_ref = match MemberRef::parse(&form.member) {
        Ok(m) => m,
        Err(e) => {
            flash_error(&session, e);
            return Ok(see_other(SESSIONS_PAGE));
        }
    };
    let member_id = match resolve_member(&pool, &member_ref).await? {
        Ok(id) => id,
        Err(e) => {
            flash_error(&session, e);
            return Ok(see_other(SESSIONS_PAGE));
        }
    };

    let write = SessionWrite {
        title,
        starts_at,
        ends_at,
        status: SessionStatus::Scheduled,
        location: None,
        memo: None,
        instructor_id: own_instructor(&user),
        member_id,
    };
    let id = class_session::create(&pool, &write).await?;
    audit::log(&pool, user.id, Action::SessionCreated, id, &write.title).await;
    flash_success(&session, "Session created");

    let key = MonthKey::from_date(calendar::local_date(starts_at, config.utc_offset));
    Ok(see_other(&format!("{SESSIONS_PAGE}?month={}", key.label())))
}

/// POST /instructor/sessions/{id}/title
pub async fn rename(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<RenameForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let user = current_user(&session)?;
    require_session_manager(&user)?;
    let id = path.into_inner();

    let title = title_or(&form.title, QUICK_TITLE);
    if class_session::update_title(&pool, id, &title, user.owner_filter()).await? {
        audit::log(&pool, user.id, Action::SessionUpdated, id, &title).await;
        flash_success(&session, "Title updated");
    } else {
        flash_error(&session, NOT_FOUND_OR_NOT_YOURS);
    }
    Ok(see_other(SESSIONS_PAGE))
}

/// POST /instructor/sessions/{id}/delete
pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let user = current_user(&session)?;
    require_session_manager(&user)?;
    let id = path.into_inner();

    if class_session::delete(&pool, id, user.owner_filter()).await? {
        audit::log(&pool, user.id, Action::SessionDeleted, id, "").await;
        flash_success(&session, "Session deleted");
    } else {
        flash_error(&session, NOT_FOUND_OR_NOT_YOURS);
    }
    Ok(see_other(SESSIONS_PAGE))
}

/// Member for the lookup box, or the message to show.
async fn lookup_member(pool: &PgPool, email: &str) -> Result<Result<MemberOption, String>, AppError> {
    if email.trim().is_empty() {
        return Ok(Err("Enter the member's e-mail".to_string()));
    }
    let Some(id) = member::id_by_email(pool, email.trim()).await? else {
        return Ok(Err("No member with that e-mail".to_string()));
    };
    Ok(match member::find_by_id(pool, id).await? {
        Some(m) => Ok(MemberOption { id: m.id, email: m.email, name: m.name }),
        None => Err("No member with that e-mail".to_string()),
    })
}

/// GET /instructor/schedule: private lesson form, with `?email=` looking up the member.
pub async fn schedule_page(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<LookupQuery>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    require_session_manager(&user)?;

    let email = query.email.clone().unwrap_or_default();
    let (member, lookup_error) = match query.email.as_deref() {
        None => (None, None),
        Some(raw) => match lookup_member(&pool, raw).await? {
            Ok(m) => (Some(m), None),
            Err(e) => (None, Some(e)),
        },
    };

    let ctx = PageContext::for_user(&session, &config, &user, SCHEDULE_PAGE);
    render(ScheduleTemplate {
        ctx,
        email: email.trim().to_string(),
        member,
        lookup_error,
        values: LessonFormValues::default(),
        default_minutes: DEFAULT_LESSON_MINUTES,
    })
}

/// POST /instructor/schedule: book a private lesson for the looked-up member.
pub async fn schedule_save(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    form: web::Form<LessonForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let user = current_user(&session)?;
    require_session_manager(&user)?;

    let back = match form.email.trim() {
        "" => SCHEDULE_PAGE.to_string(),
        email => format!(
            "{SCHEDULE_PAGE}?{}",
            serde_urlencoded::to_string([("email", email)]).unwrap_or_default()
        ),
    };

    let lesson = match form.validate(config.utc_offset) {
        Ok(l) => l,
        Err(e) => {
            flash_error(&session, e);
            return Ok(see_other(&back));
        }
    };
    if member::find_by_id(&pool, lesson.member_id).await?.is_none() {
        flash_error(&session, "No member with that e-mail");
        return Ok(see_other(SCHEDULE_PAGE));
    }

    let write = SessionWrite {
        title: lesson.title,
        starts_at: lesson.starts_at,
        ends_at: Some(lesson.ends_at),
        status: SessionStatus::Scheduled,
        location: None,
        memo: lesson.memo,
        instructor_id: own_instructor(&user),
        member_id: Some(lesson.member_id),
    };
    let id = class_session::create(&pool, &write).await?;
    audit::log(&pool, user.id, Action::SessionCreated, id, &write.title).await;
    flash_success(
        &session,
        format!(
            "Booked {} on {}. The member can see it on their calendar.",
            write.title,
            calendar::format_local(write.starts_at, config.utc_offset, "%Y-%m-%d %H:%M")
        ),
    );
    Ok(see_other(&back))
}
