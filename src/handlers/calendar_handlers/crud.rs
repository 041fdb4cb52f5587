use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::PgPool;

use crate::audit::{self, Action};
use crate::auth::csrf;
use crate::auth::session::{CurrentUser, current_user, flash_error, flash_success, require_session_manager};
use crate::config::Config;
use crate::errors::{AppError, render, see_other};
use crate::models::calendar::{self, MonthKey};
use crate::models::class_session::{
    self, ClassSession, MemberRef, SessionDraft, SessionForm, SessionStatus, SessionWrite, choose_instructor,
};
use crate::models::{instructor, member};
use crate::templates_structs::{PageContext, SessionFormTemplate, SessionFormValues};

pub const NOT_FOUND_OR_NOT_YOURS: &str = "Session not found or not yours";

#[derive(Deserialize)]
pub struct NewQuery {
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

/// Member id for the member field, or a user-facing error.
pub async fn resolve_member(pool: &PgPool, member: &MemberRef) -> Result<Result<Option<i64>, String>, AppError> {
    Ok(match member {
        MemberRef::None => Ok(None),
        MemberRef::Id(id) => match member::find_by_id(pool, *id).await? {
            Some(m) => Ok(Some(m.id)),
            None => Err(format!("No member with id {id}")),
        },
        MemberRef::Email(email) => match member::id_by_email(pool, email).await? {
            Some(id) => Ok(Some(id)),
            None => Err("No member with that e-mail".to_string()),
        },
    })
}

/// Turn a validated draft into the row to write. On create the instructor
/// falls back to the caller; on update a blank choice keeps the current one.
async fn resolve_draft(
    pool: &PgPool,
    user: &CurrentUser,
    draft: SessionDraft,
    creating: bool,
) -> Result<Result<SessionWrite, Vec<String>>, AppError> {
    let mut errors = Vec::new();

    let instructor_id = if creating {
        match choose_instructor(draft.instructor_id, user.id, user.is_instructor()) {
            Ok(id) => Some(id),
            Err(e) => {
                errors.push(e);
                None
            }
        }
    } else {
        draft.instructor_id
    };
    if let Some(id) = instructor_id {
        if !instructor::exists(pool, id).await? {
            errors.push("Selected instructor does not exist".to_string());
        }
    }

    let member_id = match resolve_member(pool, &draft.member).await? {
        Ok(id) => id,
        Err(e) => {
            errors.push(e);
            None
        }
    };

    if !errors.is_empty() {
        return Ok(Err(errors));
    }
    Ok(Ok(SessionWrite {
        title: draft.title,
        starts_at: draft.starts_at,
        ends_at: Some(draft.ends_at),
        status: draft.status,
        location: draft.location,
        memo: draft.memo,
        instructor_id,
        member_id,
    }))
}

fn values_from_form(form: &SessionForm) -> SessionFormValues {
    SessionFormValues {
        title: form.title.clone(),
        start_at: form.start_at.clone(),
        end_at: form.end_at.clone(),
        status: form.status.clone(),
        location: form.location.clone(),
        instructor_id: form.instructor_id.clone(),
        member: form.member.clone(),
        memo: form.memo.clone(),
    }
}

fn values_from_session(s: &ClassSession, config: &Config) -> SessionFormValues {
    SessionFormValues {
        title: s.title.clone(),
        start_at: calendar::to_local_input(s.starts_at, config.utc_offset),
        end_at: calendar::to_local_input(s.end(), config.utc_offset),
        status: s.status().as_str().to_string(),
        location: s.location.clone().unwrap_or_default(),
        instructor_id: s.instructor_id.map(|id| id.to_string()).unwrap_or_default(),
        member: s
            .member_email
            .clone()
            .or_else(|| s.member_id.map(|id| id.to_string()))
            .unwrap_or_default(),
        memo: s.memo.clone().unwrap_or_default(),
    }
}

async fn render_form(
    pool: &PgPool,
    config: &Config,
    session: &Session,
    user: &CurrentUser,
    session_id: Option<i64>,
    values: SessionFormValues,
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let (form_title, form_action) = match session_id {
        Some(id) => ("Edit session".to_string(), format!("/calendar/sessions/{id}")),
        None => ("New session".to_string(), "/calendar/sessions".to_string()),
    };
    let instructors = instructor::list(pool).await?;
    let ctx = PageContext::for_user(session, config, user, "/calendar");
    render(SessionFormTemplate {
        ctx,
        form_title,
        form_action,
        session_id,
        instructor_options: values.instructor_options(&instructors),
        status_options: values.status_options(),
        values,
        errors,
    })
}

fn month_href(starts_at: chrono::DateTime<chrono::Utc>, config: &Config) -> String {
    let key = MonthKey::from_date(calendar::local_date(starts_at, config.utc_offset));
    format!("/calendar?month={}", key.label())
}

/// GET /calendar/sessions/new: empty editor, prefilled from `?date=`.
pub async fn new_form(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    query: web::Query<NewQuery>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    require_session_manager(&user)?;

    let day = query
        .date
        .as_deref()
        .and_then(calendar::parse_date)
        .unwrap_or_else(|| calendar::today(config.utc_offset));
    let values = SessionFormValues {
        start_at: format!("{}T10:00", day.format("%Y-%m-%d")),
        end_at: format!("{}T11:00", day.format("%Y-%m-%d")),
        status: SessionStatus::Scheduled.as_str().to_string(),
        instructor_id: if user.is_instructor() { user.id.to_string() } else { String::new() },
        ..Default::default()
    };
    render_form(&pool, &config, &session, &user, None, values, vec![]).await
}

/// POST /calendar/sessions: create a session and go back to its month.
pub async fn create(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    form: web::Form<SessionForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let user = current_user(&session)?;
    require_session_manager(&user)?;

    let draft = match form.validate(config.utc_offset) {
        Ok(d) => d,
        Err(errors) => {
            return render_form(&pool, &config, &session, &user, None, values_from_form(&form), errors).await;
        }
    };
    let write = match resolve_draft(&pool, &user, draft, true).await? {
        Ok(w) => w,
        Err(errors) => {
            return render_form(&pool, &config, &session, &user, None, values_from_form(&form), errors).await;
        }
    };

    let id = class_session::create(&pool, &write).await?;
    audit::log(&pool, user.id, Action::SessionCreated, id, &write.title).await;
    flash_success(&session, format!("Session \"{}\" created", write.title));
    Ok(see_other(&month_href(write.starts_at, &config)))
}

/// GET /calendar/sessions/{id}/edit: editor for a session the caller may change.
pub async fn edit_form(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&session)?;
    require_session_manager(&user)?;
    let id = path.into_inner();

    let found = class_session::find_by_id(&pool, id).await?;
    let owned = found.filter(|s| user.is_admin() || s.instructor_id == Some(user.id));
    let Some(s) = owned else {
        flash_error(&session, NOT_FOUND_OR_NOT_YOURS);
        return Ok(see_other("/calendar"));
    };

    let values = values_from_session(&s, &config);
    render_form(&pool, &config, &session, &user, Some(id), values, vec![]).await
}

/// POST /calendar/sessions/{id}: save the editor.
pub async fn update(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<SessionForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let user = current_user(&session)?;
    require_session_manager(&user)?;
    let id = path.into_inner();

    let draft = match form.validate(config.utc_offset) {
        Ok(d) => d,
        Err(errors) => {
            return render_form(&pool, &config, &session, &user, Some(id), values_from_form(&form), errors).await;
        }
    };
    let write = match resolve_draft(&pool, &user, draft, false).await? {
        Ok(w) => w,
        Err(errors) => {
            return render_form(&pool, &config, &session, &user, Some(id), values_from_form(&form), errors).await;
        }
    };

    if !class_session::update(&pool, id, &write, user.owner_filter()).await? {
        flash_error(&session, NOT_FOUND_OR_NOT_YOURS);
        return Ok(see_other("/calendar"));
    }
    audit::log(&pool, user.id, Action::SessionUpdated, id, &write.title).await;
    flash_success(&session, "Session updated");
    Ok(see_other(&month_href(write.starts_at, &config)))
}

/// POST /calendar/sessions/{id}/delete
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
    Ok(see_other("/calendar"))
}
