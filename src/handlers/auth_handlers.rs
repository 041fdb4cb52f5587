use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use askama::Template;
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::session::{self, CurrentUser, Roles, get_member_id, safe_next};
use crate::auth::{csrf, password, rate_limit::RateLimiter, validate};
use crate::config::Config;
use crate::errors::{AppError, render, see_other};
use crate::models::member::{self, NewMember};
use crate::models::instructor;
use crate::templates_structs::{ForbiddenTemplate, HomeTemplate, LoginTemplate, SignupTemplate};

const LANDING_PAGE: &str = "/mypage";
const BAD_CREDENTIALS: &str = "Invalid e-mail or password";
const DUPLICATE_EMAIL: &str = "An account with this e-mail already exists";

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub next: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

fn landing(next: Option<&str>) -> String {
    safe_next(next).unwrap_or_else(|| LANDING_PAGE.to_string())
}

/// GET /
pub async fn home(config: web::Data<Config>, session: Session) -> Result<HttpResponse, AppError> {
    render(HomeTemplate {
        app_name: config.app_name.clone(),
        signed_in: get_member_id(&session).is_some(),
    })
}

/// GET /403
pub async fn forbidden(config: web::Data<Config>, session: Session) -> Result<HttpResponse, AppError> {
    let body = ForbiddenTemplate {
        app_name: config.app_name.clone(),
        signed_in: get_member_id(&session).is_some(),
    }
    .render()?;
    Ok(HttpResponse::Forbidden()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

/// GET /login: signed-in visitors go straight to `next`.
pub async fn login_page(
    config: web::Data<Config>,
    session: Session,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse, AppError> {
    if get_member_id(&session).is_some() {
        return Ok(see_other(&landing(query.next.as_deref())));
    }

    render(LoginTemplate {
        app_name: config.app_name.clone(),
        csrf_token: csrf::get_or_create_token(&session),
        error: None,
        email: String::new(),
        next: safe_next(query.next.as_deref()).unwrap_or_default(),
    })
}

/// POST /login: rate-limited per client IP.
pub async fn login_submit(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    form: web::Form<LoginForm>,
    limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let retry = |error: &str| {
        render(LoginTemplate {
            app_name: config.app_name.clone(),
            csrf_token: csrf::get_or_create_token(&session),
            error: Some(error.to_string()),
            email: form.email.trim().to_string(),
            next: safe_next(Some(&form.next)).unwrap_or_default(),
        })
    };

    // Rate-limit check before any database access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));
    if limiter.is_blocked(ip) {
        return retry("Too many failed sign-in attempts. Please try again later.");
    }

    let found = member::find_by_email(&pool, &form.email).await?;
    let account = match found {
        Some(a) if password::verify_password(&form.password, &a.password_hash) => a,
        _ => {
            limiter.record_failure(ip);
            log::info!("Failed sign-in for {}", form.email.trim());
            return retry(BAD_CREDENTIALS);
        }
    };
    limiter.clear(ip);

    let teaches = instructor::exists(&pool, account.id).await?;
    let user = CurrentUser {
        id: account.id,
        display_name: member::display_name(account.name.as_deref(), &account.email).to_string(),
        email: account.email,
        roles: Roles::for_member(&account.role, teaches),
    };
    session::sign_in(&session, &user)?;
    log::info!("Member {} signed in", user.id);

    Ok(see_other(&landing(Some(&form.next))))
}

/// GET /signup
pub async fn signup_page(
    config: web::Data<Config>,
    session: Session,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse, AppError> {
    if get_member_id(&session).is_some() {
        return Ok(see_other(&landing(query.next.as_deref())));
    }

    render(SignupTemplate {
        app_name: config.app_name.clone(),
        csrf_token: csrf::get_or_create_token(&session),
        errors: vec![],
        email: String::new(),
        name: String::new(),
        next: safe_next(query.next.as_deref()).unwrap_or_default(),
    })
}

/// POST /signup: create the account and sign it in.
pub async fn signup_submit(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    session: Session,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let retry = |errors: Vec<String>| {
        render(SignupTemplate {
            app_name: config.app_name.clone(),
            csrf_token: csrf::get_or_create_token(&session),
            errors,
            email: form.email.trim().to_string(),
            name: form.name.trim().to_string(),
            next: safe_next(Some(&form.next)).unwrap_or_default(),
        })
    };

    let errors = validate::validate_signup(&form.email, &form.name, &form.password);
    if !errors.is_empty() {
        return retry(errors);
    }
    if member::email_exists(&pool, &form.email).await? {
        return retry(vec![DUPLICATE_EMAIL.to_string()]);
    }

    let new = NewMember {
        email: form.email.trim().to_string(),
        name: Some(form.name.trim().to_string()),
        password_hash: password::hash_for_signup(&form.password)?,
        role: "member".to_string(),
    };
    let id = match member::create(&pool, &new).await {
        Ok(id) => id,
        Err(AppError::Db(sqlx::Error::Database(e))) if e.is_unique_violation() => {
            return retry(vec![DUPLICATE_EMAIL.to_string()]);
        }
        Err(e) => return Err(e),
    };

    let user = CurrentUser {
        id,
        email: new.email,
        display_name: form.name.trim().to_string(),
        roles: Roles::default(),
    };
    session::sign_in(&session, &user)?;
    session::flash_success(&session, "Welcome! Your account is ready.");
    log::info!("Member {id} signed up");

    Ok(see_other(&landing(Some(&form.next))))
}

/// POST /logout
pub async fn logout(session: Session, form: web::Form<CsrfOnly>) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    session.purge();
    Ok(see_other("/login"))
}
