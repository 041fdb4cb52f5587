use actix_session::SessionExt;
use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web,
};
use sqlx::PgPool;

use crate::auth::session::{ROLE_ADMIN, get_member_id, get_roles};
use crate::models::member;

/// `/login?next=<path and query>` for the current request.
pub fn login_redirect_target(req: &ServiceRequest) -> String {
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let encoded = serde_urlencoded::to_string([("next", path)]).unwrap_or_default();
    if encoded.is_empty() { "/login".to_string() } else { format!("/login?{encoded}") }
}

fn redirect(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location))
        .finish()
}

/// Requires a signed-in member; otherwise 303 to the login page with `next`.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let session = req.get_session();
    if get_member_id(&session).is_none() {
        let response = redirect(login_redirect_target(&req));
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Requires an admin. Signed-out visitors go to the login page, signed-in
/// non-admins to `/403`. A session without the cached `admin` role is
/// re-checked with `admin_whoami` before being turned away.
pub async fn require_admin(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let session = req.get_session();
    let Some(member_id) = get_member_id(&session) else {
        let response = redirect(login_redirect_target(&req));
        return Ok(req.into_response(response).map_into_right_body());
    };

    let mut roles = get_roles(&session);
    let allowed = if roles.has(ROLE_ADMIN) {
        true
    } else {
        let confirmed = match req.app_data::<web::Data<PgPool>>() {
            Some(pool) => match member::is_admin(pool, member_id).await {
                Ok(is_admin) => is_admin,
                Err(e) => {
                    log::error!("admin_whoami failed for member {member_id}: {e}");
                    false
                }
            },
            None => false,
        };
        if confirmed {
            // Promoted since sign-in; refresh the cached roles.
            roles.0.push(ROLE_ADMIN.to_string());
            if let Err(e) = session.insert("roles", roles.to_csv()) {
                log::warn!("Could not cache roles for member {member_id}: {e}");
            }
        }
        confirmed
    };

    if !allowed {
        log::warn!("Member {member_id} denied admin access to {}", req.path());
        let response = redirect("/403".to_string());
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Mutating JSON endpoints must be sent as `application/json`. A browser
/// cannot send that cross-origin with cookies from a plain form.
pub async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == actix_web::http::Method::POST
        || method == actix_web::http::Method::PUT
        || method == actix_web::http::Method::PATCH
        || method == actix_web::http::Method::DELETE
    {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let body = serde_json::json!({
                "error": "Content-Type must be application/json for mutation requests"
            });
            let response = HttpResponse::BadRequest().json(body);
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}
