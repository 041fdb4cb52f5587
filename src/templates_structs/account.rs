use askama::Template;

use super::PageContext;
use crate::models::member::Member;

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub app_name: String,
    pub signed_in: bool,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub app_name: String,
    pub csrf_token: String,
    pub error: Option<String>,
    pub email: String,
    pub next: String,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub app_name: String,
    pub csrf_token: String,
    pub errors: Vec<String>,
    pub email: String,
    pub name: String,
    pub next: String,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub member: Member,
    pub created_label: String,
    pub roles_label: String,
}

#[derive(Template)]
#[template(path = "403.html")]
pub struct ForbiddenTemplate {
    pub app_name: String,
    pub signed_in: bool,
}
