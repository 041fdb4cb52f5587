pub mod bonus;
pub mod passes;

use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::config::Config;
use crate::errors::{AppError, render};
use crate::templates_structs::{AdminIndexTemplate, PageContext};

/// GET /admin
pub async fn index(config: web::Data<Config>, session: Session) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &config, "/admin")?;
    render(AdminIndexTemplate { ctx })
}
