pub mod account_handlers;
pub mod admin_handlers;
pub mod api;
pub mod auth_handlers;
pub mod calendar_handlers;
pub mod instructor_handlers;
pub mod mypage_handlers;
