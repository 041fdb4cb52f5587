pub mod calendar;
pub mod class_session;
pub mod instructor;
pub mod member;
pub mod pass;
