pub mod form;
pub mod queries;
pub mod types;

pub use form::*;
pub use queries::*;
pub use types::*;
