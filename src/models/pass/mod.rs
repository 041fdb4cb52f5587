pub mod bonus;
pub mod grant;
pub mod queries;
pub mod types;

pub use bonus::*;
pub use grant::*;
pub use queries::*;
pub use types::*;
