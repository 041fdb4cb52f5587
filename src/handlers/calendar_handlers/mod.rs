pub mod crud;
pub mod page;

pub use crud::*;
pub use page::*;
