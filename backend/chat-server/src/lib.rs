pub mod error;
pub mod host;
pub mod logger;


pub use error::{Result, ServerError};
pub use host::run_until;
