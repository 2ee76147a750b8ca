pub mod error;
pub mod service;

pub use error::{ConfigError, Result};
pub use service::ServiceKind;
