//! # Typist Config
//!
//! Host configuration for typist: browser endpoint, settings storage and
//! logging. Loaded from TOML with `${VAR}` substitution.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
