//! Application handlers.
//!
//! Each handler is a `Controller`: a display name, a table of operations and a
//! constructor that may halt the request (see `Posts`).

pub mod pages;
pub mod posts;
pub mod users;

pub use pages::Pages;
pub use posts::Posts;
pub use users::Users;

use crate::error::AppError;
use crate::routing::{HandlerRegistry, RegistryError};

/// Registry with every application handler.
pub fn registry() -> Result<HandlerRegistry, RegistryError> {
    let mut registry = HandlerRegistry::new();
    registry
        .register::<Pages>()?
        .register::<Posts>()?
        .register::<Users>()?;
    Ok(registry)
}

/// Positional parameter parsed as a record id.
///
/// A missing parameter fails the invocation; a non-numeric one names no record.
pub(crate) fn id_param(params: &[String], operation: &'static str) -> Result<i64, AppError> {
    let raw = params.first().ok_or(AppError::MissingParameter {
        operation,
        position: 0,
    })?;
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("{operation}/{raw}")))
}
