//! Errors surfaced by the permission API.
//!
//! Mutations that change nothing are not errors; they resolve to `false`.
//! These variants cover malformed input handed to the API.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PermissionError>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("malformed context {0:?}, expected key=value")]
    MalformedContext(String),

    #[error("malformed subject reference {0:?}, expected collection:identifier")]
    MalformedReference(String),

    #[error("empty {0} is not allowed")]
    Empty(&'static str),
}
