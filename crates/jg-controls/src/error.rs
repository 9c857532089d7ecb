//! Error types for actuation setup.

use thiserror::Error;

/// Result type for actuation operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while configuring actuation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Invalid argument provided to a constructor.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
