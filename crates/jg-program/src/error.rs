//! Error types for program storage and playback.

use jg_core::{CoreError, Fault, FaultCode};
use thiserror::Error;

/// Result type for program operations.
pub type ProgramResult<T> = Result<T, ProgramError>;

/// Errors raised by the program store, playback and presets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    /// The store already holds as many lines as it has room for.
    #[error("Program is full: capacity is {capacity} lines")]
    CapacityExceeded { capacity: usize },

    /// A line index escaped clamping. Only reachable through an internal bug.
    #[error("Line index out of range (index={index}, len={len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unknown preset {0}")]
    UnknownPreset(u16),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ProgramError {
    /// Whether this error must halt all actuation.
    pub fn is_fatal(&self) -> bool {
        match self {
            ProgramError::IndexOutOfRange { .. } => true,
            ProgramError::Core(e) => e.is_fatal(),
            ProgramError::CapacityExceeded { .. } | ProgramError::UnknownPreset(_) => false,
        }
    }

    /// Fault record to hand to the fault sink.
    pub fn to_fault(&self) -> Fault {
        match self {
            ProgramError::Core(e) => Fault::from(e),
            other => Fault::new(FaultCode::INDEX_OUT_OF_RANGE, other.to_string()),
        }
    }
}
