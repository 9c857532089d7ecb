//! Error types for framing, upload and host-side encoding.

use jg_core::{Fault, FaultCode};
use jg_program::ProgramError;
use thiserror::Error;

/// Result type for upload steps. `Err` is always fatal.
pub type UploadResult<T> = Result<T, UploadFault>;

/// Result type for host-side program handling.
pub type HostResult<T> = Result<T, HostError>;

/// Byte stream framing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// More bytes arrived than the receive buffer holds without a terminator.
    #[error("Stream command buffer overrun (capacity {capacity} bytes)")]
    Overrun { capacity: usize },
}

/// Reasons an upload ends without installing the uploaded program.
///
/// These are reported to the host and answered with the fail-safe program;
/// they never halt the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Requested {requested} lines, but the maximum is {max}")]
    CapacityExceeded { requested: usize, max: usize },

    #[error("Promised {promised} lines, but {received} were received")]
    CountMismatch { promised: usize, received: usize },

    #[error("Upload timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u32 },

    /// A frame too short to carry a duration.
    #[error("Malformed frame of {len} byte(s)")]
    MalformedFrame { len: usize },

    #[error("Upload cancelled")]
    Cancelled,
}

/// Fatal conditions met while uploading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadFault {
    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error(transparent)]
    Program(#[from] ProgramError),
}

impl UploadFault {
    /// Fault record to hand to the fault sink.
    pub fn to_fault(&self) -> Fault {
        match self {
            UploadFault::Framing(e) => Fault::new(FaultCode::FRAMING_OVERRUN, e.to_string()),
            UploadFault::Program(e) => e.to_fault(),
        }
    }
}

/// Errors in a host-side program description.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Program name must not be empty")]
    EmptyName,

    #[error("Program name must be a single line")]
    MultilineName,

    #[error("Program has {count} lines, but the maximum is {max}")]
    TooManyLines { count: usize, max: usize },

    #[error("Line {line}: point ({x}, {y}) is off the grid")]
    PointOutOfRange { line: usize, x: i8, y: i8 },

    #[error("Line {line}: {count} points, but the maximum is {max}")]
    TooManyPoints { line: usize, count: usize, max: usize },

    /// An empty line whose duration ends in 0xFF runs into the EOL sentinel.
    #[error("Line {line}: duration {duration_ms} ms without points collides with the EOL sentinel")]
    SentinelCollision { line: usize, duration_ms: u16 },

    #[error("Invalid generator parameter: {what}")]
    InvalidParams { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
