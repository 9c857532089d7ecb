//! Host link of the jetting grid controller.
//!
//! - [`framing`]: splits the inbound byte stream into text tokens and binary
//!   frames
//! - [`protocol`]: the staged upload that fills the program store
//! - [`host`]: PC-side program description and its wire encoding
//! - [`generate`]: noise-driven program generation on the PC side

pub mod error;
pub mod framing;
pub mod generate;
pub mod host;
pub mod protocol;

pub use error::{FramingError, HostError, HostResult, UploadError, UploadFault, UploadResult};
pub use framing::{EOL, FRAME_CAPACITY, HostPort, TEXT_CAPACITY};
pub use generate::{NoiseParams, generate};
pub use host::{HostLine, HostProgram, load_yaml};
pub use protocol::{
    DEFAULT_UPLOAD_TIMEOUT_MS, ReplySink, Upload, UploadEvent, UploadStage, parse_atoi,
};
