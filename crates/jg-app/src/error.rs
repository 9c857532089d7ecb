//! Error types for the jg-app layer.

use std::path::PathBuf;

/// Application error type wrapping the errors of the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid configuration: {what}")]
    Config { what: String },

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Program error: {0}")]
    Program(#[from] jg_program::ProgramError),

    #[error("Upload fault: {0}")]
    Upload(#[from] jg_upload::UploadFault),

    #[error("Host program error: {0}")]
    Host(#[from] jg_upload::HostError),

    #[error("Actuation setup error: {0}")]
    Control(#[from] jg_controls::ControlError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for jg-app operations.
pub type AppResult<T> = Result<T, AppError>;
