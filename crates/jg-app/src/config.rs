//! Controller configuration.

use crate::error::{AppError, AppResult};
use jg_program::{MAX_LINES, N_PRESETS};
use jg_upload::DEFAULT_UPLOAD_TIMEOUT_MS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables of a controller instance. Every field has a default, so a config
/// file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Reply to `id?`.
    pub identity: String,
    /// Program capacity in lines.
    pub max_lines: usize,
    pub upload_timeout_ms: u32,
    /// Minimum time between two host commands.
    pub command_poll_interval_ms: u32,
    /// Full period of the safety pulse train.
    pub safety_pulse_period_ms: u32,
    /// Line duration of the fail-safe program.
    pub failsafe_duration_ms: u32,
    /// Preset loaded at startup.
    pub startup_preset: u16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            identity: "Arduino, Jetting Grid".to_string(),
            max_lines: MAX_LINES,
            upload_timeout_ms: DEFAULT_UPLOAD_TIMEOUT_MS,
            command_poll_interval_ms: 10,
            safety_pulse_period_ms: 100,
            failsafe_duration_ms: 1000,
            startup_preset: 0,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> AppResult<()> {
        let invalid = |what: String| Err(AppError::Config { what });

        if self.identity.trim().is_empty() || self.identity.contains('\n') {
            return invalid("identity must be a non-empty single line".to_string());
        }
        if self.max_lines == 0 || self.max_lines > MAX_LINES {
            return invalid(format!(
                "max_lines = {} must be in 1..={MAX_LINES}",
                self.max_lines
            ));
        }
        if self.upload_timeout_ms == 0 {
            return invalid("upload_timeout_ms must be positive".to_string());
        }
        if self.safety_pulse_period_ms < 2 {
            return invalid(format!(
                "safety_pulse_period_ms = {} must be at least 2",
                self.safety_pulse_period_ms
            ));
        }
        if self.failsafe_duration_ms == 0 {
            return invalid("failsafe_duration_ms must be positive".to_string());
        }
        if self.startup_preset >= N_PRESETS {
            return invalid(format!(
                "startup_preset = {} must be below {N_PRESETS}",
                self.startup_preset
            ));
        }
        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let config: ControllerConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_yaml(path: &Path) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_yaml_str(&content)
    }
}
