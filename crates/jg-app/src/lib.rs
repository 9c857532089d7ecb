//! Controller application layer for the jetting grid.
//!
//! This crate owns the single controller context and everything a frontend
//! needs to drive it: configuration, the host command set and the top-level
//! state machine. Frontends (the CLI simulator, device firmware glue) only
//! feed bytes, advance time and read replies.

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod readings;

pub use command::Command;
pub use config::ControllerConfig;
pub use controller::{Controller, FsmState, TickOutput};
pub use error::{AppError, AppResult};
pub use readings::Readings;
