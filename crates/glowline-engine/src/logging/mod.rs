//! Logging utilities.
//!
//! The engine only emits through the `log` facade; hosts that do not bring
//! their own logger can call [`init_logging`] once at startup.

mod init;

pub use init::{init_logging, LoggingConfig};
