//! # dienav Utilities
//!
//! Shared logging and configuration helpers for dienav.
//!
//! The engine crates only emit `tracing` events; this crate installs the
//! subscriber that formats and routes them.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    init_file_logging, init_logging, init_logging_with_level, init_test_logging, ConsoleOutput, LogFormat, LogLevel,
    LoggingConfig, LoggingError, LoggingGuard,
};
pub use tracing::{debug, error, info, trace, warn};
