//! Conditional logging macros gated by a module-level `ENABLE_LOGS` flag and
//! stamped with a module-level `LOG_TARGET`.
//!
//! Usage:
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TARGET: &str = "sensory_pulse::patterns";
//!
//! use crate::{log_debug, log_info};
//!
//! log_info!("detected {} patterns", count);
//! ```
//!
//! Setting `ENABLE_LOGS` to false silences everything below `error` for that
//! module. Errors always go through, a stage fault should never disappear.

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!(target: LOG_TARGET, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: LOG_TARGET, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: LOG_TARGET, $($arg)*);
        }
    };
}

/// Errors ignore `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!(target: LOG_TARGET, $($arg)*);
    };
}
