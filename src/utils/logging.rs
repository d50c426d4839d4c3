//! Logging macros gated on a module-level `ENABLE_LOGS` const, so the
//! chatty per-frame and polling loops can be silenced per module without
//! touching the global filter.
//!
//! Each module using them defines:
//! ```rust
//! const ENABLE_LOGS: bool = true;
//! ```
//! and imports the macros from the crate root.

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
