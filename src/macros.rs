//! Logging macros for ergonomic message formatting.
//!
//! These macros check the level before formatting, so disabled calls cost
//! one atomic load and never build the message string.
//!
//! # Examples
//!
//! ```
//! use rust_context_logger::prelude::*;
//! use rust_context_logger::info;
//!
//! let sink = MemorySink::new();
//! let pipeline = Pipeline::new(sink.clone());
//! let logger = pipeline.logger("server");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! assert_eq!(sink.lines(), vec!["server [info.] [] Server listening on port 8080"]);
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_context_logger::prelude::*;
/// # let pipeline = Pipeline::new(MemorySink::new());
/// # let logger = pipeline.logger("app");
/// use rust_context_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            logger.log(level, format!($($arg)+));
        }
    }};
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_context_logger::prelude::*;
/// # let pipeline = Pipeline::new(MemorySink::new());
/// # let logger = pipeline.logger("app");
/// use rust_context_logger::warn;
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}
