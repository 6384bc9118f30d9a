//! Logging macros for ergonomic log message formatting.
//!
//! Each macro takes the manager, the module the message belongs to, and a
//! `format!`-style message. The call site's module path, file and line are
//! captured so diagnostic-level messages can carry a location.
//!
//! # Examples
//!
//! ```
//! use rust_module_logger::prelude::*;
//! use rust_module_logger::info;
//!
//! let manager = LogManager::new();
//!
//! // Basic logging
//! info!(manager, "net", "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(manager, "net", "Server listening on port {}", port);
//! ```

/// Emit a message at the given level with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_module_logger::prelude::*;
/// # let manager = LogManager::new();
/// use rust_module_logger::log;
/// log!(manager, "db", LogLevel::Info, "Simple message");
/// log!(manager, "db", LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($manager:expr, $module:expr, $level:expr, $($arg:tt)+) => {
        $manager.emit(
            $module,
            $level,
            format!($($arg)+),
            $crate::SourceLocation::new(module_path!(), file!(), line!()),
        )
    };
}

/// Emit a trace-level message.
///
/// ```
/// # use rust_module_logger::prelude::*;
/// # let manager = LogManager::new();
/// use rust_module_logger::trace;
/// trace!(manager, "calc", "Entering function: calculate()");
/// ```
#[macro_export]
macro_rules! trace {
    ($manager:expr, $module:expr, $($arg:tt)+) => {
        $crate::log!($manager, $module, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Emit a debug-level message.
#[macro_export]
macro_rules! debug {
    ($manager:expr, $module:expr, $($arg:tt)+) => {
        $crate::log!($manager, $module, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Emit an info-level message.
#[macro_export]
macro_rules! info {
    ($manager:expr, $module:expr, $($arg:tt)+) => {
        $crate::log!($manager, $module, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Emit a warning-level message.
///
/// ```
/// # use rust_module_logger::prelude::*;
/// # let manager = LogManager::new();
/// use rust_module_logger::warning;
/// warning!(manager, "disk", "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warning {
    ($manager:expr, $module:expr, $($arg:tt)+) => {
        $crate::log!($manager, $module, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Emit an error-level message.
#[macro_export]
macro_rules! error {
    ($manager:expr, $module:expr, $($arg:tt)+) => {
        $crate::log!($manager, $module, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Emit a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($manager:expr, $module:expr, $($arg:tt)+) => {
        $crate::log!($manager, $module, $crate::LogLevel::Fatal, $($arg)+)
    };
}
