//! # Rust Module Logger
//!
//! A module-routed logging core: callers emit leveled messages tagged with a
//! module name, and each module is bound to a destination that filters,
//! batches and writes them on its own worker thread.
//!
//! ## Features
//!
//! - **Module Routing**: each module is bound to at most one destination
//! - **Early Messages Kept**: messages for unbound modules wait in a bounded backlog
//! - **Asynchronous Writers**: one worker per destination; emitting never waits on I/O
//! - **Size Rotation**: split files by size with date-time or numeric tags
//!
//! ## Example
//!
//! ```no_run
//! use rust_module_logger::prelude::*;
//!
//! let manager = LogManager::new();
//! manager.add_destination("network", ["net"], DestinationOptions::new().level(LogLevel::Warning));
//!
//! manager.error("net", "connection reset");
//! manager.close_all();
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, FileHandling, FileTag, RotatingFileAppender};
    pub use crate::core::{
        Appender, DestinationOptions, DestinationWriter, LogLevel, LogManager, LogManagerBuilder,
        LogMode, LoggerConfig, LoggerError, LoggerMetrics, MessageFields, MessageFormat,
        Result, SourceLocation, WriterState, DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

pub use appenders::{ConsoleAppender, FileHandling, FileTag, RotatingFileAppender};
pub use core::{
    Appender, DestinationOptions, DestinationSettings, DestinationWriter, FormattedRecord,
    LogLevel, LogManager, LogManagerBuilder, LogMode, LoggerConfig, LoggerError, LoggerMetrics,
    MessageFields, MessageFormat, PendingMessage, Result, SourceLocation, TimestampFormat,
    WriterState, DEFAULT_BACKLOG_CAPACITY, DEFAULT_MAX_FILE_SIZE, DEFAULT_SHUTDOWN_TIMEOUT,
};
