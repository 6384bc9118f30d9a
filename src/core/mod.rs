//! Core logger types and traits

pub mod appender;
pub mod config;
pub mod destination;
pub mod error;
pub mod log_entry;
pub mod log_level;
pub mod log_mode;
pub mod manager;
pub mod message_format;
pub mod metrics;
pub mod timestamp;

pub use appender::{Appender, FormattedRecord};
pub use config::{
    DestinationOptions, DestinationSettings, LoggerConfig, DEFAULT_BACKLOG_CAPACITY,
    DEFAULT_MAX_FILE_SIZE, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use destination::{DestinationSinks, DestinationWriter, WriterState};
pub use error::{LoggerError, Result};
pub use log_entry::{current_thread_id, PendingMessage, SourceLocation};
pub use log_level::LogLevel;
pub use log_mode::LogMode;
pub use manager::{LogManager, LogManagerBuilder};
pub use message_format::{MessageFields, MessageFormat};
pub use metrics::LoggerMetrics;
pub use timestamp::TimestampFormat;
