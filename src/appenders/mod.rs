//! Appender implementations

pub mod console;
pub mod rotating_file;

pub use console::ConsoleAppender;
pub use rotating_file::{
    next_numeric_path, remove_stale_logs, FileHandling, FileTag, RotatingFileAppender,
    MAX_NUMERIC_TAG,
};

pub use crate::core::Appender;
