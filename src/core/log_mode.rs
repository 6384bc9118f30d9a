//! Output modes for a destination
//!
//! The mode decides where a destination's worker sends each batch. It is read
//! at enqueue time (a disabled destination drops messages outright) and again
//! at write time, so a live mode change applies to the next batch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a destination writes its messages
///
/// # Example
///
/// ```
/// use rust_module_logger::LogMode;
///
/// assert_eq!(LogMode::default(), LogMode::OnlyFile);
/// assert!(LogMode::Full.writes_file() && LogMode::Full.writes_console());
/// assert!(!LogMode::Disabled.is_enabled());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LogMode {
    /// Messages are dropped at enqueue
    Disabled,

    /// Print to the console only; no file is touched
    OnlyConsole,

    /// Append to the destination file only
    #[default]
    OnlyFile,

    /// Append to the file and echo to the console
    Full,
}

impl LogMode {
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, LogMode::Disabled)
    }

    #[inline]
    pub fn writes_file(&self) -> bool {
        matches!(self, LogMode::OnlyFile | LogMode::Full)
    }

    #[inline]
    pub fn writes_console(&self) -> bool {
        matches!(self, LogMode::OnlyConsole | LogMode::Full)
    }
}

impl fmt::Display for LogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogMode::Disabled => write!(f, "Disabled"),
            LogMode::OnlyConsole => write!(f, "OnlyConsole"),
            LogMode::OnlyFile => write!(f, "OnlyFile"),
            LogMode::Full => write!(f, "Full"),
        }
    }
}
