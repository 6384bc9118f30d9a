//! Timestamp formatting utilities
//!
//! Two renderings are fixed by the on-disk layout: the per-line timestamp
//! (`dd-MM-yyyy hh:mm:ss.zzz`) and the tag used in rotated file names
//! (`DD_MM_YY__HH_MM_SS`). Both use local time.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

const LOG_LINE_PATTERN: &str = "%d-%m-%Y %H:%M:%S%.3f";
const FILE_TAG_PATTERN: &str = "%d_%m_%y__%H_%M_%S";

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use rust_module_logger::core::TimestampFormat;
/// use chrono::{Local, TimeZone};
///
/// let at = Local.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).single().unwrap();
/// assert_eq!(TimestampFormat::LogLine.format(&at), "08-01-2025 10:30:45.000");
/// assert_eq!(TimestampFormat::FileTag.format(&at), "08_01_25__10_30_45");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Line timestamp with milliseconds: `08-01-2025 10:30:45.123`
    #[default]
    LogLine,

    /// File-name safe tag: `08_01_25__10_30_45`
    FileTag,
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Local>) -> String {
        match self {
            TimestampFormat::LogLine => datetime.format(LOG_LINE_PATTERN).to_string(),
            TimestampFormat::FileTag => datetime.format(FILE_TAG_PATTERN).to_string(),
        }
    }

    /// Format the current local time
    #[must_use]
    pub fn now(&self) -> String {
        self.format(&Local::now())
    }
}
