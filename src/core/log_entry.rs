//! Pending message record and call-site location

use super::log_level::LogLevel;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

// Thread-local cache so the identifier is rendered once per thread
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Render the current thread's identifier as zero-padded hex, falling back to
/// the `Debug` form if the numeric part cannot be recovered.
fn render_thread_id() -> String {
    let debug = format!("{:?}", std::thread::current().id());
    debug
        .trim_start_matches("ThreadId(")
        .trim_end_matches(')')
        .parse::<u64>()
        .map(|n| format!("{:016x}", n))
        .unwrap_or(debug)
}

/// Get cached thread ID, computing and caching it on first access
pub fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(render_thread_id)
            .clone()
    })
}

/// Last path component of a source file name, accepting either separator
pub fn trim_file_name(file: &str) -> &str {
    file.rsplit(['/', '\\']).next().unwrap_or(file)
}

/// Where a message was emitted from
///
/// Every part is optional; the writer only renders a location for
/// diagnostic-level messages and only from the parts that are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub function: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl SourceLocation {
    pub fn new(function: &str, file: &str, line: u32) -> Self {
        Self {
            function: Some(function.to_string()),
            file: Some(file.to_string()),
            line: Some(line),
        }
    }

    /// No location information
    pub fn none() -> Self {
        Self::default()
    }

    /// File and line of the caller of the `#[track_caller]` chain
    #[track_caller]
    pub fn caller() -> Self {
        let location = std::panic::Location::caller();
        Self {
            function: None,
            file: Some(location.file().to_string()),
            line: Some(location.line()),
        }
    }

    #[must_use]
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }
}

/// A message captured at emit time, waiting to be formatted by a destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMessage {
    pub timestamp: DateTime<Local>,
    pub thread_id: String,
    pub module: String,
    pub level: LogLevel,
    pub function: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub message: String,
}

impl PendingMessage {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so a single message can never forge additional log lines.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(
        module: impl Into<String>,
        level: LogLevel,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            thread_id: current_thread_id(),
            module: module.into(),
            level,
            function: location.function.filter(|f| !f.is_empty()),
            file: location
                .file
                .as_deref()
                .map(trim_file_name)
                .filter(|f| !f.is_empty())
                .map(String::from),
            line: location.line.filter(|line| *line > 0),
            message: Self::sanitize_message(&message.into()),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = thread_id.into();
        self
    }
}
