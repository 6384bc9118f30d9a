//! Line layout for destination output
//!
//! Fields always appear in the same order: level, module, timestamp, thread
//! id, source location, message. The [`MessageFormat::Default`] layout is
//! fixed; [`MessageFormat::Custom`] renders only the requested fields.

use super::log_entry::PendingMessage;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};

/// Which fields a custom layout renders
///
/// # Examples
///
/// ```
/// use rust_module_logger::MessageFields;
///
/// let fields = MessageFields::none()
///     .with_level(true)
///     .with_message(true);
/// assert!(fields.level && fields.message && !fields.module);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageFields {
    pub level: bool,
    pub module: bool,
    pub date_time: bool,
    pub thread_id: bool,
    pub function: bool,
    pub file: bool,
    pub line: bool,
    pub message: bool,
}

impl Default for MessageFields {
    /// Same fields as the default layout: everything but the function name
    fn default() -> Self {
        Self {
            function: false,
            ..Self::all()
        }
    }
}

impl MessageFields {
    #[must_use]
    pub const fn none() -> Self {
        Self {
            level: false,
            module: false,
            date_time: false,
            thread_id: false,
            function: false,
            file: false,
            line: false,
            message: false,
        }
    }

    #[must_use]
    pub const fn all() -> Self {
        Self {
            level: true,
            module: true,
            date_time: true,
            thread_id: true,
            function: true,
            file: true,
            line: true,
            message: true,
        }
    }

    /// Default fields with the function name in place of the line number
    #[must_use]
    pub fn with_function_location() -> Self {
        Self {
            line: false,
            ..Self::all()
        }
    }

    #[must_use]
    pub fn with_level(mut self, include: bool) -> Self {
        self.level = include;
        self
    }

    #[must_use]
    pub fn with_module(mut self, include: bool) -> Self {
        self.module = include;
        self
    }

    #[must_use]
    pub fn with_date_time(mut self, include: bool) -> Self {
        self.date_time = include;
        self
    }

    #[must_use]
    pub fn with_thread_id(mut self, include: bool) -> Self {
        self.thread_id = include;
        self
    }

    #[must_use]
    pub fn with_function(mut self, include: bool) -> Self {
        self.function = include;
        self
    }

    #[must_use]
    pub fn with_file(mut self, include: bool) -> Self {
        self.file = include;
        self
    }

    #[must_use]
    pub fn with_line(mut self, include: bool) -> Self {
        self.line = include;
        self
    }

    #[must_use]
    pub fn with_message(mut self, include: bool) -> Self {
        self.message = include;
        self
    }
}

/// Layout used by a destination to turn a [`PendingMessage`] into a line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageFormat {
    /// `[<Level>] [<Module>] [<dd-MM-yyyy hh:mm:ss.zzz>] [<ThreadId>]{<file>:<line>} <message>`
    #[default]
    Default,

    /// Only the selected fields, each bracketed
    Custom(MessageFields),
}

impl MessageFormat {
    /// Render one message as a single line, without the trailing newline
    pub fn format(&self, msg: &PendingMessage) -> String {
        match self {
            MessageFormat::Default => Self::format_default(msg),
            MessageFormat::Custom(fields) => Self::format_custom(msg, fields),
        }
    }

    fn format_default(msg: &PendingMessage) -> String {
        format!(
            "[{}] [{}] [{}] [{}]{} {}",
            msg.level,
            msg.module,
            TimestampFormat::LogLine.format(&msg.timestamp),
            msg.thread_id,
            Self::location_tag(msg, true, false),
            msg.message
        )
    }

    fn format_custom(msg: &PendingMessage, fields: &MessageFields) -> String {
        let mut parts = Vec::with_capacity(4);

        if fields.level {
            parts.push(format!("[{}]", msg.level));
        }
        if fields.module {
            parts.push(format!("[{}]", msg.module));
        }
        if fields.date_time {
            parts.push(format!("[{}]", TimestampFormat::LogLine.format(&msg.timestamp)));
        }
        if fields.thread_id {
            parts.push(format!("[{}]", msg.thread_id));
        }

        let mut line = parts.join(" ");
        line.push_str(&Self::location_tag(
            msg,
            fields.file && fields.line,
            fields.file && fields.function,
        ));

        if fields.message {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&msg.message);
        }

        line
    }

    /// `{file:line}` when allowed and available, else `{file}{function}`
    /// (custom layouts only), else nothing. Only diagnostic-level messages
    /// carry a location.
    fn location_tag(msg: &PendingMessage, allow_file_line: bool, allow_function: bool) -> String {
        if !msg.level.is_diagnostic() {
            return String::new();
        }

        match (&msg.file, msg.line, &msg.function) {
            (Some(file), Some(line), _) if allow_file_line => format!("{{{}:{}}}", file, line),
            (Some(file), _, Some(function)) if allow_function => {
                format!("{{{}}}{{{}}}", file, function)
            }
            _ => String::new(),
        }
    }
}
