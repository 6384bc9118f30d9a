//! Console appender implementation

use crate::core::{Appender, FormattedRecord, LogLevel, Result};
#[cfg(feature = "console")]
use colored::Colorize;

pub struct ConsoleAppender {
    use_colors: bool,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub fn uses_colors(&self) -> bool {
        self.use_colors
    }

    fn render(&self, record: &FormattedRecord) -> String {
        #[cfg(feature = "console")]
        if self.use_colors {
            return record.line.color(record.level.color_code()).to_string();
        }

        record.line.clone()
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, record: &FormattedRecord) -> Result<()> {
        let output = self.render(record);

        // Route Error and Fatal levels to stderr, others to stdout
        match record.level {
            LogLevel::Error | LogLevel::Fatal => eprintln!("{}", output),
            _ => println!("{}", output),
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_render_keeps_line() {
        let appender = ConsoleAppender::with_colors(false);
        let record = FormattedRecord::new(LogLevel::Info, "[Info] [net] hello");
        assert_eq!(appender.render(&record), "[Info] [net] hello");
    }

    #[test]
    fn test_append_and_flush() {
        let mut appender = ConsoleAppender::with_colors(false);
        appender
            .append(&FormattedRecord::new(LogLevel::Error, "[Error] [net] boom"))
            .expect("console append");
        appender.flush().expect("console flush");
        assert_eq!(appender.name(), "console");
    }
}
