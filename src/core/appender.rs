//! Appender trait for log output destinations

use super::{error::Result, log_level::LogLevel};

/// A message already rendered by its destination's [`MessageFormat`](super::MessageFormat)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedRecord {
    pub level: LogLevel,
    pub line: String,
}

impl FormattedRecord {
    pub fn new(level: LogLevel, line: impl Into<String>) -> Self {
        Self {
            level,
            line: line.into(),
        }
    }
}

/// A sink a destination worker writes batches to.
///
/// The worker calls `begin_batch` once, `append` for every record of the
/// batch, then `flush`.
pub trait Appender: Send {
    /// Hook run before a batch is written (size checks, lazy opening)
    fn begin_batch(&mut self) -> Result<()> {
        Ok(())
    }

    fn append(&mut self, record: &FormattedRecord) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
