//! Module registry and router
//!
//! [`LogManager`] maps module names to [`DestinationWriter`]s and routes every
//! emitted message to the writer bound to its module. Messages for modules
//! that have no destination yet wait in a bounded per-module backlog and are
//! replayed, in order, once a destination is registered.

use super::{
    config::{DestinationOptions, LoggerConfig},
    destination::{DestinationWriter, WriterState},
    error::Result,
    log_entry::{PendingMessage, SourceLocation},
    log_level::LogLevel,
    log_mode::LogMode,
    message_format::MessageFormat,
    metrics::LoggerMetrics,
};
use crate::appenders::rotating_file::{remove_stale_logs, FileHandling, FileTag};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

const NOTIFY_MESSAGE: &str = "Adding destination!";

/// Everything guarded by the registry lock
struct RegistryState {
    config: LoggerConfig,
    writers: HashMap<String, DestinationWriter>,
    backlog: HashMap<String, Vec<PendingMessage>>,
    paused: bool,
}

impl RegistryState {
    /// Hand a module's backlog to its writer, re-checking the threshold
    ///
    /// Does nothing while the module is unbound or its writer is disabled;
    /// the backlog is kept for a later attempt.
    fn replay_backlog(&mut self, module: &str, metrics: &LoggerMetrics) {
        let Some(writer) = self.writers.get(module) else {
            return;
        };
        if !writer.mode().is_enabled() {
            return;
        }
        let Some(pending) = self.backlog.remove(module) else {
            return;
        };

        let threshold = writer.level();
        for msg in pending {
            if threshold.admits(msg.level) && writer.enqueue(msg) {
                metrics.record_replayed();
            } else {
                metrics.record_filtered();
            }
        }
    }
}

/// Registry of destinations, keyed by module name
///
/// # Example
///
/// ```no_run
/// use rust_module_logger::{DestinationOptions, LogLevel, LogManager};
///
/// let manager = LogManager::builder()
///     .default_folder("logs")
///     .build();
///
/// manager.add_destination(
///     "network",
///     ["net", "http"],
///     DestinationOptions::new().level(LogLevel::Warning),
/// );
///
/// manager.error("net", "connection reset");
/// manager.close_all();
/// ```
pub struct LogManager {
    state: Mutex<RegistryState>,
    metrics: Arc<LoggerMetrics>,
}

impl LogManager {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LoggerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: LoggerConfig) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                config,
                writers: HashMap::new(),
                backlog: HashMap::new(),
                paused: false,
            }),
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    #[must_use]
    pub fn builder() -> LogManagerBuilder {
        LogManagerBuilder::new()
    }

    /// Process-wide manager, built from the default configuration on first use
    ///
    /// Statics are never dropped, so call `LogManager::global().close_all()`
    /// before the process exits to flush every destination.
    pub fn global() -> &'static LogManager {
        static GLOBAL: OnceLock<LogManager> = OnceLock::new();
        GLOBAL.get_or_init(LogManager::new)
    }

    /// Bind every not-yet-bound module in `modules` to a new destination
    ///
    /// Options left unset fall back to the manager defaults; an empty `target`
    /// means the default file name. Returns `true` if at least one module was
    /// newly bound. Modules that already have a destination keep it.
    pub fn add_destination<I, S>(&self, target: &str, modules: I, options: DestinationOptions) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let settings = options.resolve(&state.config, target);
        let mut added = false;

        for module in modules {
            let module = module.as_ref();
            if state.writers.contains_key(module) {
                continue;
            }

            let writer =
                match DestinationWriter::new(module, settings.clone(), Arc::clone(&self.metrics)) {
                    Ok(writer) => writer,
                    Err(e) => {
                        eprintln!(
                            "[LOGGER ERROR] Failed to create destination for '{}': {}",
                            module, e
                        );
                        continue;
                    }
                };

            writer.set_paused(state.paused);
            if options.notify && !state.paused {
                writer.enqueue(PendingMessage::new(
                    module,
                    LogLevel::Info,
                    NOTIFY_MESSAGE,
                    SourceLocation::none(),
                ));
            }

            if settings.mode.is_enabled() {
                if let Err(e) = writer.start() {
                    eprintln!("[LOGGER ERROR] {}", e);
                    continue;
                }
            }

            state.writers.insert(module.to_string(), writer);
            added = true;

            if !state.paused {
                state.replay_backlog(module, &self.metrics);
            }
        }

        added
    }

    /// Route one message
    ///
    /// Never fails: a message that is filtered, arrives while paused, or
    /// overflows the backlog is dropped and counted in [`metrics`](Self::metrics).
    pub fn emit(
        &self,
        module: &str,
        level: LogLevel,
        message: impl Into<String>,
        location: SourceLocation,
    ) {
        let msg = PendingMessage::new(module, level, message, location);

        let mut guard = self.state.lock();
        let state = &mut *guard;

        match state.writers.get(module).map(|writer| writer.accepts(level)) {
            Some(true) => {
                state.replay_backlog(module, &self.metrics);
                if let Some(writer) = state.writers.get(module) {
                    writer.enqueue(msg);
                }
            }
            Some(false) => {
                self.metrics.record_filtered();
            }
            None => {
                let capacity = state.config.backlog_capacity;
                let queue = state.backlog.entry(module.to_string()).or_default();
                if queue.len() < capacity {
                    queue.push(msg);
                    self.metrics.record_backlogged();
                } else {
                    self.metrics.record_backlog_dropped();
                }
            }
        }
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, module: &str, message: impl Into<String>) {
        self.emit(module, LogLevel::Trace, message, SourceLocation::caller());
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, module: &str, message: impl Into<String>) {
        self.emit(module, LogLevel::Debug, message, SourceLocation::caller());
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, module: &str, message: impl Into<String>) {
        self.emit(module, LogLevel::Info, message, SourceLocation::caller());
    }

    #[inline]
    #[track_caller]
    pub fn warning(&self, module: &str, message: impl Into<String>) {
        self.emit(module, LogLevel::Warning, message, SourceLocation::caller());
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, module: &str, message: impl Into<String>) {
        self.emit(module, LogLevel::Error, message, SourceLocation::caller());
    }

    #[inline]
    #[track_caller]
    pub fn fatal(&self, module: &str, message: impl Into<String>) {
        self.emit(module, LogLevel::Fatal, message, SourceLocation::caller());
    }

    /// Drop every emit until [`resume`](Self::resume); writers hold what they
    /// already queued
    pub fn pause(&self) {
        self.set_paused(true);
    }

    pub fn resume(&self) {
        self.set_paused(false);
    }

    fn set_paused(&self, paused: bool) {
        let mut state = self.state.lock();
        state.paused = paused;
        for writer in state.writers.values() {
            writer.set_paused(paused);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    /// Set the default threshold and apply it to every destination
    pub fn overwrite_level(&self, level: LogLevel) {
        let mut state = self.state.lock();
        state.config.default_level = level;
        for writer in state.writers.values() {
            writer.set_level(level);
        }
    }

    /// Set the default mode and apply it to every destination
    pub fn overwrite_mode(&self, mode: LogMode) {
        let mut state = self.state.lock();
        state.config.default_mode = mode;
        for writer in state.writers.values() {
            if let Err(e) = writer.set_mode(mode) {
                eprintln!("[LOGGER ERROR] {}", e);
            }
        }
    }

    /// Set the default rotation size and apply it to every destination
    pub fn overwrite_max_file_size(&self, bytes: u64) {
        let mut state = self.state.lock();
        state.config.max_file_size = bytes;
        for writer in state.writers.values() {
            writer.set_max_file_size(bytes);
        }
    }

    // Defaults below only affect destinations added afterwards

    pub fn set_default_folder(&self, folder: impl Into<String>) {
        self.state.lock().config.default_folder = folder.into();
    }

    pub fn set_default_target(&self, target: impl Into<String>) {
        self.state.lock().config.default_target = target.into();
    }

    pub fn set_default_file_handling(&self, handling: FileHandling) {
        self.state.lock().config.default_file_handling = handling;
    }

    pub fn set_default_file_tag(&self, tag: FileTag) {
        self.state.lock().config.default_file_tag = tag;
    }

    pub fn set_default_message_format(&self, format: MessageFormat) {
        self.state.lock().config.default_message_format = format;
    }

    pub fn is_bound(&self, module: &str) -> bool {
        self.state.lock().writers.contains_key(module)
    }

    pub fn destination_count(&self) -> usize {
        self.state.lock().writers.len()
    }

    /// Messages waiting for `module` to be bound (or re-enabled)
    pub fn backlog_len(&self, module: &str) -> usize {
        self.state
            .lock()
            .backlog
            .get(module)
            .map_or(0, Vec::len)
    }

    pub fn destination_state(&self, module: &str) -> Option<WriterState> {
        self.state.lock().writers.get(module).map(DestinationWriter::state)
    }

    /// File the destination bound to `module` appends to
    pub fn destination_path(&self, module: &str) -> Option<PathBuf> {
        self.state
            .lock()
            .writers
            .get(module)
            .map(|writer| writer.path().to_path_buf())
    }

    /// Snapshot of the current defaults
    pub fn config(&self) -> LoggerConfig {
        self.state.lock().config.clone()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Delete files in `folder` older than `max_age`; returns how many were removed
    pub fn clear_log_folder<P: AsRef<Path>>(&self, folder: P, max_age: Duration) -> Result<usize> {
        remove_stale_logs(folder.as_ref(), max_age)
    }

    /// Flush backlogs, close every destination and wait for the workers
    ///
    /// Returns `true` if every worker finished within the configured shutdown
    /// timeout. The manager can register new destinations afterwards.
    pub fn close_all(&self) -> bool {
        let (writers, timeout) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;

            let modules: Vec<String> = state.writers.keys().cloned().collect();
            for module in &modules {
                state.replay_backlog(module, &self.metrics);
            }

            // Whatever is left can no longer reach a destination
            for (_, pending) in state.backlog.drain() {
                for _ in pending {
                    self.metrics.record_backlog_dropped();
                }
            }

            let writers: Vec<DestinationWriter> =
                state.writers.drain().map(|(_, writer)| writer).collect();
            for writer in &writers {
                writer.close_destination();
            }

            (writers, state.config.shutdown_timeout())
        };

        // Join outside the lock so emitters are never blocked on worker I/O
        writers
            .iter()
            .fold(true, |clean, writer| writer.join(timeout) && clean)
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LogManager {
    fn drop(&mut self) {
        self.close_all();

        let lost = self.metrics.backlog_dropped() + self.metrics.write_failures();
        if lost > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} lost logs (drop rate: {:.2}%)",
                lost,
                self.metrics.drop_rate()
            );
        }
    }
}

/// Builder for constructing a [`LogManager`] with a fluent API
///
/// # Example
///
/// ```
/// use rust_module_logger::prelude::*;
/// use std::time::Duration;
///
/// let manager = LogManager::builder()
///     .default_level(LogLevel::Debug)
///     .default_mode(LogMode::Full)
///     .backlog_capacity(50)
///     .shutdown_timeout(Duration::from_secs(2))
///     .build();
/// assert_eq!(manager.config().backlog_capacity, 50);
/// ```
pub struct LogManagerBuilder {
    config: LoggerConfig,
}

impl LogManagerBuilder {
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
        }
    }

    /// Start from a loaded configuration
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn default_target(mut self, target: impl Into<String>) -> Self {
        self.config.default_target = target.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn default_folder(mut self, folder: impl Into<String>) -> Self {
        self.config.default_folder = folder.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn default_level(mut self, level: LogLevel) -> Self {
        self.config.default_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn default_mode(mut self, mode: LogMode) -> Self {
        self.config.default_mode = mode;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn file_handling(mut self, handling: FileHandling) -> Self {
        self.config.default_file_handling = handling;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn file_tag(mut self, tag: FileTag) -> Self {
        self.config.default_file_tag = tag;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn message_format(mut self, format: MessageFormat) -> Self {
        self.config.default_message_format = format;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn backlog_capacity(mut self, capacity: usize) -> Self {
        self.config.backlog_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn console_colors(mut self, enabled: bool) -> Self {
        self.config.console_colors = enabled;
        self
    }

    pub fn build(self) -> LogManager {
        LogManager::with_config(self.config)
    }

    /// Build after validating the configuration
    pub fn try_build(self) -> Result<LogManager> {
        self.config.validate()?;
        Ok(LogManager::with_config(self.config))
    }
}

impl Default for LogManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
