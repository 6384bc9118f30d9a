//! Destination writer
//!
//! A [`DestinationWriter`] owns one output target (a file, the console, or
//! both) and a dedicated worker thread. Emitters push the raw message on the
//! writer's channel together with the layout in effect at that moment; the
//! worker drains whatever is queued as one batch, renders it and performs
//! the I/O outside of any lock.
//!
//! Pausing holds batches in the worker without writing them. Resuming wakes
//! the worker so the held batch is written. Closing drops the sending side;
//! the worker writes everything still queued or held, then hands its sinks
//! back so the file is released by whoever joins it.

use super::{
    appender::{Appender, FormattedRecord},
    config::{DestinationSettings, DEFAULT_SHUTDOWN_TIMEOUT},
    error::{LoggerError, Result},
    log_entry::PendingMessage,
    log_level::LogLevel,
    log_mode::LogMode,
    message_format::MessageFormat,
    metrics::LoggerMetrics,
};
use crate::appenders::{ConsoleAppender, RotatingFileAppender};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Lifecycle of a destination writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriterState {
    /// Constructed, worker not started (disabled mode)
    Created,
    Running,
    /// Worker alive but holding batches
    Paused,
    /// Sender dropped, worker still draining
    Closing,
    Closed,
}

/// What travels on a writer's channel
#[derive(Debug)]
pub(crate) enum WriterSignal {
    Record {
        message: PendingMessage,
        format: MessageFormat,
    },
    /// Re-evaluate the pause flag and write anything held
    Wake,
}

/// The sinks a worker writes to; returned to the joiner when the worker exits
pub struct DestinationSinks {
    pub file: RotatingFileAppender,
    pub console: ConsoleAppender,
}

/// Settings that can change while the worker runs
#[derive(Debug, Clone, Copy)]
struct LiveSettings {
    level: LogLevel,
    mode: LogMode,
    message_format: MessageFormat,
    max_file_size: u64,
}

/// State shared between a writer handle and its worker
struct WriterShared {
    module: String,
    settings: RwLock<LiveSettings>,
    paused: AtomicBool,
    metrics: Arc<LoggerMetrics>,
}

enum WorkerSlot {
    Idle {
        receiver: Receiver<WriterSignal>,
        sinks: DestinationSinks,
    },
    Running(JoinHandle<DestinationSinks>),
    Finished,
}

/// One output target plus the worker thread writing to it
///
/// # Example
///
/// ```no_run
/// use rust_module_logger::{
///     DestinationSettings, DestinationWriter, LogLevel, LoggerMetrics, PendingMessage,
///     SourceLocation,
/// };
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let settings = DestinationSettings::for_path("logs/net.log");
/// let writer = DestinationWriter::new("net", settings, Arc::new(LoggerMetrics::new())).unwrap();
/// writer.start().unwrap();
///
/// let msg = PendingMessage::new("net", LogLevel::Info, "connected", SourceLocation::none());
/// writer.enqueue(msg);
/// writer.shutdown(Duration::from_secs(1));
/// ```
pub struct DestinationWriter {
    shared: Arc<WriterShared>,
    path: PathBuf,
    sender: Mutex<Option<Sender<WriterSignal>>>,
    worker: Mutex<WorkerSlot>,
}

impl DestinationWriter {
    /// Build the writer and its sinks without starting the worker
    ///
    /// # Errors
    ///
    /// Returns an error if the file sink cannot resolve its path
    pub fn new(
        module: impl Into<String>,
        settings: DestinationSettings,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<Self> {
        let file = RotatingFileAppender::new(
            &settings.path,
            settings.file_handling,
            settings.file_tag,
            settings.max_file_size,
        )?
        .with_metrics(Arc::clone(&metrics));
        let path = file.active_path().to_path_buf();

        let (sender, receiver) = unbounded();
        let sinks = DestinationSinks {
            file,
            console: ConsoleAppender::with_colors(settings.console_colors),
        };

        Ok(Self {
            shared: Arc::new(WriterShared {
                module: module.into(),
                settings: RwLock::new(LiveSettings {
                    level: settings.level,
                    mode: settings.mode,
                    message_format: settings.message_format,
                    max_file_size: settings.max_file_size,
                }),
                paused: AtomicBool::new(false),
                metrics,
            }),
            path,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(WorkerSlot::Idle { receiver, sinks }),
        })
    }

    pub fn module(&self) -> &str {
        &self.shared.module
    }

    /// File this writer appends to
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> LogLevel {
        self.shared.settings.read().level
    }

    pub fn mode(&self) -> LogMode {
        self.shared.settings.read().mode
    }

    pub fn message_format(&self) -> MessageFormat {
        self.shared.settings.read().message_format
    }

    pub fn max_file_size(&self) -> u64 {
        self.shared.settings.read().max_file_size
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Whether a message at `level` would be enqueued right now
    pub fn accepts(&self, level: LogLevel) -> bool {
        let settings = self.shared.settings.read();
        settings.mode.is_enabled() && !self.is_paused() && settings.level.admits(level)
    }

    /// Queue `msg` for the worker, which renders it with the current layout
    ///
    /// Returns `false` if the message was dropped (disabled mode or closed
    /// writer). Never blocks on I/O.
    pub fn enqueue(&self, msg: PendingMessage) -> bool {
        let (mode, format) = {
            let settings = self.shared.settings.read();
            (settings.mode, settings.message_format)
        };

        if !mode.is_enabled() {
            self.shared.metrics.record_filtered();
            return false;
        }

        let signal = WriterSignal::Record {
            message: msg,
            format,
        };
        let sent = match self.sender.lock().as_ref() {
            Some(sender) => sender.send(signal).is_ok(),
            None => false,
        };

        if sent {
            self.shared.metrics.record_enqueued();
        } else {
            self.shared.metrics.record_filtered();
        }
        sent
    }

    /// Spawn the worker thread if it has not run yet
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::WriterClosed`] once the writer has been joined,
    /// or an IO error if the thread cannot be spawned
    pub fn start(&self) -> Result<()> {
        let mut slot = self.worker.lock();

        match std::mem::replace(&mut *slot, WorkerSlot::Finished) {
            WorkerSlot::Idle { receiver, sinks } => {
                let shared = Arc::clone(&self.shared);
                let thread_name = format!("logger-{}", self.shared.module.replace('\0', ""));

                let handle = thread::Builder::new()
                    .name(thread_name)
                    .spawn(move || run_worker(receiver, sinks, shared))
                    .map_err(|e| {
                        LoggerError::io_operation(
                            "starting destination worker",
                            format!("Failed to spawn worker for '{}'", self.shared.module),
                            e,
                        )
                    })?;
                *slot = WorkerSlot::Running(handle);
                Ok(())
            }
            WorkerSlot::Finished => {
                Err(LoggerError::writer_closed(self.shared.module.as_str()))
            }
            running => {
                *slot = running;
                Ok(())
            }
        }
    }

    pub fn set_level(&self, level: LogLevel) {
        self.shared.settings.write().level = level;
    }

    /// Change the output mode; an enabled mode starts the worker if needed
    pub fn set_mode(&self, mode: LogMode) -> Result<()> {
        self.shared.settings.write().mode = mode;
        if mode.is_enabled() {
            self.start()?;
        }
        Ok(())
    }

    pub fn set_max_file_size(&self, max_file_size: u64) {
        self.shared.settings.write().max_file_size = max_file_size;
    }

    pub fn set_message_format(&self, format: MessageFormat) {
        self.shared.settings.write().message_format = format;
    }

    /// Hold (or release) batches in the worker
    pub fn set_paused(&self, paused: bool) {
        self.shared.paused.store(paused, Ordering::Release);
        if !paused {
            if let Some(sender) = self.sender.lock().as_ref() {
                let _ = sender.send(WriterSignal::Wake);
            }
        }
    }

    /// Signal the worker to drain and exit; does not wait
    pub fn close_destination(&self) {
        drop(self.sender.lock().take());
    }

    /// Close, then wait up to `timeout` for the worker to finish
    ///
    /// Returns `true` if every queued message was handed to the sinks and the
    /// sinks were released.
    pub fn join(&self, timeout: Duration) -> bool {
        self.close_destination();

        let slot = std::mem::replace(&mut *self.worker.lock(), WorkerSlot::Finished);
        match slot {
            WorkerSlot::Idle { receiver, sinks } => {
                // Never started: drain on the caller's thread
                drop(run_worker(receiver, sinks, Arc::clone(&self.shared)));
                true
            }
            WorkerSlot::Running(handle) => self.wait_for(handle, timeout),
            WorkerSlot::Finished => true,
        }
    }

    fn wait_for(&self, handle: JoinHandle<DestinationSinks>, timeout: Duration) -> bool {
        let start = Instant::now();

        loop {
            if handle.is_finished() {
                return match handle.join() {
                    Ok(sinks) => {
                        drop(sinks);
                        true
                    }
                    Err(panic) => {
                        eprintln!(
                            "[LOGGER ERROR] Worker for '{}' panicked during shutdown: {}",
                            self.shared.module,
                            panic_message(panic.as_ref())
                        );
                        false
                    }
                };
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Worker for '{}' did not finish within {:?} timeout. \
                     Some logs may be lost.",
                    self.shared.module, timeout
                );
                *self.worker.lock() = WorkerSlot::Running(handle);
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Close and join in one call
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.join(timeout)
    }

    pub fn state(&self) -> WriterState {
        let sender_closed = self.sender.lock().is_none();

        match &*self.worker.lock() {
            WorkerSlot::Finished => WriterState::Closed,
            _ if sender_closed => WriterState::Closing,
            WorkerSlot::Idle { .. } => WriterState::Created,
            WorkerSlot::Running(_) if self.is_paused() => WriterState::Paused,
            WorkerSlot::Running(_) => WriterState::Running,
        }
    }
}

impl Drop for DestinationWriter {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}

/// Worker body: block for the first signal, drain the rest as one batch,
/// write it unless paused
fn run_worker(
    receiver: Receiver<WriterSignal>,
    mut sinks: DestinationSinks,
    shared: Arc<WriterShared>,
) -> DestinationSinks {
    fn collect(signal: WriterSignal, held: &mut Vec<FormattedRecord>) {
        if let WriterSignal::Record { message, format } = signal {
            held.push(FormattedRecord::new(message.level, format.format(&message)));
        }
    }

    let mut held: Vec<FormattedRecord> = Vec::new();

    while let Ok(signal) = receiver.recv() {
        collect(signal, &mut held);
        for signal in receiver.try_iter() {
            collect(signal, &mut held);
        }

        if shared.paused.load(Ordering::Acquire) || held.is_empty() {
            continue;
        }

        write_batch(&mut sinks, &held, &shared);
        held.clear();
    }

    // Sender gone: write what remains, paused or not
    if !held.is_empty() {
        write_batch(&mut sinks, &held, &shared);
    }

    sinks
}

fn write_batch(sinks: &mut DestinationSinks, batch: &[FormattedRecord], shared: &WriterShared) {
    let (mode, max_file_size) = {
        let settings = shared.settings.read();
        (settings.mode, settings.max_file_size)
    };
    let lines = batch.len() as u64;

    if !mode.is_enabled() {
        for _ in batch {
            shared.metrics.record_filtered();
        }
        return;
    }

    let mut persisted = true;

    if mode.writes_file() {
        sinks.file.set_max_file_size(max_file_size);
        persisted = deliver(&mut sinks.file, batch, &shared.module);
    }

    if mode.writes_console() {
        let echoed = deliver(&mut sinks.console, batch, &shared.module);
        if !mode.writes_file() {
            persisted = echoed;
        }
    }

    if persisted {
        shared.metrics.record_written(lines);
    } else {
        shared.metrics.record_write_failures(lines);
    }
}

/// Write one batch to one sink, isolating errors and panics
fn deliver(appender: &mut dyn Appender, batch: &[FormattedRecord], module: &str) -> bool {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| -> Result<()> {
        appender.begin_batch()?;
        for record in batch {
            appender.append(record)?;
        }
        appender.flush()
    }));

    match result {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            eprintln!(
                "[LOGGER ERROR] Destination '{}' {} failed: {}",
                module,
                appender.name(),
                e
            );
            false
        }
        Err(panic) => {
            eprintln!(
                "[LOGGER CRITICAL] Destination '{}' {} panicked: {}. \
                 The worker keeps running.",
                module,
                appender.name(),
                panic_message(panic.as_ref())
            );
            false
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::FileHandling;
    use crate::core::log_entry::SourceLocation;
    use std::fs;
    use tempfile::tempdir;

    fn settings(path: &Path) -> DestinationSettings {
        DestinationSettings {
            file_handling: FileHandling::Single,
            level: LogLevel::Trace,
            ..DestinationSettings::for_path(path)
        }
    }

    fn message(text: &str) -> PendingMessage {
        PendingMessage::new("net", LogLevel::Info, text, SourceLocation::none())
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_writes_in_enqueue_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("net.log");
        let metrics = Arc::new(LoggerMetrics::new());
        let writer = DestinationWriter::new("net", settings(&path), Arc::clone(&metrics)).unwrap();
        writer.start().unwrap();
        assert_eq!(writer.state(), WriterState::Running);

        for i in 0..20 {
            assert!(writer.enqueue(message(&format!("msg {}", i))));
        }
        assert!(writer.shutdown(Duration::from_secs(5)));
        assert_eq!(writer.state(), WriterState::Closed);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 20);
        for (i, line) in lines.iter().enumerate() {
            assert!(line.starts_with("[Info] [net] ["));
            assert!(line.ends_with(&format!(" msg {}", i)), "line {}: {}", i, line);
        }
        assert_eq!(metrics.enqueued(), 20);
        assert_eq!(metrics.written(), 20);
    }

    #[test]
    fn test_disabled_drops_at_enqueue() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("off.log");
        let metrics = Arc::new(LoggerMetrics::new());
        let mut cfg = settings(&path);
        cfg.mode = LogMode::Disabled;

        let writer = DestinationWriter::new("off", cfg, Arc::clone(&metrics)).unwrap();
        assert_eq!(writer.state(), WriterState::Created);
        assert!(!writer.accepts(LogLevel::Fatal));
        assert!(!writer.enqueue(message("ignored")));
        assert!(writer.shutdown(Duration::from_secs(1)));

        assert!(!path.exists());
        assert_eq!(metrics.filtered(), 1);
    }

    #[test]
    fn test_enabling_mode_starts_worker() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("late.log");
        let mut cfg = settings(&path);
        cfg.mode = LogMode::Disabled;

        let writer = DestinationWriter::new("late", cfg, Arc::new(LoggerMetrics::new())).unwrap();
        writer.set_mode(LogMode::OnlyFile).unwrap();
        assert_eq!(writer.state(), WriterState::Running);

        writer.enqueue(message("now on"));
        assert!(writer.shutdown(Duration::from_secs(5)));
        assert_eq!(read_lines(&path).len(), 1);
    }

    #[test]
    fn test_pause_holds_until_resume() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("held.log");
        let writer = DestinationWriter::new("held", settings(&path), Arc::new(LoggerMetrics::new()))
            .unwrap();
        writer.start().unwrap();
        writer.set_paused(true);
        assert_eq!(writer.state(), WriterState::Paused);
        assert!(!writer.accepts(LogLevel::Fatal));

        writer.enqueue(message("held back"));
        thread::sleep(Duration::from_millis(100));
        assert!(read_lines(&path).is_empty());

        writer.set_paused(false);
        let deadline = Instant::now() + Duration::from_secs(5);
        while read_lines(&path).is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(read_lines(&path).len(), 1);
        assert!(writer.shutdown(Duration::from_secs(5)));
    }

    #[test]
    fn test_close_flushes_held_messages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("closing.log");
        let writer =
            DestinationWriter::new("closing", settings(&path), Arc::new(LoggerMetrics::new()))
                .unwrap();
        writer.start().unwrap();
        writer.set_paused(true);
        writer.enqueue(message("still written"));

        assert!(writer.join(Duration::from_secs(5)));
        assert_eq!(read_lines(&path).len(), 1);
        assert!(!writer.enqueue(message("too late")));
    }

    #[test]
    fn test_start_after_join_is_rejected() {
        let dir = tempdir().unwrap();
        let writer = DestinationWriter::new(
            "done",
            settings(&dir.path().join("done.log")),
            Arc::new(LoggerMetrics::new()),
        )
        .unwrap();
        writer.start().unwrap();
        assert!(writer.join(Duration::from_secs(5)));

        let err = writer.start().unwrap_err();
        assert!(matches!(err, LoggerError::WriterClosed { ref module } if module == "done"));
        assert!(writer.set_mode(LogMode::Full).is_err());
        assert_eq!(writer.state(), WriterState::Closed);
    }

    #[test]
    fn test_layout_is_fixed_at_enqueue_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.log");
        let writer =
            DestinationWriter::new("layout", settings(&path), Arc::new(LoggerMetrics::new()))
                .unwrap();
        writer.start().unwrap();
        writer.set_paused(true);

        writer.enqueue(message("default layout"));
        writer.set_message_format(MessageFormat::Custom(
            crate::core::message_format::MessageFields::none().with_message(true),
        ));
        writer.enqueue(message("bare layout"));
        assert!(writer.shutdown(Duration::from_secs(5)));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[Info] [net] ["), "{}", lines[0]);
        assert_eq!(lines[1], "bare layout");
    }

    #[test]
    fn test_level_threshold() {
        let dir = tempdir().unwrap();
        let writer = DestinationWriter::new(
            "lvl",
            settings(&dir.path().join("lvl.log")),
            Arc::new(LoggerMetrics::new()),
        )
        .unwrap();
        writer.set_level(LogLevel::Warning);

        assert!(!writer.accepts(LogLevel::Info));
        assert!(writer.accepts(LogLevel::Warning));
        assert!(writer.accepts(LogLevel::Fatal));
    }

    #[test]
    fn test_custom_format_applies_to_later_messages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fmt.log");
        let writer =
            DestinationWriter::new("fmt", settings(&path), Arc::new(LoggerMetrics::new())).unwrap();
        writer.start().unwrap();
        writer.set_message_format(MessageFormat::Custom(
            crate::core::message_format::MessageFields::none().with_message(true),
        ));

        writer.enqueue(message("bare"));
        assert!(writer.shutdown(Duration::from_secs(5)));
        assert_eq!(read_lines(&path), vec!["bare".to_string()]);
    }

    struct PanickingAppender;

    impl Appender for PanickingAppender {
        fn append(&mut self, _record: &FormattedRecord) -> Result<()> {
            panic!("sink exploded");
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_deliver_isolates_panics() {
        let mut sink = PanickingAppender;
        let batch = vec![FormattedRecord::new(LogLevel::Info, "boom")];
        assert!(!deliver(&mut sink, &batch, "net"));
    }

    #[test]
    fn test_panic_message() {
        let from_str: Box<dyn Any + Send> = Box::new("static");
        let from_string: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(from_str.as_ref()), "static");
        assert_eq!(panic_message(from_string.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "Unknown panic");
    }
}
