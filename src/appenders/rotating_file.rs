//! Rotating file appender
//!
//! Resolves the file a destination writes to and, for [`FileHandling::Split`],
//! moves the current file aside once it reaches the size limit. The moved
//! file gets a tag according to [`FileTag`], and the fresh file starts with a
//! `Previous log <name>` line pointing at it.

use crate::core::appender::{Appender, FormattedRecord};
use crate::core::error::{LoggerError, Result};
use crate::core::metrics::LoggerMetrics;
use crate::core::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Upper bound on `(n)` candidates probed for a free numeric tag
pub const MAX_NUMERIC_TAG: u32 = 100_000;

/// How a destination's file is named and whether it rotates
///
/// # Examples
///
/// ```
/// use rust_module_logger::appenders::FileHandling;
///
/// assert_eq!(FileHandling::default(), FileHandling::Split);
/// assert!(FileHandling::Split.rotates());
/// assert!(!FileHandling::SingleTagged.rotates());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FileHandling {
    /// Always the configured path; never rotates
    Single,

    /// The configured path plus a tag fixed when the destination is created
    SingleTagged,

    /// The configured path, moved aside under a tagged name when full
    #[default]
    Split,
}

impl FileHandling {
    #[must_use]
    pub fn rotates(&self) -> bool {
        matches!(self, FileHandling::Split)
    }
}

/// Tag scheme for rotated or session-tagged file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FileTag {
    /// `<base>_<DD_MM_YY__HH_MM_SS>.<ext>`
    #[default]
    DateTime,

    /// `<base>(<n>).<ext>`, `n` being the first number not already on disk
    Number,
}

/// `<dir>/<stem><suffix>.<ext>` for the given path
fn with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("log");
    let file_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext),
        None => format!("{}{}", stem, suffix),
    };
    path.with_file_name(file_name)
}

/// First `<stem>(<n>).<ext>` next to `path` that does not exist yet
///
/// # Examples
///
/// ```no_run
/// use rust_module_logger::appenders::next_numeric_path;
/// use std::path::Path;
///
/// // with logs/net(1).log and logs/net(2).log on disk:
/// let next = next_numeric_path(Path::new("logs/net.log")).unwrap();
/// assert_eq!(next, Path::new("logs/net(3).log"));
/// ```
pub fn next_numeric_path(path: &Path) -> Result<PathBuf> {
    (1..=MAX_NUMERIC_TAG)
        .map(|n| with_stem_suffix(path, &format!("({})", n)))
        .find(|candidate| !candidate.exists())
        .ok_or_else(|| {
            LoggerError::tag_space_exhausted(path.display().to_string(), MAX_NUMERIC_TAG)
        })
}

#[cfg(unix)]
fn same_file(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

// Without inode identity, a length mismatch after the last flush means the
// path now holds a different file
#[cfg(not(unix))]
fn same_file(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    a.len() == b.len()
}

/// Delete regular files in `folder` last modified more than `max_age` ago
///
/// Returns how many files were removed. A missing folder removes nothing.
pub fn remove_stale_logs(folder: &Path, max_age: Duration) -> Result<usize> {
    if !folder.is_dir() {
        return Ok(0);
    }

    let now = SystemTime::now();
    let entries = fs::read_dir(folder).map_err(|e| {
        LoggerError::io_operation(
            "clear log folder",
            format!("Failed to list '{}'", folder.display()),
            e,
        )
    })?;

    let mut removed = 0;
    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(metadata) = fs::symlink_metadata(entry.path()) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or(Duration::ZERO);

        if age >= max_age {
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!(
                    "[LOGGER WARNING] Failed to remove stale log {}: {}",
                    entry.path().display(),
                    e
                ),
            }
        }
    }

    Ok(removed)
}

/// File sink for one destination
///
/// The file is opened lazily by the first batch, so creating a destination
/// never touches the disk beyond probing for a free numeric tag.
///
/// # Examples
///
/// ```no_run
/// use rust_module_logger::appenders::{FileHandling, FileTag, RotatingFileAppender};
///
/// let appender = RotatingFileAppender::new(
///     "logs/net.log",
///     FileHandling::Split,
///     FileTag::Number,
///     1024 * 1024,
/// )
/// .unwrap();
/// assert_eq!(appender.active_path().to_str(), Some("logs/net.log"));
/// ```
pub struct RotatingFileAppender {
    base_path: PathBuf,
    active_path: PathBuf,
    handling: FileHandling,
    tag: FileTag,
    /// Creation-time tag, used by `SingleTagged` with the timestamp scheme
    session_tag: String,
    max_file_size: u64,
    writer: Option<BufWriter<File>>,
    last_rotated: Option<PathBuf>,
    metrics: Option<Arc<LoggerMetrics>>,
}

impl RotatingFileAppender {
    /// Create the appender and resolve its active path
    ///
    /// # Errors
    ///
    /// Returns an error if `SingleTagged` with numeric tags finds no free number
    pub fn new<P: AsRef<Path>>(
        path: P,
        handling: FileHandling,
        tag: FileTag,
        max_file_size: u64,
    ) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        let session_tag = TimestampFormat::FileTag.now();

        let active_path = match (handling, tag) {
            (FileHandling::SingleTagged, FileTag::DateTime) => {
                with_stem_suffix(&base_path, &format!("_{}", session_tag))
            }
            (FileHandling::SingleTagged, FileTag::Number) => next_numeric_path(&base_path)?,
            _ => base_path.clone(),
        };

        Ok(Self {
            base_path,
            active_path,
            handling,
            tag,
            session_tag,
            max_file_size,
            writer: None,
            last_rotated: None,
            metrics: None,
        })
    }

    /// Count rotations in the given metrics
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<LoggerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Size limit for `Split`; zero disables rotation
    pub fn set_max_file_size(&mut self, max_file_size: u64) {
        self.max_file_size = max_file_size;
    }

    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Path as configured, before any session tag
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path messages are appended to
    #[must_use]
    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    #[must_use]
    pub fn handling(&self) -> FileHandling {
        self.handling
    }

    #[must_use]
    pub fn tag(&self) -> FileTag {
        self.tag
    }

    #[must_use]
    pub fn session_tag(&self) -> &str {
        &self.session_tag
    }

    /// Where the most recent rotation moved the previous file
    #[must_use]
    pub fn last_rotated(&self) -> Option<&Path> {
        self.last_rotated.as_deref()
    }

    fn current_size(&self) -> u64 {
        fs::metadata(&self.active_path).map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the cached handle no longer refers to the file at the active
    /// path, e.g. after another writer sharing the path moved it aside
    fn handle_is_stale(&self) -> bool {
        let Some(writer) = &self.writer else {
            return false;
        };
        let Ok(on_disk) = fs::metadata(&self.active_path) else {
            return true;
        };
        writer
            .get_ref()
            .metadata()
            .map(|open| !same_file(&open, &on_disk))
            .unwrap_or(true)
    }

    fn should_rotate(&self) -> bool {
        self.handling.rotates() && self.max_file_size > 0 && self.current_size() >= self.max_file_size
    }

    /// Name for the file being moved aside
    fn rotated_path(&self) -> Result<PathBuf> {
        match self.tag {
            FileTag::DateTime => {
                let tagged = with_stem_suffix(
                    &self.active_path,
                    &format!("_{}", TimestampFormat::FileTag.now()),
                );
                if tagged.exists() {
                    next_numeric_path(&tagged)
                } else {
                    Ok(tagged)
                }
            }
            FileTag::Number => next_numeric_path(&self.active_path),
        }
    }

    fn open(&mut self) -> Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            if let Some(parent) = self.active_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::io_operation(
                        "create log directory",
                        format!("Failed to create directory '{}'", parent.display()),
                        e,
                    )
                })?;
            }

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.active_path)
                .map_err(|e| {
                    LoggerError::file_appender(
                        self.active_path.display().to_string(),
                        format!("Failed to open: {}", e),
                    )
                })?;
            self.writer = Some(BufWriter::new(file));
        }

        self.writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))
    }

    /// Move the full file aside and start a fresh one at the same path
    fn rotate(&mut self) -> Result<()> {
        // Release the handle before the rename
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.active_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let rotated = self.rotated_path()?;
        fs::rename(&self.active_path, &rotated).map_err(|e| {
            LoggerError::file_rotation(
                self.active_path.display().to_string(),
                format!("Failed to rename to '{}': {}", rotated.display(), e),
            )
        })?;

        if let Some(metrics) = &self.metrics {
            metrics.record_rotation();
        }

        let rotated_name = rotated
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| rotated.display().to_string());
        self.last_rotated = Some(rotated);

        let writer = self.open()?;
        writeln!(writer, "Previous log {}", rotated_name).map_err(|e| {
            LoggerError::file_rotation(
                rotated_name.clone(),
                format!("Failed to write rotation header: {}", e),
            )
        })?;

        Ok(())
    }
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        "RotatingFileAppender"
    }

    fn begin_batch(&mut self) -> Result<()> {
        if self.handle_is_stale() {
            // Flushed at the end of the previous batch; nothing buffered is lost
            self.writer = None;
        }

        if self.should_rotate() {
            if let Err(e) = self.rotate() {
                // Keep logging into the current file rather than losing the batch
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );
            }
        }

        self.open().map(|_| ())
    }

    fn append(&mut self, record: &FormattedRecord) -> Result<()> {
        let written = {
            let writer = self.open()?;
            writer
                .write_all(record.line.as_bytes())
                .and_then(|()| writer.write_all(b"\n"))
        };

        written.map_err(|e| {
            LoggerError::file_appender(
                self.active_path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.active_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for RotatingFileAppender {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            // Best effort flush - ignore errors during drop
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;
    use tempfile::tempdir;

    fn write_batch(appender: &mut RotatingFileAppender, lines: &[&str]) {
        appender.begin_batch().unwrap();
        for line in lines {
            appender
                .append(&FormattedRecord::new(LogLevel::Info, *line))
                .unwrap();
        }
        appender.flush().unwrap();
    }

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().filter_map(|e| e.ok()).count()
    }

    #[test]
    fn test_stem_suffix() {
        assert_eq!(
            with_stem_suffix(Path::new("logs/net.log"), "(2)"),
            PathBuf::from("logs/net(2).log")
        );
        assert_eq!(
            with_stem_suffix(Path::new("logs/net"), "_tag"),
            PathBuf::from("logs/net_tag")
        );
    }

    #[test]
    fn test_numeric_tag_skips_existing_files() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("base.log");
        fs::write(dir.path().join("base(1).log"), "one").unwrap();
        fs::write(dir.path().join("base(2).log"), "two").unwrap();

        assert_eq!(next_numeric_path(&base).unwrap(), dir.path().join("base(3).log"));
    }

    #[test]
    fn test_single_never_rotates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("single.log");
        let mut appender =
            RotatingFileAppender::new(&path, FileHandling::Single, FileTag::Number, 10).unwrap();

        write_batch(&mut appender, &["first line exceeding ten bytes"]);
        write_batch(&mut appender, &["second line"]);

        assert_eq!(file_count(dir.path()), 1);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_single_tagged_uses_session_tag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.log");
        let appender =
            RotatingFileAppender::new(&path, FileHandling::SingleTagged, FileTag::DateTime, 10)
                .unwrap();

        let expected = format!("session_{}.log", appender.session_tag());
        assert_eq!(appender.active_path(), dir.path().join(expected));
    }

    #[test]
    fn test_single_tagged_numeric_probes_at_creation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.log");
        fs::write(dir.path().join("session(1).log"), "taken").unwrap();

        let mut appender =
            RotatingFileAppender::new(&path, FileHandling::SingleTagged, FileTag::Number, 10)
                .unwrap();
        assert_eq!(appender.active_path(), dir.path().join("session(2).log"));

        write_batch(&mut appender, &["a line that is longer than the limit"]);
        write_batch(&mut appender, &["another"]);
        // Tagged once, never rotated afterwards
        assert_eq!(file_count(dir.path()), 2);
    }

    #[test]
    fn test_split_rotates_once_before_next_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("split.log");
        let metrics = Arc::new(LoggerMetrics::new());
        let mut appender =
            RotatingFileAppender::new(&path, FileHandling::Split, FileTag::Number, 32)
                .unwrap()
                .with_metrics(Arc::clone(&metrics));

        write_batch(&mut appender, &["0123456789", "0123456789", "0123456789"]);
        assert_eq!(file_count(dir.path()), 1);

        write_batch(&mut appender, &["after rotation"]);

        assert_eq!(metrics.rotations(), 1);
        assert_eq!(file_count(dir.path()), 2);
        assert_eq!(appender.last_rotated(), Some(dir.path().join("split(1).log").as_path()));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["Previous log split(1).log", "after rotation"]);

        let rotated = fs::read_to_string(dir.path().join("split(1).log")).unwrap();
        assert_eq!(rotated.lines().count(), 3);
    }

    #[test]
    fn test_shared_path_follows_rotation_by_other_writer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.log");
        let mut first =
            RotatingFileAppender::new(&path, FileHandling::Split, FileTag::Number, 200).unwrap();
        let mut second =
            RotatingFileAppender::new(&path, FileHandling::Split, FileTag::Number, 200).unwrap();

        let long_line = "x".repeat(300);
        write_batch(&mut first, &[long_line.as_str()]);
        // Second writer finds the file full and moves it aside
        write_batch(&mut second, &["second before"]);
        write_batch(&mut first, &["first after rotation"]);
        write_batch(&mut second, &["second after rotation"]);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Previous log shared(1).log",
                "second before",
                "first after rotation",
                "second after rotation",
            ]
        );

        let rotated = fs::read_to_string(dir.path().join("shared(1).log")).unwrap();
        assert_eq!(rotated.lines().collect::<Vec<_>>(), vec![long_line.as_str()]);
        assert_eq!(file_count(dir.path()), 2);
    }

    #[test]
    fn test_reopens_when_file_removed_externally() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("removed.log");
        let mut appender =
            RotatingFileAppender::new(&path, FileHandling::Single, FileTag::Number, 0).unwrap();

        write_batch(&mut appender, &["before"]);
        fs::remove_file(&path).unwrap();
        write_batch(&mut appender, &["after"]);

        assert_eq!(fs::read_to_string(&path).unwrap(), "after\n");
    }

    #[test]
    fn test_split_with_datetime_tag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dated.log");
        let mut appender =
            RotatingFileAppender::new(&path, FileHandling::Split, FileTag::DateTime, 8).unwrap();

        write_batch(&mut appender, &["more than eight bytes"]);
        write_batch(&mut appender, &["next"]);

        let rotated = appender.last_rotated().unwrap().to_path_buf();
        let name = rotated.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("dated_"), "unexpected name {}", name);
        assert!(name.ends_with(".log"));
        assert!(rotated.exists());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().next(), Some(format!("Previous log {}", name).as_str()));
    }

    #[test]
    fn test_zero_max_size_disables_rotation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unbounded.log");
        let mut appender =
            RotatingFileAppender::new(&path, FileHandling::Split, FileTag::Number, 0).unwrap();

        write_batch(&mut appender, &["a", "b"]);
        write_batch(&mut appender, &["c"]);
        assert_eq!(file_count(dir.path()), 1);
    }

    #[test]
    fn test_creates_missing_folder_lazily() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("app.log");
        let mut appender =
            RotatingFileAppender::new(&path, FileHandling::Single, FileTag::DateTime, 0).unwrap();
        assert!(!path.exists());

        write_batch(&mut appender, &["hello"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_remove_stale_logs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("old.log"), "x").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        assert_eq!(remove_stale_logs(dir.path(), Duration::from_secs(3600)).unwrap(), 0);
        assert_eq!(remove_stale_logs(dir.path(), Duration::ZERO).unwrap(), 1);
        assert!(!dir.path().join("old.log").exists());
        assert!(dir.path().join("subdir").exists());

        let missing = dir.path().join("missing");
        assert_eq!(remove_stale_logs(&missing, Duration::ZERO).unwrap(), 0);
    }
}
