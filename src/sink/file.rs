//! Single-file sink
//!
//! Records are appended to one file under a lock and synced to disk before
//! the write returns, so concurrent writers never interleave their bytes and
//! every acknowledged record survives a crash.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::{Sink, SinkError, SinkResult};
use crate::event::{LogEvent, RenderMode};

/// Called with each event after it has been durably written
pub type LoggedHook = Arc<dyn Fn(&LogEvent) + Send + Sync>;

/// Mutable state guarded by the sink's lock
#[derive(Debug)]
pub(crate) struct FileState {
    path: PathBuf,
    file: Option<File>,
    /// Records written to the current file
    records: usize,
    closed: bool,
    /// Set when a roll could not open its new file
    broken: Option<(io::ErrorKind, String)>,
}

impl FileState {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn records(&self) -> usize {
        self.records
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    fn append(&mut self, bytes: &[u8]) -> SinkResult<()> {
        if self.closed {
            return Err(SinkError::Closed {
                path: self.path.clone(),
            });
        }

        if let Some((kind, message)) = &self.broken {
            return Err(SinkError::Rotation {
                path: self.path.clone(),
                source: io::Error::new(*kind, message.clone()),
            });
        }

        let path = &self.path;
        let file = self.file.as_mut().ok_or_else(|| SinkError::Closed { path: path.clone() })?;

        let written = file.write_all(bytes).and_then(|_| file.sync_all());
        written.map_err(|source| SinkError::Write {
            path: path.clone(),
            source,
        })?;

        self.records += 1;
        Ok(())
    }

    /// Swap the current file for a freshly opened one at `path`
    ///
    /// The old handle is released first. If the new file cannot be opened the
    /// state is left without a file and later appends report the failure.
    pub(crate) fn reopen(&mut self, path: PathBuf) -> io::Result<()> {
        self.file = None;
        self.records = 0;
        self.path = path;

        match open_append(&self.path) {
            Ok(file) => {
                self.file = Some(file);
                self.broken = None;
                Ok(())
            }
            Err(e) => {
                self.broken = Some((e.kind(), e.to_string()));
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.sync_all() {
                tracing::warn!(path = %self.path.display(), error = %e, "final sync of log file failed");
            }
        }
        self.closed = true;
    }
}

/// Open `path` for appending, creating it and its parent directories
pub(crate) fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Appends events to a single file
pub struct FileSink {
    state: Mutex<FileState>,
    on_logged: Option<LoggedHook>,
}

impl FileSink {
    /// Open `path` in append mode, creating the file if it does not exist
    pub fn open<P: AsRef<Path>>(path: P) -> SinkResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path).map_err(|source| SinkError::Open {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "opened log file");

        Ok(Self {
            state: Mutex::new(FileState {
                path,
                file: Some(file),
                records: 0,
                closed: false,
                broken: None,
            }),
            on_logged: None,
        })
    }

    /// Run `hook` after every successful write
    pub fn with_hook(mut self, hook: LoggedHook) -> Self {
        self.on_logged = Some(hook);
        self
    }

    /// Path of the file currently written to
    pub fn path(&self) -> PathBuf {
        self.state.lock().path.clone()
    }

    /// Records written to the current file since it was opened
    pub fn records(&self) -> usize {
        self.state.lock().records
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, FileState> {
        self.state.lock()
    }

    /// Write `event`, then run `after` while still holding the lock
    pub(crate) fn write_then<F>(&self, event: &LogEvent, mode: RenderMode, after: F) -> SinkResult<()>
    where
        F: FnOnce(&mut FileState),
    {
        let mut bytes = event.render(mode)?;
        bytes.extend_from_slice(mode.record_separator());

        {
            let mut state = self.state.lock();
            state.append(&bytes)?;
            after(&mut state);
        }

        if let Some(hook) = &self.on_logged {
            hook(event);
        }
        Ok(())
    }
}

impl Sink for FileSink {
    fn write(&self, event: &LogEvent, mode: RenderMode) -> SinkResult<()> {
        self.write_then(event, mode, |_| {})
    }

    fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            state.close();
            tracing::debug!(path = %state.path.display(), "closed log file");
        }
    }
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink")
            .field("state", &*self.state.lock())
            .field("on_logged", &self.on_logged.is_some())
            .finish()
    }
}
