//! Rolling file sink
//!
//! A [`RollingSink`] owns a [`FileSink`] and replaces its file when the
//! rotation policy fires:
//!
//! ```text
//! Active(path, since) ──trigger──► Rolling (under the file lock) ──► Active(new_path, 0)
//! ```
//!
//! - `MessageCount(n)`: checked in the write path, under the same lock as the
//!   write, so the n-th record is the last one in its file.
//! - `FixedInterval(d)` and `NightlyAtMidnight`: a background thread sleeps
//!   until the next boundary and rolls, until the sink is closed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::{Condvar, Mutex};

use super::file::FileState;
use super::naming::rolled_file_name;
use super::{FileSink, Sink, SinkError, SinkResult};
use crate::config::LogConfig;
use crate::event::{LogEvent, RenderMode};
use crate::utils::Zone;

/// Wake slightly after midnight so the new date is already current
const NIGHTLY_MARGIN: Duration = Duration::from_millis(10);

/// When a [`RollingSink`] starts a new file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPolicy {
    /// Roll every `duration`, regardless of traffic
    FixedInterval(Duration),
    /// Roll at every local midnight of the sink's zone
    NightlyAtMidnight,
    /// Roll after this many records
    MessageCount(usize),
}

impl RotationPolicy {
    fn validate(&self) -> SinkResult<()> {
        match self {
            RotationPolicy::MessageCount(0) => Err(SinkError::Config(
                "log files must have room for at least 1 message".to_string(),
            )),
            RotationPolicy::FixedInterval(d) if d.is_zero() => Err(SinkError::Config(
                "rotation interval must be greater than zero".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// How long the timer sleeps before the next roll; `None` when untimed
    fn next_wait(&self, zone: Zone) -> Option<Duration> {
        match self {
            RotationPolicy::FixedInterval(duration) => Some(*duration),
            RotationPolicy::NightlyAtMidnight => {
                Some(zone.until_next_midnight(Utc::now()) + NIGHTLY_MARGIN)
            }
            RotationPolicy::MessageCount(_) => None,
        }
    }
}

struct Shared {
    file: FileSink,
    base: PathBuf,
    policy: RotationPolicy,
    zone: Zone,
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl Shared {
    fn next_path(&self) -> PathBuf {
        rolled_file_name(&self.base, self.zone.date_of(Utc::now()), |p| p.exists())
    }

    fn roll(&self) -> SinkResult<()> {
        let mut state = self.file.lock();
        self.roll_locked(&mut state)
    }

    /// Swap to a newly named file; a no-op once the sink is closed
    fn roll_locked(&self, state: &mut FileState) -> SinkResult<()> {
        if state.is_closed() {
            return Ok(());
        }

        let previous = state.path().to_path_buf();
        let next = self.next_path();

        state.reopen(next.clone()).map_err(|source| SinkError::Rotation {
            path: next.clone(),
            source,
        })?;

        tracing::info!(
            from = %previous.display(),
            to = %next.display(),
            "rolled log file"
        );
        Ok(())
    }

    /// Sleep for `wait` unless stopped first; returns whether still running
    fn sleep(&self, wait: Duration) -> bool {
        let deadline = Instant::now() + wait;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        !*stopped
    }

    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }
}

fn run_timer(shared: Arc<Shared>) {
    while let Some(wait) = shared.policy.next_wait(shared.zone) {
        if !shared.sleep(wait) {
            return;
        }

        if let Err(e) = shared.roll() {
            tracing::error!(
                base = %shared.base.display(),
                error = %e,
                "timed log rotation failed; rotation stopped"
            );
            return;
        }
    }
}

/// A file sink that starts a new file according to a [`RotationPolicy`]
pub struct RollingSink {
    shared: Arc<Shared>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl RollingSink {
    /// Create a rolling sink using the installed default zone
    pub fn new<P: AsRef<Path>>(base: P, policy: RotationPolicy) -> SinkResult<Self> {
        Self::with_zone(base, policy, LogConfig::current().zone)
    }

    /// Create a rolling sink whose dates and midnights follow `zone`
    ///
    /// Message-count sinks start writing to `base` itself; time-based sinks
    /// start with a dated name right away.
    pub fn with_zone<P: AsRef<Path>>(base: P, policy: RotationPolicy, zone: Zone) -> SinkResult<Self> {
        policy.validate()?;
        let base = base.as_ref().to_path_buf();

        let first = match policy {
            RotationPolicy::MessageCount(_) => base.clone(),
            _ => rolled_file_name(&base, zone.date_of(Utc::now()), |p| p.exists()),
        };

        let shared = Arc::new(Shared {
            file: FileSink::open(&first)?,
            base,
            policy,
            zone,
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });

        let timer = match policy {
            RotationPolicy::MessageCount(_) => None,
            _ => {
                let timer_shared = Arc::clone(&shared);
                let handle = thread::Builder::new()
                    .name("casefile-roll".to_string())
                    .spawn(move || run_timer(timer_shared))
                    .map_err(|source| SinkError::Timer {
                        path: shared.base.clone(),
                        source,
                    })?;
                Some(handle)
            }
        };

        Ok(Self {
            shared,
            timer: Mutex::new(timer),
        })
    }

    /// Roll at every midnight
    pub fn nightly<P: AsRef<Path>>(base: P) -> SinkResult<Self> {
        Self::new(base, RotationPolicy::NightlyAtMidnight)
    }

    /// Roll every `duration`
    pub fn every<P: AsRef<Path>>(base: P, duration: Duration) -> SinkResult<Self> {
        Self::new(base, RotationPolicy::FixedInterval(duration))
    }

    /// Roll after `messages_per_file` records
    pub fn by_count<P: AsRef<Path>>(base: P, messages_per_file: usize) -> SinkResult<Self> {
        Self::new(base, RotationPolicy::MessageCount(messages_per_file))
    }

    /// Roll immediately
    pub fn roll(&self) -> SinkResult<()> {
        self.shared.roll()
    }

    pub fn policy(&self) -> RotationPolicy {
        self.shared.policy
    }

    /// Path rolled names are derived from
    pub fn base_path(&self) -> &Path {
        &self.shared.base
    }

    /// File currently written to
    pub fn current_path(&self) -> PathBuf {
        self.shared.file.path()
    }

    /// Records written to the current file
    pub fn records(&self) -> usize {
        self.shared.file.records()
    }
}

impl Sink for RollingSink {
    fn write(&self, event: &LogEvent, mode: RenderMode) -> SinkResult<()> {
        let shared = &self.shared;
        shared.file.write_then(event, mode, |state| {
            let RotationPolicy::MessageCount(threshold) = shared.policy else {
                return;
            };
            if state.records() < threshold {
                return;
            }
            // The record is already durable; a failed roll shows up on the next write
            if let Err(e) = shared.roll_locked(state) {
                tracing::error!(base = %shared.base.display(), error = %e, "log rotation failed");
            }
        })
    }

    /// Stop the timer and close the file without waiting for the timer
    /// thread. A timer already past its sleep may still attempt one roll,
    /// which is ignored.
    fn close(&self) {
        self.shared.stop();
        self.shared.file.close();
        self.timer.lock().take();
    }
}

impl Drop for RollingSink {
    fn drop(&mut self) {
        self.close();
    }
}
