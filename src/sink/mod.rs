//! Sinks - components that durably record events
//!
//! Every sink implements [`Sink`]. Concrete sinks compose:
//!
//! ```text
//!                ┌──────────────┐
//!   LogEvent ───►│ FanOutSink   │──┬──► RollingSink ──► FileSink ──► all.log
//!                └──────────────┘  │
//!                                  └──► RoutingSink ─┬► FileSink ──► errors.log
//!                                                    ├► FileSink ──► warnings.log
//!                                                    └► FileSink ──► unknown.log
//! ```
//!
//! - `FileSink`: one file, writes serialized by a lock, flushed after each record
//! - `RollingSink`: a `FileSink` plus a rotation policy
//! - `RoutingSink`: picks a sink by level, with a default for unleveled events
//! - `FanOutSink`: replicates each event to several sinks concurrently

mod error;
mod fanout;
mod file;
mod naming;
mod rolling;
mod routing;

use std::sync::Arc;

use crate::event::{IntoEvent, Level, LogEvent, RenderMode};

pub use error::{SinkError, SinkResult};
pub use fanout::{default_failure_handler, FailureHandler, FanOutSink};
pub use file::{FileSink, LoggedHook};
pub use naming::{list_rolled_files, rolled_file_name};
pub use rolling::{RollingSink, RotationPolicy};
pub use routing::{Destination, RoutingBuilder, RoutingSink};

/// Anything that can durably record an event
pub trait Sink: Send + Sync {
    /// Render `event` in `mode` and record it
    fn write(&self, event: &LogEvent, mode: RenderMode) -> SinkResult<()>;

    /// Release underlying resources; idempotent
    fn close(&self);
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write(&self, event: &LogEvent, mode: RenderMode) -> SinkResult<()> {
        (**self).write(event, mode)
    }

    fn close(&self) {
        (**self).close()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&self, event: &LogEvent, mode: RenderMode) -> SinkResult<()> {
        (**self).write(event, mode)
    }

    fn close(&self) {
        (**self).close()
    }
}

/// Convenience methods available on every sink
pub trait Logger: Sink {
    /// Write with the stack trace
    fn log(&self, event: &LogEvent) -> SinkResult<()> {
        self.write(event, RenderMode::Full)
    }

    /// Write the one-line form
    fn log_compact(&self, event: &LogEvent) -> SinkResult<()> {
        self.write(event, RenderMode::Compact)
    }

    fn log_json(&self, event: &LogEvent) -> SinkResult<()> {
        self.write(event, RenderMode::Json)
    }

    /// Promote `value` to `level` and write it with its stack trace
    fn log_at<T: IntoEvent>(&self, level: Level, value: T) -> SinkResult<()>
    where
        Self: Sized,
    {
        self.log(&value.into_event(level))
    }

    fn critical<T: IntoEvent>(&self, value: T) -> SinkResult<()>
    where
        Self: Sized,
    {
        self.log_at(Level::CRITICAL, value)
    }

    fn error<T: IntoEvent>(&self, value: T) -> SinkResult<()>
    where
        Self: Sized,
    {
        self.log_at(Level::ERROR, value)
    }

    fn ops_error<T: IntoEvent>(&self, value: T) -> SinkResult<()>
    where
        Self: Sized,
    {
        self.log_at(Level::OPS_ERROR, value)
    }

    fn warning<T: IntoEvent>(&self, value: T) -> SinkResult<()>
    where
        Self: Sized,
    {
        self.log_at(Level::WARNING, value)
    }

    fn info<T: IntoEvent>(&self, value: T) -> SinkResult<()>
    where
        Self: Sized,
    {
        self.log_at(Level::INFO, value)
    }

    fn debug<T: IntoEvent>(&self, value: T) -> SinkResult<()>
    where
        Self: Sized,
    {
        self.log_at(Level::DEBUG, value)
    }
}

impl<S: Sink + ?Sized> Logger for S {}
