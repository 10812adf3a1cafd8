//! Concurrent replication to several sinks
//!
//! A write dispatches one task per member on the rayon pool and waits for all
//! of them. Member failures go to a [`FailureHandler`] and never reach the
//! caller.

use std::sync::Arc;

use super::{Sink, SinkError, SinkResult};
use crate::event::{LogEvent, RenderMode};

/// Receives every error a member sink returns
pub type FailureHandler = Arc<dyn Fn(&SinkError) + Send + Sync>;

/// Report member failures through `tracing`
pub fn default_failure_handler() -> FailureHandler {
    Arc::new(|error: &SinkError| {
        tracing::error!(error = %error, path = ?error.path(), "fan-out member failed to write");
    })
}

/// Writes each event to every member sink
pub struct FanOutSink {
    sinks: Arc<[Arc<dyn Sink>]>,
    on_failure: FailureHandler,
}

impl FanOutSink {
    pub fn new<I>(sinks: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Sink>>,
    {
        Self::with_failure_handler(sinks, default_failure_handler())
    }

    pub fn with_failure_handler<I>(sinks: I, on_failure: FailureHandler) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Sink>>,
    {
        Self {
            sinks: sinks.into_iter().collect(),
            on_failure,
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Sink for FanOutSink {
    /// Always `Ok`; member errors are handed to the failure handler
    fn write(&self, event: &LogEvent, mode: RenderMode) -> SinkResult<()> {
        let on_failure = &self.on_failure;
        rayon::scope(|scope| {
            for sink in self.sinks.iter() {
                scope.spawn(move |_| {
                    if let Err(e) = sink.write(event, mode) {
                        on_failure(&e);
                    }
                });
            }
        });
        Ok(())
    }

    /// Starts closing every member and returns without waiting
    fn close(&self) {
        for sink in self.sinks.iter() {
            let sink = Arc::clone(sink);
            rayon::spawn(move || sink.close());
        }
    }
}

impl std::fmt::Debug for FanOutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
