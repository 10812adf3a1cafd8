//! Log events
//!
//! A [`LogEvent`] is created at the fault site: it records the message, an
//! optional [`Level`], the timestamp and the call stack at that moment.
//! Promoting the event to a level later never recaptures the stack, so the
//! rendered trace always points at where the problem happened rather than
//! where it was logged.
//!
//! Three render forms are available, selected by [`RenderMode`]:
//!
//! ```text
//! Compact: 2024-01-02 03:04:05 - ERROR - could not connect
//! Full:    2024-01-02 03:04:05 - ERROR - could not connect:
//!          	app::db::connect(src/db.rs:42)
//!          	app::main(src/main.rs:7)
//! Json:    {"Time":"2024-01-02 03:04:05","Level":"ERROR","Message":...}
//! ```

mod level;
mod promote;
mod stack;

use std::error::Error;
use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::config::LogConfig;
use crate::sink::SinkResult;
use crate::utils::format_timestamp;

pub use level::Level;
pub use promote::{
    as_critical, as_debug, as_error, as_info, as_ops_error, as_warning, concat_message, IntoEvent,
};
pub use stack::{capture as capture_stack, frames_to_string, StackFrame};

/// Separator written between a cause and the message it wraps
pub const CAUSED_BY: &str = "\nCaused by:\n";

/// Which render form a sink writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// `timestamp - LEVEL - message` on one line
    Compact,
    /// Compact form followed by the indented stack trace
    #[default]
    Full,
    /// Structured JSON object
    Json,
}

impl RenderMode {
    /// Bytes written after each record in this mode
    ///
    /// Full records span several lines, so they are separated by a blank line.
    pub fn record_separator(&self) -> &'static [u8] {
        match self {
            RenderMode::Full => b"\n\n",
            RenderMode::Compact | RenderMode::Json => b"\n",
        }
    }
}

/// A single log record with its captured call stack
#[derive(Debug, Clone)]
pub struct LogEvent {
    message: String,
    level: Option<Level>,
    timestamp: DateTime<FixedOffset>,
    frames: Vec<StackFrame>,
    causes: Vec<String>,
    stack_text: OnceLock<String>,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Level", skip_serializing_if = "Option::is_none")]
    level: Option<&'a Level>,
    #[serde(rename = "Message")]
    message: &'a str,
    #[serde(rename = "CausedBy", skip_serializing_if = "no_causes")]
    caused_by: &'a [String],
    #[serde(rename = "StackTrace")]
    stack_trace: &'a [StackFrame],
    #[serde(rename = "StackTraceStr")]
    stack_trace_str: &'a str,
}

fn no_causes(causes: &&[String]) -> bool {
    causes.is_empty()
}

impl LogEvent {
    /// Create an event using the installed default configuration
    #[inline(never)]
    pub fn new(message: impl Into<String>, level: Option<Level>) -> Self {
        Self::with_config(message, level, 0, &LogConfig::current())
    }

    /// Create an event capturing at most `max_stack_depth` frames, starting
    /// `skip_frames` frames above the caller
    #[inline(never)]
    pub fn with_stack(
        message: impl Into<String>,
        level: Option<Level>,
        max_stack_depth: usize,
        skip_frames: usize,
    ) -> Self {
        let config = LogConfig::current().with_max_stack_depth(max_stack_depth);
        Self::with_config(message, level, skip_frames, &config)
    }

    /// Create an event with an explicit configuration
    #[inline(never)]
    pub fn with_config(
        message: impl Into<String>,
        level: Option<Level>,
        skip_frames: usize,
        config: &LogConfig,
    ) -> Self {
        Self {
            message: message.into(),
            level,
            timestamp: config.zone.now(),
            frames: stack::capture(skip_frames, config.max_stack_depth),
            causes: Vec::new(),
            stack_text: OnceLock::new(),
        }
    }

    /// Assemble an event from already known parts, without capturing a stack
    pub fn from_parts(
        message: impl Into<String>,
        level: Option<Level>,
        timestamp: DateTime<FixedOffset>,
        frames: Vec<StackFrame>,
    ) -> Self {
        Self {
            message: message.into(),
            level,
            timestamp,
            frames,
            causes: Vec::new(),
            stack_text: OnceLock::new(),
        }
    }

    /// Event with no level; routed to default sinks only
    pub fn unleveled(message: impl Into<String>) -> Self {
        Self::new(message, None)
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self::new(message, Some(Level::CRITICAL))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Some(Level::ERROR))
    }

    pub fn ops_error(message: impl Into<String>) -> Self {
        Self::new(message, Some(Level::OPS_ERROR))
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Some(Level::WARNING))
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Some(Level::INFO))
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(message, Some(Level::DEBUG))
    }

    /// Turn any error into a leveled event
    ///
    /// If `err` already is a [`LogEvent`] it is only re-promoted and keeps its
    /// stack. Otherwise a stack is captured here; the innermost `source()`
    /// becomes the message and the errors wrapping it become the cause chain.
    #[inline(never)]
    pub fn from_error(err: &(dyn Error + 'static), level: Level) -> Self {
        if let Some(event) = err.downcast_ref::<LogEvent>() {
            return event.clone().promote(level);
        }

        let mut chain = vec![err.to_string()];
        let mut source = err.source();
        while let Some(inner) = source {
            chain.push(inner.to_string());
            source = inner.source();
        }

        let message = chain.pop().unwrap_or_default();
        let mut event = Self::new(message, Some(level));
        event.causes = chain;
        event
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn timestamp(&self) -> &DateTime<FixedOffset> {
        &self.timestamp
    }

    pub fn stack_frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// Wrapping messages, outer-most first
    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    /// Set or overwrite the level; stack and timestamp are untouched
    pub fn promote(mut self, level: Level) -> Self {
        self.set_level(level);
        self
    }

    /// In-place form of [`promote`](Self::promote)
    pub fn set_level(&mut self, level: Level) {
        self.level = Some(level);
    }

    /// Push a new outer-most cause message
    pub fn prepend_cause(&mut self, message: impl Into<String>) {
        self.causes.insert(0, message.into());
    }

    /// Builder form of [`prepend_cause`](Self::prepend_cause)
    pub fn caused(mut self, message: impl Into<String>) -> Self {
        self.prepend_cause(message);
        self
    }

    /// Rendered stack trace, computed on first use and cached
    pub fn stack_trace(&self) -> &str {
        self.stack_text.get_or_init(|| frames_to_string(&self.frames))
    }

    fn write_causes(&self, out: &mut String) {
        for cause in &self.causes {
            out.push_str(cause);
            out.push_str(CAUSED_BY);
        }
    }

    fn compact_string(&self) -> String {
        let mut out = String::new();
        self.write_causes(&mut out);
        out.push_str(&format_timestamp(&self.timestamp));
        out.push_str(" - ");
        if let Some(level) = &self.level {
            out.push_str(level.label());
            out.push_str(" - ");
        }
        out.push_str(&self.message);
        out
    }

    /// `[causes...]<timestamp> - [<LEVEL> - ]<message>`
    pub fn render_compact(&self) -> Vec<u8> {
        self.compact_string().into_bytes()
    }

    /// Compact form, `":\n"`, then one indented frame per line
    pub fn render_full(&self) -> Vec<u8> {
        let mut out = self.compact_string();
        out.push_str(":\n");
        out.push_str(self.stack_trace());
        out.into_bytes()
    }

    /// JSON object with `Time`, `Level`, `Message`, `StackTrace`, `StackTraceStr`
    pub fn render_json(&self) -> SinkResult<Vec<u8>> {
        let record = JsonRecord {
            time: format_timestamp(&self.timestamp),
            level: self.level.as_ref(),
            message: &self.message,
            caused_by: &self.causes,
            stack_trace: &self.frames,
            stack_trace_str: self.stack_trace(),
        };
        Ok(serde_json::to_vec(&record)?)
    }

    /// Render in the given mode
    pub fn render(&self, mode: RenderMode) -> SinkResult<Vec<u8>> {
        match mode {
            RenderMode::Compact => Ok(self.render_compact()),
            RenderMode::Full => Ok(self.render_full()),
            RenderMode::Json => self.render_json(),
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cause in &self.causes {
            write!(f, "{}{}", cause, CAUSED_BY)?;
        }
        f.write_str(&self.message)
    }
}

impl Error for LogEvent {}
