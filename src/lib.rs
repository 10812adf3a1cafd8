//! Casefile
//!
//! A leveled, file-backed logging engine. Events capture their call stack
//! where they are created and are written to files that can rotate by time
//! or by message count, be routed by level, or be replicated to several
//! destinations at once.
//!
//! # Modules
//!
//! - `event`: `LogEvent`, `Level`, stack capture and rendering
//! - `sink`: `FileSink`, `RollingSink`, `RoutingSink`, `FanOutSink`
//! - `config`: process-wide defaults (time zone, stack depth)
//! - `utils`: time zones and timestamp formatting
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use casefile::{Level, Logger, RollingSink, RotationPolicy, RoutingSink, Sink, Zone};
//!
//! fn main() -> casefile::SinkResult<()> {
//!     let errors = RollingSink::every("logs/errors.log", Duration::from_secs(3600))?;
//!
//!     let sink = RoutingSink::builder("logs/other.log")
//!         .route(Level::CRITICAL, "logs/critical.log")
//!         .route(Level::ERROR, std::sync::Arc::new(errors) as std::sync::Arc<dyn Sink>)
//!         .build_rolling(RotationPolicy::NightlyAtMidnight, Zone::Local)?;
//!
//!     sink.error("could not reach the database")?;
//!     sink.close();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod event;
pub mod sink;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::LogConfig;
pub use event::{
    as_critical, as_debug, as_error, as_info, as_ops_error, as_warning, concat_message, IntoEvent,
    Level, LogEvent, RenderMode, StackFrame,
};
pub use sink::{
    list_rolled_files, Destination, FanOutSink, FileSink, Logger, RollingSink, RotationPolicy,
    RoutingBuilder, RoutingSink, Sink, SinkError, SinkResult,
};
pub use utils::Zone;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
