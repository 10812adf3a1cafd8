//! Engine configuration
//!
//! [`LogConfig`] carries the values every event and rolling sink needs: the
//! time zone and the stack capture depth. Constructors that take no explicit
//! configuration read the process-wide defaults, which can be installed once
//! at startup and are read-only afterwards.

use std::env;
use std::sync::OnceLock;

use crate::sink::{SinkError, SinkResult};
use crate::utils::Zone;

/// Default maximum number of captured stack frames
pub const DEFAULT_STACK_DEPTH: usize = 256;

/// Environment variable holding the time zone (`UTC`, `local`, `+05:30`,
/// `America/Los_Angeles`)
pub const ENV_TIMEZONE: &str = "CASEFILE_TIMEZONE";

/// Environment variable holding the maximum stack depth
pub const ENV_STACK_DEPTH: &str = "CASEFILE_STACK_DEPTH";

static INSTALLED: OnceLock<LogConfig> = OnceLock::new();

/// Configuration shared by events and rolling sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Zone used for timestamps and midnight rotation
    pub zone: Zone,
    /// Maximum number of frames captured per event
    pub max_stack_depth: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            zone: Zone::Utc,
            max_stack_depth: DEFAULT_STACK_DEPTH,
        }
    }
}

impl LogConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time zone
    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = zone;
        self
    }

    /// Set the maximum stack depth
    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    /// Build a configuration from `CASEFILE_*` environment variables
    ///
    /// Unset variables keep their defaults; set but invalid ones are errors.
    pub fn from_env() -> SinkResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> SinkResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(zone) = lookup(ENV_TIMEZONE) {
            config.zone = zone.parse()?;
        }

        if let Some(depth) = lookup(ENV_STACK_DEPTH) {
            config.max_stack_depth = depth.trim().parse().map_err(|_| {
                SinkError::Config(format!("{} must be a non-negative integer, got {:?}", ENV_STACK_DEPTH, depth))
            })?;
        }

        Ok(config)
    }

    /// Install this configuration as the process-wide default
    ///
    /// Must happen before any sink is constructed. Fails if a configuration
    /// was already installed.
    pub fn install(self) -> SinkResult<()> {
        INSTALLED
            .set(self)
            .map_err(|_| SinkError::Config("a default configuration is already installed".to_string()))?;
        tracing::debug!(zone = %self.zone, max_stack_depth = self.max_stack_depth, "installed default log config");
        Ok(())
    }

    /// The installed configuration, or the built-in default
    pub fn current() -> LogConfig {
        INSTALLED.get().copied().unwrap_or_default()
    }
}
