//! Promoting values into leveled events

use std::error::Error;
use std::fmt::{self, Display};

use super::{Level, LogEvent};

/// Values that can become a [`LogEvent`] at a given level
///
/// An existing event is only promoted and keeps its stack; anything else
/// creates a new event, capturing the stack at the conversion.
pub trait IntoEvent {
    fn into_event(self, level: Level) -> LogEvent;
}

impl IntoEvent for LogEvent {
    fn into_event(self, level: Level) -> LogEvent {
        self.promote(level)
    }
}

impl IntoEvent for &LogEvent {
    fn into_event(self, level: Level) -> LogEvent {
        self.clone().promote(level)
    }
}

impl IntoEvent for &str {
    #[inline(never)]
    fn into_event(self, level: Level) -> LogEvent {
        LogEvent::new(self, Some(level))
    }
}

impl IntoEvent for String {
    #[inline(never)]
    fn into_event(self, level: Level) -> LogEvent {
        LogEvent::new(self, Some(level))
    }
}

impl IntoEvent for fmt::Arguments<'_> {
    #[inline(never)]
    fn into_event(self, level: Level) -> LogEvent {
        LogEvent::new(self.to_string(), Some(level))
    }
}

/// Join several values into one message, separated by single spaces
pub fn concat_message(values: &[&dyn Display]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn as_critical(err: &(dyn Error + 'static)) -> LogEvent {
    LogEvent::from_error(err, Level::CRITICAL)
}

pub fn as_error(err: &(dyn Error + 'static)) -> LogEvent {
    LogEvent::from_error(err, Level::ERROR)
}

/// Prefer this over [`as_error`] when operations staff could plausibly fix it
pub fn as_ops_error(err: &(dyn Error + 'static)) -> LogEvent {
    LogEvent::from_error(err, Level::OPS_ERROR)
}

pub fn as_warning(err: &(dyn Error + 'static)) -> LogEvent {
    LogEvent::from_error(err, Level::WARNING)
}

pub fn as_info(err: &(dyn Error + 'static)) -> LogEvent {
    LogEvent::from_error(err, Level::INFO)
}

pub fn as_debug(err: &(dyn Error + 'static)) -> LogEvent {
    LogEvent::from_error(err, Level::DEBUG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_str_into_event() {
        let event = "query timed out".into_event(Level::WARNING);
        assert_eq!(event.message(), "query timed out");
        assert_eq!(event.level(), Some(&Level::WARNING));
    }

    #[test]
    fn test_format_args_into_event() {
        let attempts = 3;
        let event = format_args!("gave up after {} attempts", attempts).into_event(Level::ERROR);
        assert_eq!(event.message(), "gave up after 3 attempts");
    }

    #[test]
    fn test_event_into_event_keeps_stack() {
        let original = LogEvent::unleveled("raw");
        let frames = original.stack_frames().to_vec();
        let timestamp = *original.timestamp();

        let promoted = original.into_event(Level::INFO);
        assert_eq!(promoted.stack_frames(), frames.as_slice());
        assert_eq!(*promoted.timestamp(), timestamp);
        assert_eq!(promoted.level(), Some(&Level::INFO));
    }

    #[test]
    fn test_concat_message() {
        let code = 503;
        let msg = concat_message(&[&"upstream returned", &code, &"twice"]);
        assert_eq!(msg, "upstream returned 503 twice");
        assert_eq!(concat_message(&[]), "");
    }

    #[test]
    fn test_as_helpers_set_levels() {
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "could not connect to postgres");
        assert_eq!(as_ops_error(&err).level(), Some(&Level::OPS_ERROR));
        assert_eq!(as_critical(&err).level(), Some(&Level::CRITICAL));
        assert_eq!(as_error(&err).level(), Some(&Level::ERROR));
        assert_eq!(as_warning(&err).level(), Some(&Level::WARNING));
        assert_eq!(as_info(&err).level(), Some(&Level::INFO));
        assert_eq!(as_debug(&err).message(), "could not connect to postgres");
    }
}
