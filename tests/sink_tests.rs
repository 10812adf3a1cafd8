//! Sink Integration Tests
//!
//! End-to-end behavior of the public sink API:
//! - Level routing with shared destinations
//! - Count-based rotation across several files
//! - Concurrent writers against one rolling sink
//! - Fan-out isolation of a broken member
//! - Promoting plain errors before logging

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use casefile::sink::FailureHandler;
use casefile::{
    as_ops_error, list_rolled_files, FanOutSink, FileSink, Level, LogEvent, Logger, RenderMode,
    RollingSink, RotationPolicy, RoutingSink, Sink, SinkError, Zone,
};
use tempfile::TempDir;

fn line_count(path: &Path) -> usize {
    fs::read_to_string(path).unwrap().lines().count()
}

#[test]
fn test_routing_scenario_shares_sink_for_shared_path() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let constructed = AtomicUsize::new(0);

    let routing = RoutingSink::builder(dir.join("d.log"))
        .route(Level::CRITICAL, dir.join("a.log"))
        .route(Level::ERROR, dir.join("a.log"))
        .route(Level::WARNING, dir.join("b.log"))
        .build_with(|path| {
            constructed.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FileSink::open(path)?) as Arc<dyn Sink>)
        })
        .unwrap();

    routing.log_compact(&LogEvent::critical("critical")).unwrap();
    routing.log_compact(&LogEvent::warning("warning")).unwrap();
    routing.log_compact(&LogEvent::unleveled("unleveled")).unwrap();
    routing.close();

    assert_eq!(line_count(&dir.join("a.log")), 1);
    assert_eq!(line_count(&dir.join("b.log")), 1);
    assert_eq!(line_count(&dir.join("d.log")), 1);

    // Two route files plus the default
    assert_eq!(routing.route_sink_count(), 2);
    assert_eq!(constructed.load(Ordering::SeqCst), 3);
}

#[test]
fn test_message_count_rotation_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("x.log");

    let sink = RollingSink::with_zone(&base, RotationPolicy::MessageCount(3), Zone::Utc).unwrap();
    for i in 0..7 {
        sink.log_compact(&LogEvent::info(format!("event {}", i))).unwrap();
    }
    sink.close();

    let files = list_rolled_files(&base).unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[0], base);

    let counts: Vec<usize> = files.iter().map(|p| line_count(p)).collect();
    assert_eq!(counts, vec![3, 3, 1]);

    let last = fs::read_to_string(&files[2]).unwrap();
    assert!(last.contains("event 6"));
}

#[test]
fn test_concurrent_writers_against_rolling_sink() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("busy.log");
    let sink = Arc::new(RollingSink::with_zone(&base, RotationPolicy::MessageCount(10), Zone::Utc).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let sink = Arc::clone(&sink);
            thread::spawn(move || {
                for i in 0..25 {
                    sink.info(format!("writer {} record {}", t, i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    sink.close();

    let files = list_rolled_files(&base).unwrap();
    let mut total = 0;
    for file in &files {
        let content = fs::read_to_string(file).unwrap();
        let records = content.matches(" - INFO - writer ").count();
        assert!(records <= 10, "{} holds {} records", file.display(), records);
        total += records;
    }
    assert_eq!(total, 200);
}

#[test]
fn test_fanout_isolates_broken_member() {
    struct Broken;

    impl Sink for Broken {
        fn write(&self, _event: &LogEvent, _mode: RenderMode) -> casefile::SinkResult<()> {
            Err(SinkError::Closed {
                path: PathBuf::from("broken.log"),
            })
        }

        fn close(&self) {}
    }

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ok.log");
    let failures = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&failures);
    let handler: FailureHandler = Arc::new(move |_error: &SinkError| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let fanout = FanOutSink::with_failure_handler(
        vec![
            Arc::new(Broken) as Arc<dyn Sink>,
            Arc::new(FileSink::open(&path).unwrap()) as Arc<dyn Sink>,
        ],
        handler,
    );

    for i in 0..3 {
        assert!(fanout.log_compact(&LogEvent::error(format!("r{}", i))).is_ok());
        assert_eq!(failures.load(Ordering::SeqCst), i + 1);
    }
    assert_eq!(line_count(&path), 3);
}

#[derive(Debug)]
struct QueryFailed(std::io::Error);

impl fmt::Display for QueryFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("query failed")
    }
}

impl Error for QueryFailed {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

#[test]
fn test_promoted_error_renders_cause_chain() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ops.log");
    let sink = FileSink::open(&path).unwrap();

    let err = QueryFailed(std::io::Error::new(std::io::ErrorKind::Other, "connection reset"));
    let event = as_ops_error(&err);
    sink.log(&event).unwrap();
    sink.log_json(&event).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("query failed\nCaused by:\n"));
    assert!(content.contains(" - OPS_ERROR - connection reset:\n"));

    let json_line = content.lines().last().unwrap();
    let value: serde_json::Value = serde_json::from_str(json_line).unwrap();
    assert_eq!(value["Level"], "OPS_ERROR");
    assert_eq!(value["Message"], "connection reset");
    assert_eq!(value["CausedBy"][0], "query failed");
}

#[test]
fn test_build_rolling_routes_share_rotation_counter() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    let routing = RoutingSink::builder(dir.join("rest.log"))
        .route(Level::ERROR, dir.join("errors.log"))
        .route(Level::CRITICAL, dir.join("errors.log"))
        .build_rolling(RotationPolicy::MessageCount(2), Zone::Utc)
        .unwrap();

    routing.log_compact(&LogEvent::error("e1")).unwrap();
    routing.log_compact(&LogEvent::critical("c1")).unwrap();
    routing.log_compact(&LogEvent::error("e2")).unwrap();
    routing.log_compact(&LogEvent::debug("d1")).unwrap();
    routing.close();

    let errors = list_rolled_files(dir.join("errors.log")).unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(line_count(&errors[0]), 2);
    assert_eq!(line_count(&errors[1]), 1);
    assert_eq!(line_count(&dir.join("rest.log")), 1);
}
