//! Call-stack capture
//!
//! Frames are captured and symbolized once, when an event is created.
//! Frames belonging to the unwinder and to this crate's own plumbing are
//! dropped before `skip` is applied, so a skip of zero starts at the code
//! that asked for the event.

use std::fmt::Write as _;

use backtrace::Backtrace;
use serde::Serialize;

const CRATE_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");
const CRATE_TRAIT_MARKER: &str = concat!(" as ", env!("CARGO_CRATE_NAME"), "::");

/// One symbolized call-stack frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackFrame {
    #[serde(rename = "FunctionName")]
    pub function: String,
    #[serde(rename = "File")]
    pub file: String,
    #[serde(rename = "Line")]
    pub line: u32,
}

impl StackFrame {
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
        }
    }
}

/// Capture at most `max_depth` frames, skipping `skip` frames above the caller
///
/// Never fails: a stack that cannot be walked or symbolized yields fewer
/// frames, possibly none.
#[inline(never)]
pub fn capture(skip: usize, max_depth: usize) -> Vec<StackFrame> {
    if max_depth == 0 {
        return Vec::new();
    }

    let backtrace = Backtrace::new();

    backtrace
        .frames()
        .iter()
        .flat_map(|frame| frame.symbols())
        .map(|symbol| {
            let function = symbol
                .name()
                .map(|name| format!("{:#}", name))
                .unwrap_or_else(|| "???".to_string());
            let file = symbol
                .filename()
                .map(|path| path.display().to_string())
                .unwrap_or_default();
            StackFrame::new(function, file, symbol.lineno().unwrap_or(0))
        })
        .skip_while(|frame| is_internal(&frame.function))
        .skip(skip)
        .take(max_depth)
        .collect()
}

fn is_internal(function: &str) -> bool {
    let name = function.trim_start_matches('<');
    if name.starts_with("backtrace::") {
        return true;
    }
    let ours = name.starts_with(CRATE_PREFIX) || name.contains(CRATE_TRAIT_MARKER);
    ours && !name.contains("::tests::")
}

/// Render frames as indented `function(file:line)` lines
pub fn frames_to_string(frames: &[StackFrame]) -> String {
    let mut out = String::with_capacity(frames.len() * 96);
    for (i, frame) in frames.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "\t{}({}:{})", frame.function, frame.file, frame.line);
    }
    out
}
