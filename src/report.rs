//! Per-entry reporting for archive builds.
//!
//! The builder announces every file it adds and every path it deliberately
//! skips through a [`Reporter`] handed in by the caller, so the walk itself
//! stays free of global logging and tests can capture the events directly.

use std::fmt;
use std::path::Path;

use tracing::info;

/// Why a path was left out of the archive. These are policy decisions, not
/// errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SymbolicLink,
    NamedPipe,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SymbolicLink => write!(f, "symbolic link"),
            SkipReason::NamedPipe => write!(f, "named pipe"),
        }
    }
}

/// Receives build events from the archive walk.
pub trait Reporter {
    fn adding(&self, path: &Path);
    fn skipping(&self, path: &Path, reason: SkipReason);
}

/// Production reporter: emits one `tracing` line per event.
#[derive(Debug, Default)]
pub struct TraceReporter;

impl Reporter for TraceReporter {
    fn adding(&self, path: &Path) {
        info!(file = %path.display(), "adding file");
    }

    fn skipping(&self, path: &Path, reason: SkipReason) {
        info!(file = %path.display(), "not adding file, it's a {}", reason);
    }
}

/// Discards every event. Handy for library callers that want a quiet build.
#[derive(Debug, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn adding(&self, _path: &Path) {}
    fn skipping(&self, _path: &Path, _reason: SkipReason) {}
}
