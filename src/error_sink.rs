//! Append-only collection of non-fatal failures.
//!
//! Every stage of the pipeline (enumeration, index build, classification,
//! deletion) reports per-file failures here instead of aborting. The records
//! are drained once at the end of the run for reporting and for the
//! persistent error log.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Category of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A root directory could not be opened.
    Path,
    /// An entry could not be visited during enumeration.
    Traversal,
    /// A file could not be opened or fully read while hashing.
    Read,
    /// A duplicate could not be removed.
    Delete,
}

impl ErrorKind {
    /// Short lowercase label used in logs and reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Traversal => "traversal",
            Self::Read => "read",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One recorded failure: where it happened, what kind, and the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// Path of the entry (or root) the failure relates to.
    pub context: PathBuf,
    /// Failure category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl ErrorRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(kind: ErrorKind, context: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.kind,
            self.context.display(),
            self.message
        )
    }
}

/// Accumulates [`ErrorRecord`]s in insertion order.
///
/// There is no deduplication. An optional cap bounds memory on adversarial
/// trees: records past the cap are counted but not stored, so [`total`]
/// always reflects every failure seen.
///
/// [`total`]: ErrorSink::total
#[derive(Debug, Default)]
pub struct ErrorSink {
    records: Vec<ErrorRecord>,
    cap: Option<usize>,
    dropped: usize,
}

impl ErrorSink {
    /// Create an unbounded sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that stores at most `cap` records.
    #[must_use]
    pub fn with_cap(cap: usize) -> Self {
        Self {
            records: Vec::new(),
            cap: Some(cap),
            dropped: 0,
        }
    }

    /// Append a record.
    pub fn push(&mut self, record: ErrorRecord) {
        match self.cap {
            Some(cap) if self.records.len() >= cap => self.dropped += 1,
            _ => self.records.push(record),
        }
    }

    /// Append a record built from its parts.
    pub fn record(&mut self, kind: ErrorKind, context: &Path, message: impl Into<String>) {
        self.push(ErrorRecord::new(kind, context, message));
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no failure has been seen at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Records discarded because the cap was reached.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Every failure seen, stored or dropped.
    #[must_use]
    pub fn total(&self) -> usize {
        self.records.len() + self.dropped
    }

    /// Number of failures of one kind among the stored records.
    #[must_use]
    pub fn count_kind(&self, kind: ErrorKind) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }

    /// Iterate over the stored records without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }

    /// Take every stored record, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<ErrorRecord> {
        self.dropped = 0;
        std::mem::take(&mut self.records)
    }
}
