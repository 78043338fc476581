//! Persistent error log.
//!
//! Written at the end of every run, including runs that stopped on an
//! unreadable root. The file is UTF-8 text: a timestamp header, then one
//! rendered [`ErrorRecord`] per line, or the single line `No errors`.
//!
//! ```text
//! # refdupe error log, 2026-10-19 14:03:11 +02:00
//! [read] /mnt/recovered/locked.doc: Permission denied: /mnt/recovered/locked.doc
//! [traversal] /mnt/recovered/lost+found: Permission denied: /mnt/recovered/lost+found
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::error_sink::ErrorRecord;

/// Line written when there is nothing to report.
pub const NO_ERRORS: &str = "No errors";

/// Failure to write the error log.
#[derive(Debug, Error)]
#[error("Cannot write error log {path}: {source}")]
pub struct ErrorLogError {
    /// Destination that failed
    pub path: PathBuf,
    /// Underlying I/O error
    #[source]
    pub source: io::Error,
}

/// Error log contents for one run.
pub struct ErrorLog<'a> {
    records: &'a [ErrorRecord],
    dropped: usize,
    timestamp: DateTime<Local>,
}

impl<'a> ErrorLog<'a> {
    /// Log for `records`, stamped with the current local time.
    #[must_use]
    pub fn new(records: &'a [ErrorRecord]) -> Self {
        Self {
            records,
            dropped: 0,
            timestamp: Local::now(),
        }
    }

    /// Note errors that were counted but not kept.
    #[must_use]
    pub fn with_dropped(mut self, dropped: usize) -> Self {
        self.dropped = dropped;
        self
    }

    /// Write the log body.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(
            writer,
            "# refdupe error log, {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S %:z")
        )?;
        if self.records.is_empty() && self.dropped == 0 {
            writeln!(writer, "{NO_ERRORS}")?;
        } else {
            for record in self.records {
                writeln!(writer, "{record}")?;
            }
            if self.dropped > 0 {
                writeln!(writer, "... {} more errors not recorded", self.dropped)?;
            }
        }
        writer.flush()
    }

    /// Create or truncate `path` and write the log into it.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorLogError`] if the file cannot be created or written.
    pub fn save(&self, path: &Path) -> Result<(), ErrorLogError> {
        let wrap = |source| ErrorLogError {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(wrap)?;
        self.write_to(BufWriter::new(file)).map_err(wrap)?;
        log::debug!(
            "Wrote {} error records to {}",
            self.records.len(),
            path.display()
        );
        Ok(())
    }
}

/// Write `records` to the error log at `path`.
///
/// # Errors
///
/// Returns [`ErrorLogError`] if the file cannot be created or written.
pub fn write_error_log(path: &Path, records: &[ErrorRecord]) -> Result<(), ErrorLogError> {
    ErrorLog::new(records).save(path)
}
