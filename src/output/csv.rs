//! CSV output formatter for classification results.
//!
//! One row per candidate file, in enumeration order.
//!
//! # Columns
//!
//! - `path`: Candidate file path
//! - `digest`: Uppercase hex digest (empty when the file could not be hashed)
//! - `status`: `duplicate`, `unique` or `unknown`

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::{ClassificationOutcome, OutcomeStatus};

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    path: std::borrow::Cow<'a, str>,
    digest: Option<String>,
    status: OutcomeStatus,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    outcomes: &'a [ClassificationOutcome],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(outcomes: &'a [ClassificationOutcome]) -> Self {
        Self { outcomes }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        if self.outcomes.is_empty() {
            csv_writer.write_record(["path", "digest", "status"])?;
        }
        for outcome in self.outcomes {
            csv_writer.serialize(CsvRow {
                path: outcome.path.to_string_lossy(),
                digest: outcome.digest.map(|d| d.to_hex()),
                status: outcome.status(),
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
