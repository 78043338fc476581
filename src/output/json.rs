//! JSON output formatter for classification results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "algorithm": "blake3",
//!   "outcomes": [
//!     { "path": "/cand/b.txt", "digest": "9F86D081884C7D659A2FEAA0C55AD015", "status": "duplicate" },
//!     { "path": "/cand/x.bin", "digest": null, "status": "unknown" }
//!   ],
//!   "summary": {
//!     "reference_files": 1, "candidate_files": 2, "duplicates": 1, "unique": 0,
//!     "unknown": 1, "errors": 1, "duration_ms": 12, "...": "..."
//!   },
//!   "errors": [
//!     { "context": "/cand/x.bin", "kind": "read", "message": "Permission denied: /cand/x.bin" }
//!   ],
//!   "errors_dropped": 0,
//!   "exit_code": 3,
//!   "exit_code_name": "RF003"
//! }
//! ```
//!
//! Runs with `--delete` add a `deletion` object:
//!
//! ```json
//! { "deleted": 1, "failed": 0, "aliases": 0, "bytes_freed": 4, "paths": ["/cand/b.txt"] }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::actions::BatchDeleteResult;
use crate::duplicates::{Classification, ClassificationOutcome, ClassifySummary, OutcomeStatus};
use crate::error::ExitCode;
use crate::error_sink::ErrorRecord;
use crate::scanner::HashAlgorithm;

/// One candidate outcome in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutcome {
    /// Candidate path
    pub path: String,
    /// Uppercase hex digest, null when the file could not be hashed
    pub digest: Option<String>,
    /// duplicate, unique or unknown
    pub status: OutcomeStatus,
}

impl From<&ClassificationOutcome> for JsonOutcome {
    fn from(outcome: &ClassificationOutcome) -> Self {
        Self {
            path: outcome.path.to_string_lossy().into_owned(),
            digest: outcome.digest.map(|d| d.to_hex()),
            status: outcome.status(),
        }
    }
}

/// Outcome of the deletion step.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDeletion {
    /// Files removed
    pub deleted: usize,
    /// Files that could not be removed (also listed under `errors`)
    pub failed: usize,
    /// Paths skipped because their target was already removed
    pub aliases: usize,
    /// Bytes freed
    pub bytes_freed: u64,
    /// Removed paths
    pub paths: Vec<String>,
}

impl From<&BatchDeleteResult> for JsonDeletion {
    fn from(result: &BatchDeleteResult) -> Self {
        Self {
            deleted: result.success_count(),
            failed: result.failure_count(),
            aliases: result.aliases.len(),
            bytes_freed: result.bytes_freed,
            paths: result
                .successes
                .iter()
                .map(|d| d.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Complete JSON document for one run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Digest algorithm used for the run
    pub algorithm: HashAlgorithm,
    /// One entry per candidate file
    pub outcomes: Vec<JsonOutcome>,
    /// Summary counts
    pub summary: ClassifySummary,
    /// Recorded non-fatal errors
    pub errors: Vec<ErrorRecord>,
    /// Errors counted but not kept because of the error cap
    pub errors_dropped: usize,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "RF000")
    pub exit_code_name: String,
    /// Deletion results, present only when deletion ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion: Option<JsonDeletion>,
}

impl JsonOutput {
    /// Build the document.
    #[must_use]
    pub fn new(
        classification: &Classification,
        errors: &[ErrorRecord],
        errors_dropped: usize,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            algorithm: classification.algorithm,
            outcomes: classification.outcomes.iter().map(JsonOutcome::from).collect(),
            summary: classification.summary.clone(),
            errors: errors.to_vec(),
            errors_dropped,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
            deletion: None,
        }
    }

    /// Attach the results of the deletion step.
    #[must_use]
    pub fn with_deletion(mut self, deletion: Option<&BatchDeleteResult>) -> Self {
        self.deletion = deletion.map(JsonDeletion::from);
        self
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
