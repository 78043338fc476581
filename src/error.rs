//! Structured error handling and exit codes.

use std::path::PathBuf;

use serde::Serialize;

/// Exit codes for the refdupe application.
///
/// - 0: Success (completed normally, duplicates found)
/// - 1: General error (unexpected failure, unreadable root)
/// - 2: No duplicates found (completed normally, no duplicates)
/// - 3: Partial success (completed with some non-fatal errors)
/// - 4: Invalid configuration (rejected before scanning)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed and duplicates were found.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Partial success: Scan completed but encountered some non-fatal errors.
    PartialSuccess = 3,
    /// Invalid configuration: The inputs were rejected before scanning.
    InvalidConfig = 4,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "RF000",
            Self::GeneralError => "RF001",
            Self::NoDuplicates => "RF002",
            Self::PartialSuccess => "RF003",
            Self::InvalidConfig => "RF004",
        }
    }

    /// Exit code for a completed run.
    ///
    /// Errors take precedence over the duplicate count.
    #[must_use]
    pub fn for_run(duplicates: usize, errors: usize) -> Self {
        if errors > 0 {
            Self::PartialSuccess
        } else if duplicates == 0 {
            Self::NoDuplicates
        } else {
            Self::Success
        }
    }

    /// Exit code for an error that ended the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<ConfigError>().is_some() {
            Self::InvalidConfig
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "RF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}

/// Input rejected at the configuration boundary.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A root directory does not exist.
    #[error("Directory not found: {0}")]
    NotFound(PathBuf),

    /// A root exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Both roots name the same directory.
    #[error("Reference and candidate are the same directory: {0}")]
    SamePath(PathBuf),

    /// One root lies inside the other.
    #[error("{inner} is inside {outer}; the two trees must not overlap")]
    Nested {
        /// The enclosing root
        outer: PathBuf,
        /// The enclosed root
        inner: PathBuf,
    },

    /// A root could not be resolved.
    #[error("Cannot resolve {path}: {source}")]
    Unresolvable {
        /// Path being resolved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A setting has a value outside its allowed range.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// Setting name
        key: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// A configuration layer failed to load or had invalid values.
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}
