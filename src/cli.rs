//! Command-line interface definitions for refdupe.
//!
//! # Example
//!
//! ```bash
//! # Which recovered files already exist in the originals?
//! refdupe /data/originals /mnt/recovered
//!
//! # Same, with MD5 digests and a JSON report
//! refdupe /data/originals /mnt/recovered --algorithm md5 --output json
//!
//! # Move the duplicates to the trash without asking
//! refdupe /data/originals /mnt/recovered --delete --yes
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::scanner::HashAlgorithm;

/// Find files in a candidate tree whose content already exists in a
/// reference tree.
///
/// The reference tree is only ever read. Candidate files are reported as
/// duplicate, unique or unknown (unreadable); with --delete the duplicates
/// are moved to the system trash.
#[derive(Debug, Parser)]
#[command(name = "refdupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Read settings from this TOML file (on top of the user config file)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Reference directory (never modified)
    #[arg(value_name = "REFERENCE")]
    pub reference: PathBuf,

    /// Candidate directory checked against the reference
    #[arg(value_name = "CANDIDATE")]
    pub candidate: PathBuf,

    /// Digest algorithm [default: blake3]
    #[arg(long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Files larger than this are hashed in chunks of this size (e.g. 64MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Do not descend into symlinked directories
    #[arg(long)]
    pub no_follow_symlinks: bool,

    /// Report format [default: text]
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Where to write the error log [default: Errors.log]
    #[arg(long, value_name = "PATH")]
    pub error_log: Option<PathBuf>,

    /// Delete duplicate candidate files after the scan
    #[arg(long)]
    pub delete: bool,

    /// Delete permanently instead of moving to the trash
    ///
    /// Warning: Files cannot be recovered after permanent deletion.
    #[arg(long, requires = "delete")]
    pub permanent: bool,

    /// Skip the deletion confirmation prompt
    #[arg(short = 'y', long, requires = "delete")]
    pub yes: bool,
}

/// Report format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// JSON document for scripting
    Json,
    /// One CSV row per candidate file
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use refdupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("256MiB").unwrap(), 268_435_456);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
