//! Output formatters for classification results.
//!
//! - text for people (default)
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! plus the persistent error log written after every run.
//!
//! # Example
//!
//! ```no_run
//! use refdupe::duplicates::DuplicateClassifier;
//! use refdupe::error::ExitCode;
//! use refdupe::error_sink::ErrorSink;
//! use refdupe::output::json::JsonOutput;
//! use std::path::Path;
//!
//! let mut sink = ErrorSink::new();
//! let run = DuplicateClassifier::with_defaults()
//!     .classify(Path::new("ref"), Path::new("cand"), &mut sink)
//!     .unwrap();
//! let code = ExitCode::for_run(run.summary.duplicates, sink.total());
//!
//! let output = JsonOutput::new(&run, &sink.drain(), 0, code);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod csv;
pub mod error_log;
pub mod json;
pub mod text;

pub use csv::CsvOutput;
pub use error_log::{write_error_log, ErrorLog, ErrorLogError};
pub use json::JsonOutput;
pub use text::TextOutput;
