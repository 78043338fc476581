//! refdupe - reference-tree duplicate finder
//!
//! Scans a *reference* directory tree, fingerprints every file by content,
//! then reports which files in a *candidate* tree already exist in the
//! reference. Typical use is weeding out the files a recovery tool brought
//! back that you still have anyway.
//!
//! The library is split into the pipeline ([`scanner`], [`duplicates`]),
//! the failure collector ([`error_sink`]) and the surfaces around it
//! ([`config`], [`output`], [`actions`]). [`run_app`] wires them together
//! for the binary.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod error_sink;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::actions::{delete_duplicates, BatchDeleteResult, DeleteConfig};
use crate::cli::{Cli, OutputFormat};
use crate::config::{Config, RunConfig};
use crate::duplicates::{Classification, DuplicateClassifier};
use crate::error::ExitCode;
use crate::error_sink::ErrorSink;
use crate::output::{CsvOutput, ErrorLog, JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run one comparison as described by the command line.
///
/// Loads and validates configuration, classifies the candidate tree, runs the
/// optional deletion step, writes the error log and prints the report.
///
/// # Errors
///
/// Configuration errors ([`error::ConfigError`]), an unreadable root, and
/// failures writing the report. Per-file failures never end up here; they
/// are counted in the returned [`ExitCode`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.no_color {
        yansi::disable();
    }

    let mut settings = Config::load(cli.config.as_deref())?;
    settings.apply_cli(&cli);
    let run = RunConfig::validate(&cli.reference, &cli.candidate, settings)?;
    log::debug!("Validated run configuration: {:?}", run);

    let mut sink = match run.settings.error_cap {
        Some(cap) => ErrorSink::with_cap(cap),
        None => ErrorSink::new(),
    };

    let mut classifier_config = run.classifier_config();
    if !cli.quiet && run.settings.output == OutputFormat::Text {
        classifier_config = classifier_config.with_progress_callback(Arc::new(Progress::new(false)));
    }
    let classifier = DuplicateClassifier::new(classifier_config);

    let mut classification = match classifier.classify(&run.reference, &run.candidate, &mut sink)
    {
        Ok(classification) => classification,
        Err(e) => {
            save_error_log(&run, &mut sink);
            return Err(e.into());
        }
    };

    let deletion = if cli.delete {
        run_deletion(&cli, &run, &classifier, &classification, &mut sink)?
    } else {
        None
    };

    classification.summary.errors = sink.total();
    let exit_code = ExitCode::for_run(classification.summary.duplicates, sink.total());
    let dropped = sink.dropped();
    let records = save_error_log(&run, &mut sink);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run.settings.output {
        OutputFormat::Text => {
            if !cli.quiet {
                TextOutput::new(&classification, &run.reference, &run.candidate)
                    .with_error_log(&run.settings.error_log)
                    .with_duplicate_list(cli.verbose > 0)
                    .with_color_for(&io::stdout())
                    .write_to(&mut out)
                    .context("Failed to write report")?;
                if let Some(ref deletion) = deletion {
                    writeln!(out, "{}", deletion.summary())?;
                }
            }
        }
        OutputFormat::Json => {
            JsonOutput::new(&classification, &records, dropped, exit_code)
                .with_deletion(deletion.as_ref())
                .write_to(&mut out, true)
                .context("Failed to write JSON report")?;
        }
        OutputFormat::Csv => {
            CsvOutput::new(&classification.outcomes)
                .write_to(&mut out)
                .context("Failed to write CSV report")?;
        }
    }

    Ok(exit_code)
}

/// Drain the sink into the error log. A log that cannot be written is
/// reported but does not change the outcome of the run.
fn save_error_log(run: &RunConfig, sink: &mut ErrorSink) -> Vec<error_sink::ErrorRecord> {
    let dropped = sink.dropped();
    let records = sink.drain();
    if let Err(e) = ErrorLog::new(&records)
        .with_dropped(dropped)
        .save(&run.settings.error_log)
    {
        log::error!("{}", e);
    }
    records
}

fn run_deletion(
    cli: &Cli,
    run: &RunConfig,
    classifier: &DuplicateClassifier,
    classification: &Classification,
    sink: &mut ErrorSink,
) -> anyhow::Result<Option<BatchDeleteResult>> {
    let count = classification.summary.duplicates;
    if count == 0 {
        log::info!("No duplicates to delete");
        return Ok(None);
    }
    if !cli.yes && !confirm_deletion(count, cli.permanent)? {
        log::info!("Deletion skipped");
        return Ok(None);
    }

    let config = if cli.permanent {
        DeleteConfig::permanent()
    } else {
        DeleteConfig::trash()
    }
    .with_protected_root(&run.reference_canonical)
    .with_candidate_root(&run.candidate_canonical);

    Ok(Some(delete_duplicates(
        &classification.outcomes,
        classifier.hasher(),
        &config,
        sink,
    )))
}

/// Ask on the terminal before deleting. Without a terminal the answer is no.
fn confirm_deletion(count: usize, permanent: bool) -> anyhow::Result<bool> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        log::warn!("Not a terminal; pass --yes to delete without confirmation");
        return Ok(false);
    }

    let how = if permanent {
        "Permanently delete"
    } else {
        "Move to trash"
    };
    let mut stderr = io::stderr();
    write!(stderr, "{how} {count} duplicate file(s)? [y/N] ")?;
    stderr.flush()?;

    let mut answer = String::new();
    stdin
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
