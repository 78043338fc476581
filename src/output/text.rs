//! Human-readable run summary.
//!
//! ```text
//! Reference  /data/originals: 1204 files, 1187 distinct digests
//! Candidate  /mnt/recovered: 3310 files
//!
//! Duplicates  2961
//! Unique       342
//! Unknown        7
//! Errors         9 (see Errors.log)
//!
//! Hashed 18.2 GiB in 41.3s (blake3)
//! ```
//!
//! Duplicate paths are listed below the summary when verbose. Colors are off
//! unless enabled, usually through [`TextOutput::with_color_for`].

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use bytesize::ByteSize;
use yansi::{Color, Paint, Style};

use crate::duplicates::Classification;

/// Text report formatter.
pub struct TextOutput<'a> {
    classification: &'a Classification,
    reference: &'a Path,
    candidate: &'a Path,
    error_log: Option<&'a Path>,
    list_duplicates: bool,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a formatter for one run.
    #[must_use]
    pub fn new(classification: &'a Classification, reference: &'a Path, candidate: &'a Path) -> Self {
        Self {
            classification,
            reference,
            candidate,
            error_log: None,
            list_duplicates: false,
            color: false,
        }
    }

    /// Mention the error log when errors were recorded.
    #[must_use]
    pub fn with_error_log(mut self, path: &'a Path) -> Self {
        self.error_log = Some(path);
        self
    }

    /// List every duplicate path after the summary.
    #[must_use]
    pub fn with_duplicate_list(mut self, enabled: bool) -> Self {
        self.list_duplicates = enabled;
        self
    }

    /// Enable or disable ANSI colors.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Enable colors only when `stream` is a terminal.
    #[must_use]
    pub fn with_color_for<T: IsTerminal>(mut self, stream: &T) -> Self {
        self.color = stream.is_terminal();
        self
    }

    fn styled(&self, text: impl ToString, style: Style) -> String {
        let text = text.to_string();
        if self.color {
            text.paint(style).to_string()
        } else {
            text
        }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let summary = &self.classification.summary;
        let label = Style::new().bold();

        writeln!(
            writer,
            "{}  {}: {} files, {} distinct digests",
            self.styled("Reference", label),
            self.reference.display(),
            summary.reference_files,
            summary.index_entries
        )?;
        writeln!(
            writer,
            "{}  {}: {} files",
            self.styled("Candidate", label),
            self.candidate.display(),
            summary.candidate_files
        )?;
        writeln!(writer)?;

        let dup_style = if summary.duplicates > 0 {
            Style::new().fg(Color::Yellow).bold()
        } else {
            Style::new().fg(Color::Green)
        };
        writeln!(
            writer,
            "Duplicates  {}",
            self.styled(format!("{:>5}", summary.duplicates), dup_style)
        )?;
        writeln!(writer, "Unique      {:>5}", summary.unique)?;
        writeln!(writer, "Unknown     {:>5}", summary.unknown)?;

        let errors = format!("{:>5}", summary.errors);
        if summary.errors == 0 {
            writeln!(writer, "Errors      {errors}")?;
        } else {
            let errors = self.styled(errors, Style::new().fg(Color::Red));
            match self.error_log {
                Some(log) => writeln!(writer, "Errors      {errors} (see {})", log.display())?,
                None => writeln!(writer, "Errors      {errors}")?,
            }
        }
        writeln!(writer)?;

        writeln!(
            writer,
            "Hashed {} in {:.1}s ({})",
            ByteSize::b(summary.bytes_hashed),
            summary.duration.as_secs_f64(),
            self.classification.algorithm
        )?;

        if self.list_duplicates && summary.duplicates > 0 {
            writeln!(writer)?;
            writeln!(writer, "{}", self.styled("Duplicate files:", label))?;
            for outcome in self.classification.duplicates() {
                writeln!(writer, "  {}", outcome.path.display())?;
            }
        }

        Ok(())
    }

    /// Render the report as a string.
    ///
    /// # Errors
    ///
    /// Only fails if formatting fails, which writing to memory does not.
    pub fn to_string(&self) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
