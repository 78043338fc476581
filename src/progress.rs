//! Progress reporting utilities using indicatif.
//!
//! The pipeline never prints. Instead it drives a [`ProgressCallback`]
//! observer after every file; the binary plugs in [`Progress`], which renders
//! terminal bars, while tests and library users can supply their own.
//!
//! Phases, in order: `"enumerate"` (twice, once per tree), `"index"` and
//! `"classify"`.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress callback for the scan-hash-compare pipeline.
///
/// Implement this trait to receive progress updates. Only the phase and
/// per-item methods are required.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (`"enumerate"`, `"index"`, `"classify"`)
    /// * `total` - Total number of items to process (0 when unknown)
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called after each item is processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Items processed so far in this phase (1-based)
    /// * `path` - Path just processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called whenever the running duplicate count increases.
    fn on_duplicate(&self, _total: usize) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Terminal progress reporter.
///
/// A spinner while enumerating, then one bar each for the index build and the
/// classification, the latter carrying the running duplicate count.
pub struct Progress {
    multi: MultiProgress,
    active: Mutex<Option<ProgressBar>>,
    duplicates: Mutex<usize>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use refdupe::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            active: Mutex::new(None),
            duplicates: Mutex::new(0),
            quiet,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn with_active(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.active.lock() {
            if let Some(ref pb) = *guard {
                f(pb);
            }
        }
    }

    fn duplicate_message(&self) -> String {
        let count = self.duplicates.lock().map(|g| *g).unwrap_or(0);
        format!("[Duplicates found: {count}]")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = match phase {
            "enumerate" => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style());
                pb.set_message("Scanning folders");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            "index" => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style());
                pb.set_message("Building hash table");
                pb
            }
            "classify" => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style());
                pb.set_message(self.duplicate_message());
                pb
            }
            other => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style());
                pb.set_message(other.to_string());
                pb
            }
        };

        if let Ok(mut active) = self.active.lock() {
            *active = Some(pb);
        }
    }

    fn on_progress(&self, current: usize, _path: &str) {
        if self.quiet {
            return;
        }
        self.with_active(|pb| pb.set_position(current as u64));
    }

    fn on_duplicate(&self, total: usize) {
        if let Ok(mut count) = self.duplicates.lock() {
            *count = total;
        }
        if self.quiet {
            return;
        }
        let message = self.duplicate_message();
        self.with_active(|pb| pb.set_message(message));
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let message = match phase {
            "enumerate" => "Folders scan completed".to_string(),
            "index" => "Hash table completed".to_string(),
            "classify" => format!("Duplicate search completed {}", self.duplicate_message()),
            other => format!("{other} completed"),
        };

        if let Ok(mut active) = self.active.lock() {
            if let Some(pb) = active.take() {
                pb.finish_with_message(message);
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        let message = message.to_string();
        self.with_active(|pb| pb.set_message(message));
    }
}
