//! CLI output formatting.
//!
//! User-facing lines are built by pure `format_*` functions (returning
//! `Vec<String>` or `String`) so they can be tested without capturing stdout,
//! and written by thin `print_*` wrappers. Per-file progress goes through
//! [`ProgressReporter`], an `indicatif` bar on stderr.
//!
//! # Output Format
//!
//! ```text
//! Processing images from: raw
//! Saving processed images to: processed
//! Processing Images [00:00:02] [########>-----------] 41/97 (20.3/s 3s)
//! Could not process file broken.png: Failed to decode raw/broken.png: ...
//!
//! Processed 96 of 97 files (1 failed)
//!     broken.png: Failed to decode raw/broken.png: ...
//! Dataset preparation complete.
//! ```

use crate::prepare::{PrepareError, PrepareEvent, PrepareReport};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;

const BAR_TEMPLATE: &str =
    "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec} {eta})";

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Header lines printed once the destination exists and before the first file.
pub fn format_start(source: &Path, destination: &Path) -> Vec<String> {
    vec![
        format!("Processing images from: {}", source.display()),
        format!("Saving processed images to: {}", destination.display()),
    ]
}

/// One line for a skipped file.
pub fn format_failure(name: &str, reason: &str) -> String {
    format!("Could not process file {}: {}", name, reason)
}

/// End-of-run summary with one indented line per failure.
pub fn format_summary(report: &PrepareReport) -> Vec<String> {
    let mut lines = Vec::new();
    let headline = format!(
        "Processed {} of {} files",
        report.processed.len(),
        report.total
    );
    if report.failed.is_empty() {
        lines.push(headline);
    } else {
        lines.push(format!("{} ({} failed)", headline, report.failed.len()));
        for failed in &report.failed {
            lines.push(format!("{}{}: {}", indent(1), failed.name, failed.reason));
        }
    }
    lines
}

pub fn print_summary(report: &PrepareReport) {
    for line in format_summary(report) {
        println!("{}", line);
    }
}

/// Diagnostic for a run that stopped before processing any file.
pub fn format_setup_error(err: &PrepareError) -> String {
    format!("Error: {}", err)
}

/// Final line of every run, except a strict run that stopped on a setup error.
pub fn completion_message() -> &'static str {
    "Dataset preparation complete."
}

/// Renders [`PrepareEvent`]s: start banner to stdout, a progress bar and
/// failure lines to stderr.
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// A hidden reporter still prints the banner and failures, just no bar.
    pub fn new(visible: bool) -> Self {
        let bar = ProgressBar::with_draw_target(
            None,
            if visible {
                ProgressDrawTarget::stderr()
            } else {
                ProgressDrawTarget::hidden()
            },
        );
        if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message("Processing Images");
        Self { bar }
    }

    pub fn handle(&self, event: &PrepareEvent) {
        match event {
            PrepareEvent::Started {
                source,
                destination,
                total,
            } => {
                for line in format_start(source, destination) {
                    println!("{}", line);
                }
                self.bar.set_length(*total as u64);
            }
            PrepareEvent::FileDone { .. } => self.bar.inc(1),
            PrepareEvent::FileFailed { name, reason, .. } => {
                // Printed above the bar so it is not overdrawn.
                self.bar.suspend(|| eprintln!("{}", format_failure(name, reason)));
                self.bar.inc(1);
            }
        }
    }

    pub fn finish(&self) {
        self.bar.finish();
    }

    /// Current position, for tests.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}
