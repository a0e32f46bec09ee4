//! Dataset preparation: grayscale + fixed-size resize for a flat directory.
//!
//! Takes every direct child of the source directory whose name contains a dot,
//! normalizes it through an [`ImageBackend`], and writes the result under the
//! same file name in the destination directory.
//!
//! ## Failure Model
//!
//! - **Setup errors** ([`PrepareError`]): the source directory is missing or
//!   is not a directory, or the destination cannot be created. Nothing is
//!   processed and, for a bad source, nothing is created.
//! - **Per-file errors** ([`BackendError`]): reported as events, recorded in the
//!   [`PrepareReport`], and skipped. One bad file never stops the batch.
//!
//! ## Output Structure
//!
//! ```text
//! raw/                     processed/
//! ├── cat.jpg         →    ├── cat.jpg        (L8, exactly size)
//! ├── dog.png         →    ├── dog.png
//! ├── broken.png      ✗    │
//! ├── README          ·    │                  (no dot: not matched)
//! └── extra/          ·    │                  (subdirectory: never entered)
//!     └── nested.png
//! ```
//!
//! Files are handled one at a time, in sorted path order.

use crate::imaging::{
    BackendError, ImageBackend, NormalizeParams, RustBackend, TargetSize, grayscale_encodable,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{Level, debug, info, warn};

/// Errors that stop a run before any file is processed.
#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("Raw data directory not found at '{}'", .0.display())]
    SourceNotFound(PathBuf),
    #[error("Raw data path '{}' is not a directory", .0.display())]
    SourceNotDirectory(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options that apply uniformly to every file of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PrepareOptions {
    pub size: TargetSize,
    /// Reject files whose extension cannot hold grayscale output before decoding.
    pub strict: bool,
}

/// Progress events emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum PrepareEvent {
    /// Enumeration finished; `total` files will be attempted.
    Started {
        source: PathBuf,
        destination: PathBuf,
        total: usize,
    },
    /// A file was written. `index` is 1-based.
    FileDone { index: usize, name: String },
    /// A file was skipped. `index` is 1-based.
    FileFailed {
        index: usize,
        name: String,
        reason: String,
    },
}

/// A file that produced no output, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedFile {
    pub name: String,
    pub reason: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrepareReport {
    /// Number of matched entries.
    pub total: usize,
    /// File names written to the destination, in processing order.
    pub processed: Vec<String>,
    pub failed: Vec<FailedFile>,
}

impl PrepareReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Prepare a dataset with the production backend.
pub fn prepare(
    source_dir: &Path,
    destination_dir: &Path,
    options: &PrepareOptions,
    on_event: impl FnMut(&PrepareEvent),
) -> Result<PrepareReport, PrepareError> {
    prepare_with_backend(
        &RustBackend::new(),
        source_dir,
        destination_dir,
        options,
        on_event,
    )
}

/// Prepare a dataset using a specific backend (allows testing with mock).
pub fn prepare_with_backend(
    backend: &impl ImageBackend,
    source_dir: &Path,
    destination_dir: &Path,
    options: &PrepareOptions,
    mut on_event: impl FnMut(&PrepareEvent),
) -> Result<PrepareReport, PrepareError> {
    if !source_dir.exists() {
        return Err(PrepareError::SourceNotFound(source_dir.to_path_buf()));
    }
    if !source_dir.is_dir() {
        return Err(PrepareError::SourceNotDirectory(source_dir.to_path_buf()));
    }

    fs::create_dir_all(destination_dir)?;
    let entries = collect_entries(source_dir)?;

    info!(
        source = %source_dir.display(),
        destination = %destination_dir.display(),
        size = %options.size,
        files = entries.len(),
        "preparing dataset"
    );
    on_event(&PrepareEvent::Started {
        source: source_dir.to_path_buf(),
        destination: destination_dir.to_path_buf(),
        total: entries.len(),
    });

    let mut report = PrepareReport {
        total: entries.len(),
        ..PrepareReport::default()
    };

    for (i, source) in entries.iter().enumerate() {
        let index = i + 1;
        // Display form only; the output path keeps the raw OS name.
        let name = file_name(source);

        match normalize_one(backend, source, destination_dir, options) {
            Ok(()) => {
                debug!(file = %name, "written");
                on_event(&PrepareEvent::FileDone {
                    index,
                    name: name.clone(),
                });
                report.processed.push(name);
            }
            Err(e) => {
                let reason = e.to_string();
                debug!(file = %source.display(), %reason, "skipped");
                on_event(&PrepareEvent::FileFailed {
                    index,
                    name: name.clone(),
                    reason: reason.clone(),
                });
                report.failed.push(FailedFile { name, reason });
            }
        }
    }

    info!(
        processed = report.processed.len(),
        failed = report.failed.len(),
        "dataset preparation finished"
    );
    Ok(report)
}

fn normalize_one(
    backend: &impl ImageBackend,
    source: &Path,
    destination_dir: &Path,
    options: &PrepareOptions,
) -> Result<(), BackendError> {
    // Enumerated entries always have a final component.
    let output = destination_dir.join(source.file_name().unwrap_or_default());
    if options.strict && !grayscale_encodable(&output) {
        let ext = output
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(BackendError::UnsupportedOutput(format!(
            "{ext} (no grayscale encoder)"
        )));
    }

    if tracing::enabled!(Level::DEBUG) {
        if let Ok(dims) = backend.identify(source) {
            debug!(
                file = %source.display(),
                width = dims.width,
                height = dims.height,
                "input size"
            );
        }
    }

    backend.normalize(&NormalizeParams {
        source: source.to_path_buf(),
        output,
        size: options.size,
    })
}

/// List direct children that are files and whose name contains a dot.
fn collect_entries(path: &Path) -> Result<Vec<PathBuf>, PrepareError> {
    let listing = fs::read_dir(path)?.map(|entry| entry.map(|e| e.path()));
    Ok(matching_files(path, listing))
}

/// Filter a directory listing down to dotted file names, sorted.
///
/// Unreadable entries are skipped with a warning; they never fail the run.
fn matching_files(
    dir: &Path,
    listing: impl IntoIterator<Item = io::Result<PathBuf>>,
) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = listing
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|p| p.is_file() && has_dot(p))
        .collect();

    entries.sort();
    entries
}

fn has_dot(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.as_encoded_bytes().contains(&b'.'))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
