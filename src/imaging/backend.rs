//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the preprocessor
//! needs: identify and normalize.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate's pure-Rust codecs.

use super::params::NormalizeParams;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure for a single file. Never aborts a batch on its own.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("Unsupported output format: {0}")]
    UnsupportedOutput(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Get image dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode `params.source`, convert to 8-bit luminance, resize to exactly
    /// `params.size`, and write it to `params.output`.
    ///
    /// Implementations must leave no partial file at `params.output` on error.
    fn normalize(&self, params: &NormalizeParams) -> Result<(), BackendError>;
}
