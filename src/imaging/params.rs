//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`prepare`](crate::prepare) loop (which decides which
//! files to normalize and where the results go) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation lets the loop run against a mock backend in tests.
//!
//! ## Types
//!
//! - [`TargetSize`]: Exact output dimensions. Both sides are non-zero by construction.
//! - [`NormalizeParams`]: Everything needed to normalize one file: source, output path, target size.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Default edge length used when no size is given.
pub const DEFAULT_EDGE: u32 = 128;

/// Exact output dimensions applied to every image of a run.
///
/// Serialized as a `[width, height]` pair so it reads naturally in
/// `config.toml`. Zero on either side is rejected at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[u32; 2]", try_from = "[u32; 2]")]
pub struct TargetSize {
    width: NonZeroU32,
    height: NonZeroU32,
}

impl TargetSize {
    /// Returns `None` when either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            width: NonZeroU32::new(width)?,
            height: NonZeroU32::new(height)?,
        })
    }

    /// Square size, as produced by the single `--img_size` flag.
    pub fn square(edge: NonZeroU32) -> Self {
        Self {
            width: edge,
            height: edge,
        }
    }

    pub fn width(self) -> u32 {
        self.width.get()
    }

    pub fn height(self) -> u32 {
        self.height.get()
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        Self::square(NonZeroU32::new(DEFAULT_EDGE).expect("default edge is non-zero"))
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<TargetSize> for [u32; 2] {
    fn from(size: TargetSize) -> Self {
        [size.width(), size.height()]
    }
}

impl TryFrom<[u32; 2]> for TargetSize {
    type Error = String;

    fn try_from([width, height]: [u32; 2]) -> Result<Self, Self::Error> {
        Self::new(width, height)
            .ok_or_else(|| format!("size must be positive, got [{width}, {height}]"))
    }
}

/// Parameters for normalizing one file: grayscale + exact resize + re-encode.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeParams {
    pub source: PathBuf,
    /// Output path; its extension selects the encoder.
    pub output: PathBuf,
    pub size: TargetSize,
}
