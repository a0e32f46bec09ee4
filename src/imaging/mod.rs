//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Normalize** | Rec.601 luma + `imageops::resize` (Lanczos3) + atomic encode |
//!
//! The module is split into:
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use params::{DEFAULT_EDGE, NormalizeParams, TargetSize};
pub use rust_backend::{RustBackend, grayscale_encodable};
