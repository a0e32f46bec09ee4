//! # dataset-prep
//!
//! Batch-converts a flat directory of raw images into a normalized dataset:
//! every image becomes single-channel grayscale at one exact size, written
//! under its original file name in an output directory.
//!
//! ```text
//! raw/      →  decode → luma8 → Lanczos3 resize → encode (by extension)  →  processed/
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`prepare`] | The batch loop: preconditions, enumeration, per-file error tolerance, report |
//! | [`imaging`] | Pure-Rust image operations behind the [`imaging::ImageBackend`] trait |
//! | [`config`] | Optional `--config` TOML file merged over stock defaults |
//! | [`output`] | Console formatting and the progress bar |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## One File at a Time
//!
//! Files are processed sequentially and independently. A failure on one file
//! is logged and recorded, and the loop moves on. There is no retry and no
//! skip-if-up-to-date: rerunning reprocesses everything and overwrites
//! outputs by name.
//!
//! ## Output Format Follows the File Name
//!
//! The encoder is chosen from the output file's extension, which is the
//! source's extension. Decoding, by contrast, sniffs the file's magic bytes.
//! A mismatch between the two is therefore only a problem when the extension
//! has no encoder that accepts grayscale; strict mode catches that before
//! decoding.
//!
//! ## Atomic-or-Absent Writes
//!
//! Each output is encoded into a temporary file in the destination directory
//! and renamed into place only after the encode succeeds. An interrupted or
//! failed file never leaves a truncated image behind.

pub mod config;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod prepare;

#[cfg(test)]
pub(crate) mod test_helpers;
