//! # blobwrite-fs
//!
//! The generic filesystem primitive that the fallback write path targets.
//!
//! Like the filesystem bridges of embedded runtimes, it only moves text
//! across the call boundary: file content travels base64-encoded (or as UTF-8)
//! and is decoded right before it hits the disk.
//!
//! ## Operations
//!
//! ```text
//! write_file  {path, directory?, data, encoding, recursive}  -> absolute path
//! append_file {path, directory?, data, encoding, recursive}  -> ()
//! ```
//!
//! `write_file` creates or truncates; `append_file` extends. With
//! `recursive: false` a missing parent directory is an error and nothing is
//! created.

mod bridge;

pub use bridge::{ContentEncoding, FileData, FsBridge, LocalFsBridge};
