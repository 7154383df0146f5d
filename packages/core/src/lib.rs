//! Core blobwrite types.
//!
//! Everything the write paths agree on lives here:
//! - `Directory` / `DirectoryRoots`: symbolic locations and where they live on disk
//! - `resolve`: maps a directory + path into an absolute, contained file path
//! - `Blob`: a byte source with a known length, read in ranges
//! - `Chunks`: lazy, ordered byte ranges over a blob
//! - `WriterConfig`: chunk sizes, timeouts and roots
//!
//! # Example
//!
//! ```rust
//! use blobwrite_core::{resolve, Directory, DirectoryRoots};
//!
//! let roots = DirectoryRoots::new().with_root(Directory::Data, "/srv/app/data");
//! let resolved = resolve(Some(Directory::Data), "photos/cat.jpg", &roots).unwrap();
//! assert_eq!(resolved.path.to_str(), Some("/srv/app/data/photos/cat.jpg"));
//! ```

pub use bytes::Bytes;

mod blob;
mod chunk;
mod config;
mod directory;
mod error;
mod path;

pub use blob::{Blob, FileBlob};
pub use chunk::{Chunk, Chunks};
pub use config::{WriterConfig, DEFAULT_CHUNK_SIZE, DEFAULT_STREAM_PIECE_SIZE};
pub use directory::{Directory, DirectoryRoots};
pub use error::Error;
pub use path::{resolve, ResolvedPath};
