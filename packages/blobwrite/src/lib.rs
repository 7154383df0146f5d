//! # blobwrite
//!
//! Write large binary blobs to the local filesystem without base64-encoding
//! the whole payload.
//!
//! Every write first goes over a loopback HTTP server that streams the body
//! into a temp file and renames it into place. If that fails for any reason
//! other than an invalid path, the blob is written again through a chunked
//! base64 write/append bridge, one chunk at a time.
//!
//! ```ignore
//! use blobwrite::{write_blob, Directory, WriteOptions};
//!
//! let path = write_blob(
//!     WriteOptions::from_bytes("exports/report.pdf", pdf)
//!         .directory(Directory::Documents)
//!         .recursive(true)
//!         .on_fallback(|e| tracing::warn!(error = %e, "slow path")),
//! )
//! .await?;
//! ```
//!
//! `write_blob` uses a process-wide orchestrator configured from the
//! environment (see `WriterConfig::from_env`). Build a `WriteOrchestrator`
//! directly for explicit roots or custom transports.

mod fallback;
mod options;
mod orchestrator;

use tokio::sync::OnceCell;

pub use blobwrite_core::{
    Blob, Bytes, Directory, DirectoryRoots, Error, FileBlob, WriterConfig, DEFAULT_CHUNK_SIZE,
};
pub use blobwrite_fs::{FsBridge, LocalFsBridge};
pub use blobwrite_http::{LoopbackStreaming, ServerSession, StreamingPath, StreamingWrite};

pub use fallback::ChunkedFallbackWriter;
pub use options::{FallbackCallback, WriteOptions};
pub use orchestrator::WriteOrchestrator;

static ORCHESTRATOR: OnceCell<WriteOrchestrator> = OnceCell::const_new();

/// Write a blob with the process-wide orchestrator.
///
/// Resolves with the absolute path of the written file.
pub async fn write_blob(options: WriteOptions) -> Result<String, Error> {
    let orchestrator = ORCHESTRATOR
        .get_or_try_init(|| async { WriterConfig::from_env().and_then(WriteOrchestrator::new) })
        .await?;
    orchestrator.write(options).await
}
