//! Strategy selection.
//!
//! ```text
//! Init --resolve ok--> TryStreaming --ok--> Done
//!                           |
//!                           +--err--> on_fallback --> Fallback --> Done
//! ```
//!
//! Streaming is tried exactly once and always first. Its error goes to the
//! caller's `on_fallback` callback; the fallback's outcome is the result.

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use blobwrite_core::{resolve, DirectoryRoots, Error, WriterConfig};
use blobwrite_fs::{FsBridge, LocalFsBridge};
use blobwrite_http::{LoopbackStreaming, StreamingPath, StreamingWrite};

use crate::fallback::ChunkedFallbackWriter;
use crate::options::WriteOptions;

pub struct WriteOrchestrator {
    streaming: Arc<dyn StreamingPath>,
    fallback: ChunkedFallbackWriter,
    roots: DirectoryRoots,
}

impl WriteOrchestrator {
    /// Loopback streaming through the process-wide server session, falling
    /// back to the local filesystem bridge.
    pub fn new(config: WriterConfig) -> Result<Self, Error> {
        config.validate()?;
        let streaming = LoopbackStreaming::new(&config)?;
        let bridge = LocalFsBridge::new(config.roots.clone());
        Self::with_parts(Arc::new(streaming), Arc::new(bridge), config)
    }

    pub fn with_parts(
        streaming: Arc<dyn StreamingPath>,
        bridge: Arc<dyn FsBridge>,
        config: WriterConfig,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            streaming,
            fallback: ChunkedFallbackWriter::new(bridge, config.chunk_size),
            roots: config.roots,
        })
    }

    /// Write one blob; resolves with the absolute path written.
    pub async fn write(&self, options: WriteOptions) -> Result<String, Error> {
        let span = tracing::debug_span!(
            "write_blob",
            request_id = %Uuid::new_v4(),
            path = %options.path,
            bytes = options.blob.len(),
        );
        self.write_inner(options).instrument(span).await
    }

    async fn write_inner(&self, options: WriteOptions) -> Result<String, Error> {
        // Both paths write the target resolved against these roots.
        let target = resolve(options.directory, &options.path, &self.roots)?.display();

        let request = StreamingWrite::new(target.clone(), None, Arc::clone(&options.blob))
            .recursive(options.recursive);

        let error = match self.streaming.write(&request).await {
            Ok(path) => {
                tracing::debug!(%path, "streamed");
                return Ok(path);
            }
            Err(e) => Error::from(e),
        };

        tracing::warn!(%error, "streaming write failed");
        options.notify_fallback(&error);
        tracing::info!(
            chunk_size = self.fallback.chunk_size(),
            "falling back to chunked writes"
        );

        self.fallback
            .write(&target, None, options.blob.as_ref(), options.recursive)
            .await
    }
}
