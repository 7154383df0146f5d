//! Streaming transport abstraction.
//!
//! The orchestrator talks to a `StreamingPath` rather than to the loopback
//! server directly, so the transport can be swapped out or made to fail in
//! tests without a real server.

use std::sync::Arc;

use async_trait::async_trait;

use blobwrite_core::{Blob, Directory, DirectoryRoots, WriterConfig};

use crate::client::StreamingWriteClient;
use crate::error::Error;
use crate::session::ServerSession;
use crate::types::Endpoint;

/// One blob to send over the streaming path.
#[derive(Clone)]
pub struct StreamingWrite {
    pub path: String,
    pub directory: Option<Directory>,
    pub recursive: bool,
    pub blob: Arc<dyn Blob>,
}

impl StreamingWrite {
    pub fn new(path: impl Into<String>, directory: Option<Directory>, blob: Arc<dyn Blob>) -> Self {
        Self {
            path: path.into(),
            directory,
            recursive: false,
            blob,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

impl std::fmt::Debug for StreamingWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingWrite")
            .field("path", &self.path)
            .field("directory", &self.directory)
            .field("recursive", &self.recursive)
            .field("len", &self.blob.len())
            .finish()
    }
}

/// Trait for the native write path.
#[async_trait]
pub trait StreamingPath: Send + Sync {
    /// Write the whole blob; returns the absolute path written.
    async fn write(&self, request: &StreamingWrite) -> Result<String, Error>;
}

enum Server {
    /// The process-wide session, started on first write.
    Global(DirectoryRoots),
    Session(Arc<ServerSession>),
    Endpoint(Endpoint),
}

/// Production `StreamingPath`: PUT over loopback to a `ServerSession`.
pub struct LoopbackStreaming {
    server: Server,
    client: StreamingWriteClient,
}

impl LoopbackStreaming {
    /// Use the process-wide session, resolving paths against `config.roots`
    /// if this is the first use.
    pub fn new(config: &WriterConfig) -> Result<Self, Error> {
        Self::build(Server::Global(config.roots.clone()), config)
    }

    /// Use a session the caller started.
    pub fn with_session(session: Arc<ServerSession>, config: &WriterConfig) -> Result<Self, Error> {
        Self::build(Server::Session(session), config)
    }

    /// Talk to a fixed endpoint.
    pub fn with_endpoint(endpoint: Endpoint, config: &WriterConfig) -> Result<Self, Error> {
        Self::build(Server::Endpoint(endpoint), config)
    }

    fn build(server: Server, config: &WriterConfig) -> Result<Self, Error> {
        let client = StreamingWriteClient::new(config.request_timeout, config.stream_piece_size)?;
        Ok(Self { server, client })
    }
}

#[async_trait]
impl StreamingPath for LoopbackStreaming {
    async fn write(&self, request: &StreamingWrite) -> Result<String, Error> {
        match &self.server {
            Server::Global(roots) => {
                let session = ServerSession::acquire(roots).await?;
                self.client.write(session.endpoint(), request).await
            }
            Server::Session(session) => self.client.write(session.endpoint(), request).await,
            Server::Endpoint(endpoint) => self.client.write(endpoint, request).await,
        }
    }
}
