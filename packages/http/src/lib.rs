//! # blobwrite-http
//!
//! The native write path: a loopback HTTP server that streams request bodies
//! straight to disk, and the client that feeds it.
//!
//! ## Server
//!
//! `ServerSession` binds `127.0.0.1` on an OS-assigned port and generates a
//! bearer token. The process-wide session starts on first use:
//!
//! ```ignore
//! use blobwrite_http::ServerSession;
//!
//! let session = ServerSession::acquire(&roots).await?;
//! println!("listening on {}", session.port());
//! ```
//!
//! Each `PUT /<path>?recursive=..&directory=..` is written to a temp file in
//! the destination directory and renamed over the target only once the whole
//! body has arrived, so readers never see a half-written file.
//!
//! ## Client
//!
//! ```ignore
//! use blobwrite_http::{LoopbackStreaming, StreamingPath, StreamingWrite};
//!
//! let streaming = LoopbackStreaming::new(&config)?;
//! let path = streaming
//!     .write(&StreamingWrite::new("video.mp4", Some(Directory::Data), blob))
//!     .await?;
//! ```

pub mod client;
pub mod error;
pub mod session;
pub mod transport;
pub mod types;

mod server;

pub use client::StreamingWriteClient;
pub use error::Error;
pub use session::ServerSession;
pub use transport::{LoopbackStreaming, StreamingPath, StreamingWrite};
pub use types::{Endpoint, ErrorBody, WriteQuery};
