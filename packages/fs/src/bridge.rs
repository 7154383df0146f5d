//! Encoded filesystem writes.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use blobwrite_core::{resolve, Directory, DirectoryRoots, Error};

/// Encoding of the `data` field of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    /// Content is a base64 string (default)
    #[default]
    Base64,
    /// Content is written as UTF-8 text
    Utf8,
}

/// A single write or append call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<Directory>,
    pub data: String,
    #[serde(default)]
    pub encoding: ContentEncoding,
    /// Create missing parent directories.
    #[serde(default)]
    pub recursive: bool,
}

impl FileData {
    /// A base64 payload for `bytes`.
    pub fn base64(path: impl Into<String>, directory: Option<Directory>, bytes: &[u8]) -> Self {
        Self {
            path: path.into(),
            directory,
            data: STANDARD.encode(bytes),
            encoding: ContentEncoding::Base64,
            recursive: false,
        }
    }

    pub fn utf8(path: impl Into<String>, directory: Option<Directory>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            directory,
            data: text.into(),
            encoding: ContentEncoding::Utf8,
            recursive: false,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    fn decode(&self) -> Result<Vec<u8>, Error> {
        match self.encoding {
            ContentEncoding::Base64 => STANDARD.decode(&self.data).map_err(|e| Error::Encoding {
                message: format!("invalid base64: {}", e),
            }),
            ContentEncoding::Utf8 => Ok(self.data.as_bytes().to_vec()),
        }
    }
}

/// Write and append primitive taking encoded content.
///
/// Each call is complete when its future resolves; callers that need
/// ordering await one call before issuing the next.
#[async_trait]
pub trait FsBridge: Send + Sync {
    /// Create or truncate the file and write `data`. Returns the absolute path.
    async fn write_file(&self, request: FileData) -> Result<String, Error>;

    /// Append `data` to the file, creating it if needed.
    async fn append_file(&self, request: FileData) -> Result<(), Error>;
}

/// `FsBridge` over the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFsBridge {
    roots: DirectoryRoots,
}

impl LocalFsBridge {
    pub fn new(roots: DirectoryRoots) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &DirectoryRoots {
        &self.roots
    }
}

#[async_trait]
impl FsBridge for LocalFsBridge {
    async fn write_file(&self, request: FileData) -> Result<String, Error> {
        let target = resolve(request.directory, &request.path, &self.roots)?;
        let content = request.decode()?;
        target.prepare_parent(request.recursive).await?;

        tracing::debug!(path = %target.display(), bytes = content.len(), "write_file");
        fs::write(&target.path, &content).await?;
        Ok(target.display())
    }

    async fn append_file(&self, request: FileData) -> Result<(), Error> {
        let target = resolve(request.directory, &request.path, &self.roots)?;
        let content = request.decode()?;
        target.prepare_parent(request.recursive).await?;

        tracing::debug!(path = %target.display(), bytes = content.len(), "append_file");
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&target.path)
            .await?;
        file.write_all(&content).await?;
        file.flush().await?;
        Ok(())
    }
}
