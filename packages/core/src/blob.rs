//! Byte sources with a known length.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;

use crate::Error;

/// An opaque byte source with a known length.
///
/// Write paths never ask for the whole blob at once; they read it range by
/// range, so a blob can be backed by something much larger than memory.
#[async_trait]
pub trait Blob: Send + Sync {
    /// Total length in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read `len` bytes starting at `offset`.
    ///
    /// Callers only ask for ranges inside `0..self.len()`. Returning fewer
    /// bytes than requested is an error.
    async fn read_range(&self, offset: u64, len: usize) -> Result<Bytes, Error>;
}

#[async_trait]
impl Blob for Bytes {
    fn len(&self) -> u64 {
        Bytes::len(self) as u64
    }

    async fn read_range(&self, offset: u64, len: usize) -> Result<Bytes, Error> {
        let start = usize::try_from(offset).map_err(|_| out_of_range(offset, len))?;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= Bytes::len(self))
            .ok_or_else(|| out_of_range(offset, len))?;
        Ok(self.slice(start..end))
    }
}

/// A blob backed by a file on disk.
///
/// The length is captured when the blob is opened.
pub struct FileBlob {
    path: PathBuf,
    len: u64,
    file: Mutex<File>,
}

impl FileBlob {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        let len = file.metadata().await?.len();
        Ok(Self {
            path,
            len,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Blob for FileBlob {
    fn len(&self) -> u64 {
        self.len
    }

    async fn read_range(&self, offset: u64, len: usize) -> Result<Bytes, Error> {
        if offset.saturating_add(len as u64) > self.len {
            return Err(out_of_range(offset, len));
        }

        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(offset)).await?;

        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer).await?;
        Ok(Bytes::from(buffer))
    }
}

fn out_of_range(offset: u64, len: usize) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        format!("blob range {}+{} is out of bounds", offset, len),
    ))
}
