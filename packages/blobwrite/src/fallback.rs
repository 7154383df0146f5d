//! Chunked base64 write path.
//!
//! Used only after the streaming path has failed. The blob is split into
//! `chunk_size` ranges; the first is written with `write_file` and every
//! later one appended with `append_file`, one call at a time.

use std::sync::Arc;

use blobwrite_core::{Blob, Chunks, Directory, Error};
use blobwrite_fs::{FileData, FsBridge};

pub struct ChunkedFallbackWriter {
    bridge: Arc<dyn FsBridge>,
    chunk_size: usize,
}

impl ChunkedFallbackWriter {
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(bridge: Arc<dyn FsBridge>, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be non-zero");
        Self { bridge, chunk_size }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Write `blob` to `path`; returns the absolute path written.
    ///
    /// A failure part way through leaves whatever chunks already landed.
    pub async fn write(
        &self,
        path: &str,
        directory: Option<Directory>,
        blob: &dyn Blob,
        recursive: bool,
    ) -> Result<String, Error> {
        let total = blob.len();
        let count = Chunks::count_for(total, self.chunk_size);
        let mut chunks = Chunks::new(total, self.chunk_size);

        // An empty blob still gets one write_file so the file exists and is
        // truncated.
        let first = match chunks.next() {
            Some(chunk) => blob.read_range(chunk.offset, chunk.len).await?,
            None => Default::default(),
        };
        let written = self
            .bridge
            .write_file(FileData::base64(path, directory, &first).recursive(recursive))
            .await?;
        drop(first);
        tracing::debug!(path = %written, chunk = 0, of = count, "fallback chunk written");

        for chunk in chunks {
            let data = blob.read_range(chunk.offset, chunk.len).await?;
            self.bridge
                .append_file(FileData::base64(path, directory, &data).recursive(recursive))
                .await?;
            tracing::debug!(path = %written, chunk = chunk.index, of = count, "fallback chunk appended");
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use blobwrite_core::Bytes;
    use blobwrite_fs::ContentEncoding;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Write(String),
        Append(String),
    }

    #[derive(Default)]
    struct RecordingBridge {
        calls: Mutex<Vec<Call>>,
        fail_on_call: Option<usize>,
    }

    impl RecordingBridge {
        fn record(&self, call: Call) -> Result<(), Error> {
            let mut calls = self.calls.lock().unwrap();
            if self.fail_on_call == Some(calls.len()) {
                return Err(Error::Io(std::io::Error::other("disk full")));
            }
            calls.push(call);
            Ok(())
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FsBridge for RecordingBridge {
        async fn write_file(&self, request: FileData) -> Result<String, Error> {
            assert_eq!(request.encoding, ContentEncoding::Base64);
            self.record(Call::Write(request.data))?;
            Ok(format!("/abs/{}", request.path))
        }

        async fn append_file(&self, request: FileData) -> Result<(), Error> {
            self.record(Call::Append(request.data))
        }
    }

    fn writer(bridge: &Arc<RecordingBridge>, chunk_size: usize) -> ChunkedFallbackWriter {
        ChunkedFallbackWriter::new(Arc::clone(bridge) as Arc<dyn FsBridge>, chunk_size)
    }

    #[tokio::test]
    async fn first_chunk_writes_then_appends_in_order() {
        let bridge = Arc::new(RecordingBridge::default());
        let blob = Bytes::from_static(b"abcdefgh");

        let path = writer(&bridge, 3)
            .write("out.bin", Some(Directory::Data), &blob, false)
            .await
            .unwrap();

        assert_eq!(path, "/abs/out.bin");
        assert_eq!(
            bridge.calls(),
            vec![
                Call::Write("YWJj".to_string()),
                Call::Append("ZGVm".to_string()),
                Call::Append("Z2g=".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn empty_blob_is_a_single_empty_write() {
        let bridge = Arc::new(RecordingBridge::default());

        writer(&bridge, 3)
            .write("empty.bin", None, &Bytes::new(), false)
            .await
            .unwrap();

        assert_eq!(bridge.calls(), vec![Call::Write(String::new())]);
    }

    #[tokio::test]
    async fn exact_multiple_has_no_trailing_append() {
        let bridge = Arc::new(RecordingBridge::default());

        writer(&bridge, 3)
            .write("out.bin", None, &Bytes::from_static(b"abcdef"), false)
            .await
            .unwrap();

        assert_eq!(bridge.calls().len(), 2);
    }

    #[tokio::test]
    async fn failure_stops_remaining_chunks() {
        let bridge = Arc::new(RecordingBridge {
            fail_on_call: Some(1),
            ..Default::default()
        });

        let err = writer(&bridge, 2)
            .write("out.bin", None, &Bytes::from_static(b"abcdefgh"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert_eq!(bridge.calls(), vec![Call::Write("YWI=".to_string())]);
    }

    #[test]
    #[should_panic(expected = "chunk size must be non-zero")]
    fn zero_chunk_size_panics() {
        let bridge = Arc::new(RecordingBridge::default());
        writer(&bridge, 0);
    }
}
