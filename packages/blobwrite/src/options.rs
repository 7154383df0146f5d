use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use blobwrite_core::{Blob, Bytes, Directory, Error};

/// Called with the streaming error right before the fallback runs.
pub type FallbackCallback = Box<dyn Fn(&Error) + Send + Sync>;

/// One blob write.
///
/// ```ignore
/// let options = WriteOptions::from_bytes("photos/cat.jpg", jpeg)
///     .directory(Directory::Data)
///     .recursive(true)
///     .on_fallback(|e| eprintln!("streaming failed: {}", e));
/// ```
pub struct WriteOptions {
    pub path: String,
    pub directory: Option<Directory>,
    pub blob: Arc<dyn Blob>,
    /// Create missing parent directories.
    pub recursive: bool,
    on_fallback: Option<FallbackCallback>,
}

impl WriteOptions {
    pub fn new(path: impl Into<String>, blob: Arc<dyn Blob>) -> Self {
        Self {
            path: path.into(),
            directory: None,
            blob,
            recursive: false,
            on_fallback: None,
        }
    }

    /// In-memory blob.
    pub fn from_bytes(path: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::new(path, Arc::new(data.into()))
    }

    pub fn directory(mut self, directory: Directory) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn on_fallback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.on_fallback = Some(Box::new(callback));
        self
    }

    /// Run the fallback callback, if any. A panic inside it is logged and
    /// swallowed.
    pub(crate) fn notify_fallback(&self, error: &Error) {
        let Some(callback) = &self.on_fallback else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| callback(error))).is_err() {
            tracing::warn!(path = %self.path, "fallback callback panicked");
        }
    }
}

impl std::fmt::Debug for WriteOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteOptions")
            .field("path", &self.path)
            .field("directory", &self.directory)
            .field("len", &self.blob.len())
            .field("recursive", &self.recursive)
            .field("on_fallback", &self.on_fallback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn builder_defaults() {
        let options = WriteOptions::from_bytes("a.bin", &b"abc"[..]);
        assert_eq!(options.path, "a.bin");
        assert!(options.directory.is_none());
        assert!(!options.recursive);
        assert_eq!(options.blob.len(), 3);
    }

    #[test]
    fn notify_calls_callback_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let options = WriteOptions::from_bytes("a.bin", &b""[..])
            .on_fallback(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });

        options.notify_fallback(&Error::Auth);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_callback_is_contained() {
        let options =
            WriteOptions::from_bytes("a.bin", &b""[..]).on_fallback(|_| panic!("callback failure"));
        options.notify_fallback(&Error::Timeout);
    }

    #[test]
    fn notify_without_callback_is_a_no_op() {
        WriteOptions::from_bytes("a.bin", &b""[..]).notify_fallback(&Error::Auth);
    }
}
