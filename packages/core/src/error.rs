//! Error types shared by every write path.

use std::path::PathBuf;

/// Errors surfaced by blob writes.
///
/// Streaming-path failures are reported through the fallback callback as one
/// of these; fallback-path failures are returned to the caller.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The path escapes its root, is malformed, or has no usable root.
    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// The write server rejected the access token.
    #[error("write server rejected the access token")]
    Auth,

    /// The parent directory is missing and `recursive` was not set.
    #[error("parent directory does not exist: {}", path.display())]
    DirectoryMissing { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection-level failure talking to the write server.
    #[error("network error: {message}")]
    Network { message: String },

    #[error("request to write server timed out")]
    Timeout,

    /// Any other non-success response from the write server.
    #[error("write server responded {status}: {message}")]
    Server { status: u16, message: String },

    /// Payload could not be decoded with the declared encoding.
    #[error("encoding error: {message}")]
    Encoding { message: String },

    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl Error {
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_path_display() {
        let e = Error::invalid_path("../etc/passwd", "escapes root");
        let display = format!("{}", e);
        assert!(display.contains("invalid path"));
        assert!(display.contains("../etc/passwd"));
        assert!(display.contains("escapes root"));
    }

    #[test]
    fn directory_missing_display() {
        let e = Error::DirectoryMissing {
            path: PathBuf::from("/data/a/b"),
        };
        assert!(format!("{}", e).contains("/data/a/b"));
    }

    #[test]
    fn server_error_display() {
        let e = Error::Server {
            status: 500,
            message: "disk full".to_string(),
        };
        let display = format!("{}", e);
        assert!(display.contains("500"));
        assert!(display.contains("disk full"));
    }

    #[test]
    fn io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(_)));
    }
}
