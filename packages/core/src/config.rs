//! Writer configuration.
//!
//! Defaults can be overridden from the environment:
//!
//! ```text
//! BLOBWRITE_CHUNK_SIZE          fallback chunk size in bytes
//! BLOBWRITE_REQUEST_TIMEOUT_MS  streaming request timeout (0 = none)
//! BLOBWRITE_APP_ID              subdirectory for app-private roots
//! BLOBWRITE_<DIRECTORY>_DIR     root override, e.g. BLOBWRITE_DATA_DIR
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::{Directory, DirectoryRoots, Error};

/// Fallback chunk size. A multiple of 3, so every chunk but the last encodes
/// to base64 without padding.
pub const DEFAULT_CHUNK_SIZE: usize = 3 * 1024 * 1024;

/// Size of the pieces a streamed request body is read in.
pub const DEFAULT_STREAM_PIECE_SIZE: usize = 256 * 1024;

const DEFAULT_APP_ID: &str = "blobwrite";

#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Bytes per fallback append call.
    pub chunk_size: usize,
    /// Bytes per body frame on the streaming path.
    pub stream_piece_size: usize,
    /// Overall timeout for one streaming request; `None` leaves it to the
    /// HTTP client.
    pub request_timeout: Option<Duration>,
    pub roots: DirectoryRoots,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            stream_piece_size: DEFAULT_STREAM_PIECE_SIZE,
            request_timeout: None,
            roots: DirectoryRoots::platform(DEFAULT_APP_ID),
        }
    }
}

impl WriterConfig {
    /// Defaults with the given roots.
    pub fn with_roots(roots: DirectoryRoots) -> Self {
        Self {
            roots,
            ..Self::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_stream_piece_size(mut self, piece_size: usize) -> Self {
        self.stream_piece_size = piece_size;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_id = lookup("BLOBWRITE_APP_ID").unwrap_or_else(|| DEFAULT_APP_ID.to_string());
        let mut config = Self {
            roots: DirectoryRoots::platform(&app_id),
            ..Self::default()
        };

        if let Some(value) = lookup("BLOBWRITE_CHUNK_SIZE") {
            config.chunk_size = parse_number("BLOBWRITE_CHUNK_SIZE", &value)?;
        }

        if let Some(value) = lookup("BLOBWRITE_REQUEST_TIMEOUT_MS") {
            let millis: u64 = parse_number("BLOBWRITE_REQUEST_TIMEOUT_MS", &value)?;
            config.request_timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }

        for directory in Directory::ALL {
            let key = format!("BLOBWRITE_{}_DIR", directory.as_str());
            if let Some(value) = lookup(&key) {
                let root = PathBuf::from(&value);
                if !root.is_absolute() {
                    return Err(Error::config(format!(
                        "{} must be an absolute path, got '{}'",
                        key, value
                    )));
                }
                config.roots.insert(directory, root);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk size must be non-zero"));
        }
        if self.stream_piece_size == 0 {
            return Err(Error::config("stream piece size must be non-zero"));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::config(format!("{}='{}': {}", key, value, e)))
}
