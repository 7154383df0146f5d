use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use blobwrite_core::Directory;

/// Query string of a streaming write: `?recursive=..&directory=..`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct WriteQuery {
    /// Create missing parent directories.
    #[serde(default)]
    pub recursive: bool,

    /// Root the path is relative to. Absent for fully-qualified paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<Directory>,
}

/// JSON body of every non-200 response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// Where a write server listens and the token it expects.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub addr: SocketAddr,
    pub token: String,
}

impl Endpoint {
    pub fn new(addr: SocketAddr, token: impl Into<String>) -> Self {
        Self {
            addr,
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Same server, different token.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self::new(self.addr, token)
    }
}

// The token stays out of logs.
impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("addr", &self.addr)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_query_defaults() {
        let query: WriteQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.recursive);
        assert!(query.directory.is_none());
    }

    #[test]
    fn write_query_directory_wire_name() {
        let query = WriteQuery {
            recursive: true,
            directory: Some(Directory::Documents),
        };
        let value = serde_json::to_value(query).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"recursive": true, "directory": "DOCUMENTS"})
        );
    }

    #[test]
    fn endpoint_base_url() {
        let endpoint = Endpoint::new("127.0.0.1:4711".parse().unwrap(), "secret");
        assert_eq!(endpoint.base_url(), "http://127.0.0.1:4711/");
        assert_eq!(endpoint.with_token("other").token, "other");
    }

    #[test]
    fn endpoint_debug_hides_token() {
        let endpoint = Endpoint::new("127.0.0.1:1".parse().unwrap(), "secret");
        let debug = format!("{:?}", endpoint);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("127.0.0.1:1"));
    }
}
