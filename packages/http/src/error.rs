use blobwrite_core::Error as CoreError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Unauthorized: write server rejected the access token")]
    Unauthorized,

    #[error("Missing parent directory: {message}")]
    DirectoryMissing { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Write server returned an empty path")]
    EmptyResponse,

    #[error("Failed to start write server: {0}")]
    Startup(#[source] std::io::Error),
}

impl From<Error> for CoreError {
    fn from(error: Error) -> Self {
        match error {
            Error::Http(e) if e.is_timeout() => CoreError::Timeout,
            Error::Http(e) => CoreError::Network {
                message: e.to_string(),
            },
            Error::UrlParse(e) => CoreError::Network {
                message: e.to_string(),
            },
            Error::Unauthorized => CoreError::Auth,
            Error::DirectoryMissing { message } => CoreError::DirectoryMissing {
                path: message.into(),
            },
            Error::BadRequest { message } => CoreError::Server {
                status: 400,
                message,
            },
            Error::Status { status, message } => CoreError::Server { status, message },
            Error::EmptyResponse => CoreError::Server {
                status: 200,
                message: "empty response body".to_string(),
            },
            Error::Startup(e) => CoreError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(CoreError::from(Error::Unauthorized), CoreError::Auth));
        assert!(matches!(
            CoreError::from(Error::DirectoryMissing {
                message: "/data/a".to_string()
            }),
            CoreError::DirectoryMissing { .. }
        ));
        assert!(matches!(
            CoreError::from(Error::BadRequest {
                message: "bad".to_string()
            }),
            CoreError::Server { status: 400, .. }
        ));
        assert!(matches!(
            CoreError::from(Error::Status {
                status: 500,
                message: "disk full".to_string()
            }),
            CoreError::Server { status: 500, .. }
        ));
    }

    #[test]
    fn startup_failure_is_io() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");
        assert!(matches!(CoreError::from(Error::Startup(io)), CoreError::Io(_)));
    }
}
