//! Client side of the streaming write path.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, Stream};
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH};
use reqwest::{Body, Client, StatusCode};
use url::{ParseError, Url};

use blobwrite_core::{Blob, Bytes, Chunks, Error as CoreError};

use crate::error::Error;
use crate::transport::StreamingWrite;
use crate::types::{Endpoint, ErrorBody};

/// Sends one blob as the body of one PUT.
#[derive(Debug, Clone)]
pub struct StreamingWriteClient {
    client: Client,
    piece_size: usize,
}

impl StreamingWriteClient {
    /// `piece_size` is how many bytes are read from the blob per body frame.
    pub fn new(timeout: Option<Duration>, piece_size: usize) -> Result<Self, Error> {
        let mut builder = Client::builder().no_proxy();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            piece_size: piece_size.max(1),
        })
    }

    /// Upload `request` to the server at `endpoint`; returns the absolute path
    /// the server wrote.
    pub async fn write(&self, endpoint: &Endpoint, request: &StreamingWrite) -> Result<String, Error> {
        let url = write_url(endpoint, request)?;
        let len = request.blob.len();

        tracing::debug!(%url, bytes = len, "streaming PUT");

        let response = self
            .client
            .put(url)
            .header(AUTHORIZATION, format!("Bearer {}", endpoint.token))
            .header(CONTENT_LENGTH, len)
            .body(Body::wrap_stream(blob_stream(
                Arc::clone(&request.blob),
                self.piece_size,
            )))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        match status {
            StatusCode::OK if text.is_empty() => Err(Error::EmptyResponse),
            StatusCode::OK => Ok(text),
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
            StatusCode::CONFLICT => Err(Error::DirectoryMissing {
                message: error_message(&text),
            }),
            StatusCode::BAD_REQUEST => Err(Error::BadRequest {
                message: error_message(&text),
            }),
            other => Err(Error::Status {
                status: other.as_u16(),
                message: error_message(&text),
            }),
        }
    }
}

/// `http://127.0.0.1:<port>/<path as one segment>?recursive=..[&directory=..]`
pub(crate) fn write_url(endpoint: &Endpoint, request: &StreamingWrite) -> Result<Url, Error> {
    let mut url = Url::parse(&endpoint.base_url())?;
    url.path_segments_mut()
        .map_err(|_| Error::UrlParse(ParseError::RelativeUrlWithCannotBeABaseBase))?
        .clear()
        .push(&request.path);

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("recursive", if request.recursive { "true" } else { "false" });
        if let Some(directory) = request.directory {
            query.append_pair("directory", directory.as_str());
        }
    }

    Ok(url)
}

/// Blob pieces, read one at a time as the body is polled.
fn blob_stream(
    blob: Arc<dyn Blob>,
    piece_size: usize,
) -> impl Stream<Item = Result<Bytes, CoreError>> + Send + 'static {
    let pieces = Chunks::new(blob.len(), piece_size);
    stream::try_unfold((blob, pieces), |(blob, mut pieces)| async move {
        match pieces.next() {
            Some(piece) => {
                let bytes = blob.read_range(piece.offset, piece.len).await?;
                Ok(Some((bytes, (blob, pieces))))
            }
            None => Ok::<_, CoreError>(None),
        }
    })
}

fn error_message(text: &str) -> String {
    serde_json::from_str::<ErrorBody>(text)
        .map(|body| body.error)
        .unwrap_or_else(|_| text.to_string())
}
