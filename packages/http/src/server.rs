//! Streaming write handler.
//!
//! `PUT /<path>?recursive=..&directory=..` streams the request body into a
//! temp file next to the target and renames it into place once the declared
//! number of bytes has arrived.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Path, Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::put;
use axum::{Json, Router};
use futures_util::StreamExt;
use http::{header, HeaderMap, Method, StatusCode};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use blobwrite_core::{resolve, DirectoryRoots, Error as CoreError, ResolvedPath};

use crate::types::{ErrorBody, WriteQuery};

const TEMP_PREFIX: &str = ".blobwrite-";
const TEMP_SUFFIX: &str = ".part";

pub(crate) struct ServerState {
    token: String,
    roots: DirectoryRoots,
}

impl ServerState {
    pub(crate) fn new(token: String, roots: DirectoryRoots) -> Self {
        Self { token, roots }
    }
}

pub(crate) fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/*path", put(put_blob))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let authz = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    authz
        .strip_prefix("Bearer ")
        .or_else(|| authz.strip_prefix("bearer "))
        .map(str::trim)
}

async fn require_token(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = extract_token(request.headers()).is_some_and(|token| token == state.token);
    if !authorized {
        tracing::warn!(uri = %request.uri(), "rejected write with missing or invalid token");
        return ApiError::Unauthorized.into_response();
    }
    next.run(request).await
}

async fn put_blob(
    State(state): State<Arc<ServerState>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<WriteQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Body,
) -> Result<String, ApiError> {
    let Path(path) = path.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let expected = content_length(&headers)?;

    let target = resolve(query.directory, &path, &state.roots)?;
    target.prepare_parent(query.recursive).await?;

    tracing::debug!(path = %target.display(), bytes = expected, "streaming write");

    let mut transfer = StreamingTransfer::open(target).await?;
    let mut frames = body.into_data_stream();
    while let Some(frame) = frames.next().await {
        let frame = frame.map_err(|e| ApiError::Internal(format!("request body: {}", e)))?;
        transfer.write(&frame).await?;
    }

    transfer.publish(expected).await
}

fn content_length(headers: &HeaderMap) -> Result<u64, ApiError> {
    let value = headers
        .get(header::CONTENT_LENGTH)
        .ok_or_else(|| ApiError::BadRequest("Content-Length is required".to_string()))?;
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| ApiError::BadRequest("Content-Length is not a number".to_string()))
}

/// One in-flight upload. Dropping it before `publish` removes the temp file.
struct StreamingTransfer {
    target: ResolvedPath,
    file: tokio::fs::File,
    temp_path: TempPath,
    received: u64,
}

impl StreamingTransfer {
    async fn open(target: ResolvedPath) -> Result<Self, ApiError> {
        let parent = target.parent.clone();
        let temp = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(TEMP_PREFIX)
                .suffix(TEMP_SUFFIX)
                .tempfile_in(parent)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("create temp file: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("create temp file: {}", e)))?;
        let (file, temp_path) = temp.into_parts();

        Ok(Self {
            target,
            file: tokio::fs::File::from_std(file),
            temp_path,
            received: 0,
        })
    }

    async fn write(&mut self, frame: &[u8]) -> Result<(), ApiError> {
        self.file
            .write_all(frame)
            .await
            .map_err(|e| ApiError::Internal(format!("write temp file: {}", e)))?;
        self.received += frame.len() as u64;
        Ok(())
    }

    async fn publish(self, expected: u64) -> Result<String, ApiError> {
        let Self {
            target,
            mut file,
            temp_path,
            received,
        } = self;

        if received != expected {
            return Err(ApiError::Internal(format!(
                "received {} of {} bytes",
                received, expected
            )));
        }

        file.flush()
            .await
            .map_err(|e| ApiError::Internal(format!("flush temp file: {}", e)))?;
        drop(file);

        let destination = target.path.clone();
        tokio::task::spawn_blocking(move || temp_path.persist(destination))
            .await
            .map_err(|e| ApiError::Internal(format!("publish {}: {}", target.display(), e)))?
            .map_err(|e| ApiError::Internal(format!("publish {}: {}", target.display(), e.error)))?;

        tracing::debug!(path = %target.display(), bytes = received, "published");
        Ok(target.display())
    }
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    Unauthorized,
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                tracing::warn!(error = %msg, "streaming write failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::InvalidPath { .. } | CoreError::Encoding { .. } => {
                ApiError::BadRequest(error.to_string())
            }
            // The body carries just the directory so clients can rebuild the error.
            CoreError::DirectoryMissing { path } => ApiError::Conflict(path.display().to_string()),
            CoreError::Auth => ApiError::Unauthorized,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobwrite_core::Directory;
    use http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn bearer_token_extraction() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc")]);
        assert_eq!(extract_token(&h), Some("abc"));

        let h = headers(&[(header::AUTHORIZATION, "bearer abc ")]);
        assert_eq!(extract_token(&h), Some("abc"));

        let h = headers(&[(header::AUTHORIZATION, "Basic abc")]);
        assert_eq!(extract_token(&h), None);

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }

    #[test]
    fn content_length_is_required() {
        assert!(matches!(
            content_length(&HeaderMap::new()),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            content_length(&headers(&[(header::CONTENT_LENGTH, "ten")])),
            Err(ApiError::BadRequest(_))
        ));
        assert_eq!(
            content_length(&headers(&[(header::CONTENT_LENGTH, "1024")])).unwrap(),
            1024
        );
    }

    #[test]
    fn core_errors_map_to_statuses() {
        let status = |e: CoreError| ApiError::from(e).into_response().status();

        assert_eq!(
            status(CoreError::invalid_path("../x", "escapes")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(CoreError::DirectoryMissing {
                path: "/data/a".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(CoreError::Io(std::io::Error::other("disk full"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn dropped_transfer_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let roots = DirectoryRoots::new().with_root(Directory::Data, dir.path());
        let target = resolve(Some(Directory::Data), "out.bin", &roots).unwrap();

        let mut transfer = StreamingTransfer::open(target).await.unwrap();
        transfer.write(b"partial").await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        drop(transfer);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn short_transfer_is_not_published() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("out.bin"), b"previous").unwrap();
        let roots = DirectoryRoots::new().with_root(Directory::Data, dir.path());
        let target = resolve(Some(Directory::Data), "out.bin", &roots).unwrap();

        let mut transfer = StreamingTransfer::open(target).await.unwrap();
        transfer.write(b"abc").await.unwrap();
        assert!(matches!(
            transfer.publish(10).await,
            Err(ApiError::Internal(_))
        ));

        assert_eq!(std::fs::read(dir.path().join("out.bin")).unwrap(), b"previous");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn complete_transfer_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("out.bin"), b"a much longer previous body").unwrap();
        let roots = DirectoryRoots::new().with_root(Directory::Data, dir.path());
        let target = resolve(Some(Directory::Data), "out.bin", &roots).unwrap();

        let mut transfer = StreamingTransfer::open(target).await.unwrap();
        transfer.write(b"new ").await.unwrap();
        transfer.write(b"body").await.unwrap();
        let path = transfer.publish(8).await.unwrap();

        assert_eq!(path, dir.path().join("out.bin").display().to_string());
        assert_eq!(std::fs::read(dir.path().join("out.bin")).unwrap(), b"new body");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn open_runs_on_single_threaded_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let roots = DirectoryRoots::new().with_root(Directory::Data, dir.path());
        let target = resolve(Some(Directory::Data), "out.bin", &roots).unwrap();

        let mut transfer = StreamingTransfer::open(target).await.unwrap();
        transfer.write(b"ok").await.unwrap();
        transfer.publish(2).await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("out.bin")).unwrap(), b"ok");
    }
}
