//! Loopback write server lifecycle.
//!
//! ```text
//! Stopped --acquire()--> Starting --bound + token--> Running
//! ```
//!
//! The process-wide session is started lazily by the first `acquire()` and
//! then lives as long as the process. Concurrent first callers wait for the
//! one start in flight instead of binding ports of their own.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::sync::{oneshot, OnceCell};

use blobwrite_core::DirectoryRoots;

use crate::error::Error;
use crate::server::{self, ServerState};
use crate::types::Endpoint;

const TOKEN_BYTES: usize = 32;
const SERVER_WORKER_THREADS: usize = 2;

static GLOBAL_SESSION: OnceCell<ServerSession> = OnceCell::const_new();

/// A running loopback write server.
///
/// The server runs on its own thread and tokio runtime, independent of the
/// runtime of whoever started it.
pub struct ServerSession {
    endpoint: Endpoint,
    roots: DirectoryRoots,
    shutdown: Option<oneshot::Sender<()>>,
}

impl ServerSession {
    /// Get the process-wide session, starting it on first use.
    ///
    /// `roots` is only used by the call that starts the server. Requests that
    /// carry an absolute path with no directory do not depend on it.
    pub async fn acquire(roots: &DirectoryRoots) -> Result<&'static ServerSession, Error> {
        let session = GLOBAL_SESSION
            .get_or_try_init(|| async { Self::start(roots.clone()) })
            .await?;

        if session.roots != *roots {
            tracing::debug!("write server roots differ; directory-relative requests use the first roots");
        }
        Ok(session)
    }

    /// The process-wide session, if it has been started.
    pub fn global() -> Option<&'static ServerSession> {
        GLOBAL_SESSION.get()
    }

    /// Start an independent session. The server stops when it is dropped.
    pub fn start(roots: DirectoryRoots) -> Result<Self, Error> {
        let listener =
            std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).map_err(Error::Startup)?;
        listener.set_nonblocking(true).map_err(Error::Startup)?;
        let addr = listener.local_addr().map_err(Error::Startup)?;

        let token = generate_token();
        let state = Arc::new(ServerState::new(token.clone(), roots.clone()));

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(SERVER_WORKER_THREADS)
            .thread_name("blobwrite-server-worker")
            .enable_all()
            .build()
            .map_err(Error::Startup)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        std::thread::Builder::new()
            .name("blobwrite-server".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let listener = match tokio::net::TcpListener::from_std(listener) {
                        Ok(listener) => listener,
                        Err(e) => {
                            tracing::error!(error = %e, "write server could not adopt listener");
                            return;
                        }
                    };

                    let shutdown = async {
                        // A dropped sender also ends the wait.
                        let _ = shutdown_rx.await;
                    };

                    if let Err(e) = axum::serve(listener, server::router(state))
                        .with_graceful_shutdown(shutdown)
                        .await
                    {
                        tracing::error!(error = %e, "write server stopped");
                    }
                });
            })
            .map_err(Error::Startup)?;

        tracing::info!(%addr, "write server listening");

        Ok(Self {
            endpoint: Endpoint::new(addr, token),
            roots,
            shutdown: Some(shutdown_tx),
        })
    }

    pub fn port(&self) -> u16 {
        self.endpoint.addr.port()
    }

    pub fn addr(&self) -> SocketAddr {
        self.endpoint.addr
    }

    pub fn token(&self) -> &str {
        &self.endpoint.token
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn roots(&self) -> &DirectoryRoots {
        &self.roots
    }
}

impl Drop for ServerSession {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
