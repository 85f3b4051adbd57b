//! HTTP server and graceful shutdown.
//!
//! The lifecycle is split across two types:
//!
//! ```text
//! Server      ── listen() ──▶  Listening  ── serve() ──▶  (returns)
//! configured                   socket bound               shut down
//! ```
//!
//! On SIGTERM or Ctrl-C (or the custom signal passed to
//! [`Listening::serve_with_shutdown`]) the server:
//! 1. logs `"Shutting down..."`,
//! 2. drops the listener, so new connections are refused,
//! 3. tells every open connection to finish its in-flight request and close,
//! 4. waits for them, up to the drain timeout, then aborts the stragglers,
//! 5. returns from `serve`.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::config::{Config, DEFAULT_DRAIN_TIMEOUT};
use crate::error::Error;
use crate::log::Logger;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// A configured, not yet bound, HTTP server.
#[derive(Clone, Debug)]
pub struct Server {
    addr: SocketAddr,
    drain_timeout: Duration,
}

impl Server {
    /// Configures the server to bind to `addr` when [`listen`](Server::listen)
    /// is called.
    ///
    /// ```rust
    /// use std::net::SocketAddr;
    /// use pingd::Server;
    ///
    /// let server = Server::bind(SocketAddr::from(([0, 0, 0, 0], 8080)));
    /// ```
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr, drain_timeout: DEFAULT_DRAIN_TIMEOUT }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::bind(config.addr).drain_timeout(config.drain_timeout)
    }

    /// Upper bound on how long shutdown waits for open connections.
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Binds the TCP listener.
    pub async fn listen(self) -> Result<Listening, Error> {
        let bind_err = |source| Error::Bind { addr: self.addr, source };
        let listener = TcpListener::bind(self.addr).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;
        Ok(Listening { listener, local_addr, drain_timeout: self.drain_timeout })
    }

    /// [`listen`](Server::listen), then [`serve`](Listening::serve).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.listen().await?.serve(router).await
    }
}

/// A server with a bound listener, ready to serve.
#[derive(Debug)]
pub struct Listening {
    listener: TcpListener,
    local_addr: SocketAddr,
    drain_timeout: Duration,
}

impl Listening {
    /// The address actually bound (resolves port `0`).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then drains and returns.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let logger = router.logger().clone();
        self.serve_with_shutdown(router, shutdown_signal(logger)).await
    }

    /// Serves `router` until `signal` resolves, then drains and returns.
    pub async fn serve_with_shutdown<F>(self, router: Router, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let Listening { listener, local_addr, drain_timeout } = self;

        // Shared by every connection task; the routing table is never copied.
        let router = Arc::new(router);
        let logger = router.logger().clone();

        logger.info("listening", [("Addr", json!(local_addr.to_string()))]);

        let builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut tasks = JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check the signal first so it wins over a queue of pending
                // connections.
                biased;

                () = &mut signal => {
                    logger.info("Shutting down...", [("Connections", json!(tasks.len()))]);
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            logger.error("accept failed", [("Error", json!(Error::from(e).to_string()))]);
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let svc = service_fn(move |req| {
                        let router = Arc::clone(&router);
                        async move { dispatch(router, req, remote_addr).await }
                    });

                    // `auto::Builder` handles both HTTP/1.1 and HTTP/2. The
                    // watcher lets shutdown ask the connection to wind down.
                    let conn = builder
                        .serve_connection_with_upgrades(TokioIo::new(stream), svc)
                        .into_owned();
                    let conn = graceful.watch(conn);

                    let logger = logger.clone();
                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            logger.error("connection error", [
                                ("RemoteAddr", json!(remote_addr.to_string())),
                                ("Error", json!(e.to_string())),
                            ]);
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);

        let shutdown = graceful.shutdown();
        let drained = tokio::time::timeout(drain_timeout, async {
            shutdown.await;
            while tasks.join_next().await.is_some() {}
        })
        .await;

        match drained {
            Ok(()) => logger.info("connections drained", []),
            Err(_) => {
                logger.error("drain timed out", [
                    ("InFlight", json!(tasks.len())),
                    ("Timeout", json!(format!("{drain_timeout:?}"))),
                ]);
                tasks.abort_all();
            }
        }

        logger.info("server stopped", [("Addr", json!(local_addr.to_string()))]);
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response.
///
/// All failures become HTTP responses here, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, _body) = req.into_parts();

    let response = match router.lookup(parts.uri.path()) {
        Some(handler) => {
            let req = Request::from_parts(parts, remote_addr, router.logger().clone());
            handler.call(req).await
        }
        None => Response::status(StatusCode::NOT_FOUND),
    };

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C.
///
/// A handler that cannot be installed is logged and its arm never fires;
/// the other one still works. Windows only has Ctrl-C.
async fn shutdown_signal(logger: Logger) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger.error("failed to install Ctrl-C handler", [("Error", json!(e.to_string()))]);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                logger.error("failed to install SIGTERM handler", [("Error", json!(e.to_string()))]);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
