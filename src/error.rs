//! Unified error type.

use std::net::SocketAddr;

/// The error type returned by pingd's fallible operations.
///
/// Application-level outcomes (404, 500, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: installing the log backend, binding a port, or
/// accepting a connection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("accept: {0}")]
    Accept(#[from] std::io::Error),

    #[error("logging backend: {0}")]
    Logging(String),
}
