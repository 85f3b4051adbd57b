//! Incoming HTTP request type.

use std::net::SocketAddr;

use http::{HeaderMap, Method, Uri};

use crate::log::Logger;

/// An incoming HTTP request plus the logger scoped to it.
///
/// Once the request has passed through the tracing wrapper, [`logger`]
/// carries its `RequestID`; anything a handler logs through it is correlated
/// with the wrapper's entry and exit records.
///
/// [`logger`]: Request::logger
pub struct Request {
    pub(crate) remote_addr: SocketAddr,
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
    pub(crate) logger: Logger,
}

impl Request {
    /// Builds a request by hand. The server does this for every inbound
    /// request; it is public so handlers can be exercised without a socket.
    pub fn new(
        remote_addr: SocketAddr,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        logger: Logger,
    ) -> Self {
        Self { remote_addr, method, uri, headers, logger }
    }

    pub(crate) fn from_parts(parts: http::request::Parts, remote_addr: SocketAddr, logger: Logger) -> Self {
        Self::new(remote_addr, parts.method, parts.uri, parts.headers, logger)
    }

    pub fn remote_addr(&self) -> SocketAddr { self.remote_addr }
    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn logger(&self) -> &Logger { &self.logger }

    pub(crate) fn set_logger(&mut self, logger: Logger) {
        self.logger = logger;
    }
}
