//! Exact-path request router.
//!
//! One map from path to handler. No patterns, no method tables: a request
//! either names a registered path exactly or it gets a 404. Every handler is
//! wrapped in [`trace`](crate::middleware::trace) on registration.

use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::{BoxedHandler, Handler};
use crate::log::Logger;
use crate::middleware::trace;

/// The application router.
///
/// Build it once at startup; pass it to [`Listening::serve`](crate::server::Listening::serve).
/// Each [`Router::route`] call returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<String, BoxedHandler>,
    logger: Logger,
}

impl Router {
    /// A router whose handlers log through `logger`.
    pub fn new(logger: Logger) -> Self {
        Self { routes: HashMap::new(), logger }
    }

    /// Register a handler for an exact path, any method. Returns `self` for
    /// chaining.
    ///
    /// ```rust
    /// # use pingd::{Request, Router};
    /// # use pingd::log::Logger;
    /// # async fn ping(_: Request) -> &'static str { "OK" }
    /// Router::new(Logger::tracing())
    ///     .route("/ping", ping);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` does not start with `/` or is already registered.
    pub fn route(mut self, path: &str, handler: impl Handler) -> Self {
        assert!(path.starts_with('/'), "invalid route `{path}`: must start with `/`");
        let traced: BoxedHandler = Arc::new(trace::wrap(handler, self.logger.clone()));
        if self.routes.insert(path.to_owned(), traced).is_some() {
            panic!("invalid route `{path}`: already registered");
        }
        self
    }

    /// The logger handlers derive their request loggers from.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub(crate) fn lookup(&self, path: &str) -> Option<BoxedHandler> {
        self.routes.get(path).map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemorySink;
    use crate::request::Request;

    async fn noop(_req: Request) {}

    #[test]
    fn matches_exact_paths_only() {
        let router = Router::new(Logger::new(MemorySink::new()))
            .route("/ping", noop)
            .route("/test", noop);

        assert!(router.lookup("/ping").is_some());
        assert!(router.lookup("/test").is_some());
        assert!(router.lookup("/ping/").is_none());
        assert!(router.lookup("/PING").is_none());
        assert!(router.lookup("/").is_none());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_route_panics() {
        let _ = Router::new(Logger::new(MemorySink::new()))
            .route("/ping", noop)
            .route("/ping", noop);
    }

    #[test]
    #[should_panic(expected = "must start with")]
    fn relative_route_panics() {
        let _ = Router::new(Logger::new(MemorySink::new())).route("ping", noop);
    }
}
