//! Per-request tracing wrapper.
//!
//! [`wrap`] decorates a handler so that every request:
//!
//! 1. gets a fresh correlation ID and a logger derived with `RequestID`,
//! 2. is logged on entry (`"request received"`),
//! 3. runs the inner handler exactly once, with the derived logger reachable
//!    through [`Request::logger`],
//! 4. is logged on exit (`"response sent"`) with the same fields, whatever the
//!    handler did.
//!
//! A panicking handler is caught: the wrapper logs `"handler panicked"` at
//! error level, answers `500 Internal Server Error`, and still writes the exit
//! record.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use http::{HeaderMap, StatusCode};
use serde_json::{Map, Value, json};

use crate::handler::{BoxFuture, Handler};
use crate::log::{Field, Logger};
use crate::request::Request;
use crate::request_id;
use crate::response::Response;

/// Context key carrying the correlation ID.
pub const REQUEST_ID: &str = "RequestID";

/// A handler decorated with entry/exit logging. Built by [`wrap`].
pub struct Traced<H> {
    inner: Arc<H>,
    logger: Logger,
    ids: fn() -> String,
}

/// Wraps `handler` so each request is bracketed by two correlated log records
/// written through `logger`.
pub fn wrap<H: Handler>(handler: H, logger: Logger) -> Traced<H> {
    Traced { inner: Arc::new(handler), logger, ids: request_id::generate }
}

impl<H> Traced<H> {
    /// Replaces the correlation ID source, [`request_id::generate`] by default.
    pub fn with_id_source(mut self, ids: fn() -> String) -> Self {
        self.ids = ids;
        self
    }
}

impl<H: Handler> Handler for Traced<H> {
    fn call(&self, mut req: Request) -> BoxFuture {
        let logger = self.logger.with(REQUEST_ID, (self.ids)());
        let fields = request_fields(&req);

        logger.info("request received", fields.clone());
        req.set_logger(logger.clone());

        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let outcome = AssertUnwindSafe(async move { inner.call(req).await })
                .catch_unwind()
                .await;

            let response = match outcome {
                Ok(response) => response,
                Err(panic) => {
                    logger.error("handler panicked", [("Panic", json!(panic_message(&*panic)))]);
                    Response::status(StatusCode::INTERNAL_SERVER_ERROR)
                }
            };

            logger.info("response sent", fields);
            response
        })
    }
}

/// The fields logged on both entry and exit.
fn request_fields(req: &Request) -> Vec<Field> {
    vec![
        ("RemoteAddr", json!(req.remote_addr().to_string())),
        ("Method", json!(req.method().as_str())),
        ("URL", json!(req.uri().to_string())),
        ("Header", header_map(req.headers())),
    ]
}

/// Renders headers as `{"Canonical-Name": ["v1", "v2"]}`, values in arrival
/// order.
fn header_map(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let values = headers.get_all(name).iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        map.insert(canonical_name(name.as_str()), Value::Array(values));
    }
    Value::Object(map)
}

/// `x-forwarded-for` → `X-Forwarded-For`.
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
