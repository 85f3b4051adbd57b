//! Handler trait and type erasure.
//!
//! A handler has one capability: turn a [`Request`] into a [`Response`].
//! Endpoint types implement [`Handler`] directly; plain async functions get it
//! through the blanket impl below. Either way the router stores them the same:
//!
//! ```text
//! async fn hello(req: Request) -> &'static str { … }   ← or a struct impl
//!        ↓ router.route("/", hello)
//! trace::wrap(hello, logger)                           ← Traced<F>: Handler
//!        ↓
//! Arc::new(traced)  stored as BoxedHandler             ← Arc<dyn Handler>
//!        ↓
//! handler.call(req)  at request time                   ← one vtable dispatch
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` lets tokio move the future across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

/// Something that can answer a request.
///
/// Implement it on an endpoint type:
///
/// ```rust
/// use pingd::{Handler, Request, Response};
/// use pingd::handler::BoxFuture;
///
/// struct Hello;
///
/// impl Handler for Hello {
///     fn call(&self, _req: Request) -> BoxFuture {
///         Box::pin(async { Response::text("hello") })
///     }
/// }
/// ```
///
/// or just write an `async fn(Request) -> impl IntoResponse`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
