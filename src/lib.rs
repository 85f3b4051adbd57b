//! # pingd
//!
//! A minimal instrumented HTTP service: exact-path routing, one tracing
//! wrapper around every handler, and signal-aware graceful shutdown.
//!
//! ## What every request gets
//!
//! - A 128-bit correlation ID ([`request_id`]), or `"0"` if the OS random
//!   source fails.
//! - A request-scoped [`Logger`](log::Logger) derived with `RequestID`, reachable
//!   from the handler through [`Request::logger`].
//! - Exactly two wrapper records, `"request received"` and `"response sent"`,
//!   carrying remote address, method, URL and headers.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pingd::{Router, Server};
//! use pingd::endpoints::{Marker, Ping};
//! use pingd::log::Logger;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     pingd::logging::init(Default::default())?;
//!
//!     let app = Router::new(Logger::tracing())
//!         .route("/ping", Ping)
//!         .route("/test", Marker::new("/tmp/test.out"));
//!
//!     Server::bind(([0, 0, 0, 0], 8080).into()).serve(app).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod request;
mod response;
mod router;

pub mod config;
pub mod endpoints;
pub mod handler;
pub mod log;
pub mod logging;
pub mod middleware;
pub mod request_id;
pub mod server;

pub use config::Config;
pub use error::Error;
pub use handler::Handler;
pub use request::Request;
pub use response::{IntoResponse, Response};
pub use router::Router;
pub use server::{Listening, Server};
