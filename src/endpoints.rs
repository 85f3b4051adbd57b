//! The service's endpoints.
//!
//! | Endpoint | Path | Response |
//! |---|---|---|
//! | [`Ping`] | `/ping` | `200 OK`, body `OK` |
//! | [`Marker`] | `/test` | `200 OK`, empty body; appends `OK.\n` to a file |

use std::path::{Path, PathBuf};

use http::StatusCode;
use serde_json::json;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::handler::{BoxFuture, Handler};
use crate::log::Logger;
use crate::request::Request;
use crate::response::Response;

/// Line appended by [`Marker`] on every request.
pub const MARKER_LINE: &[u8] = b"OK.\n";

/// Liveness handler. If the process can answer at all, it answers `OK`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ping;

impl Handler for Ping {
    fn call(&self, _req: Request) -> BoxFuture {
        Box::pin(async { Response::text("OK") })
    }
}

/// Appends [`MARKER_LINE`] to a file on every request, then answers with an
/// empty `200`.
///
/// A file that cannot be opened is skipped without a log record. A failed
/// write is logged at error level through the request's logger. Neither
/// changes the response.
#[derive(Clone, Debug)]
pub struct Marker {
    path: PathBuf,
}

impl Marker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Handler for Marker {
    fn call(&self, req: Request) -> BoxFuture {
        let path = self.path.clone();
        Box::pin(async move {
            append_marker(&path, req.logger()).await;
            Response::status(StatusCode::OK)
        })
    }
}

async fn append_marker(path: &Path, logger: &Logger) {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    options.mode(0o644);

    let Ok(mut file) = options.open(path).await else {
        return;
    };

    let written = async {
        file.write_all(MARKER_LINE).await?;
        file.flush().await
    };
    if let Err(e) = written.await {
        logger.error(
            "marker write failed",
            [("Path", json!(path.display().to_string())), ("Error", json!(e.to_string()))],
        );
    }
}
