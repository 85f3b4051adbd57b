//! Process-wide `tracing` backend.
//!
//! [`TracingSink`](crate::log::TracingSink) forwards every record to whatever
//! subscriber is installed here. Filtering follows `RUST_LOG`, defaulting to
//! `info`. The default output is one flat JSON object per line, with the
//! event fields (`RequestID`, `Method`, …) as top-level keys.

use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::Error;

/// Output format of the stdout layer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// One flat JSON object per line
    #[default]
    Json,
    /// Colored human-readable output
    Pretty,
    /// Compact single-line format
    Compact,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn make_layer<W>(format: LogFormat, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_ansi(true)
            .with_target(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(writer)
            .boxed(),
    }
}

/// Installs the global subscriber, writing to stdout.
///
/// Fails if one is already installed; callers treat that as fatal.
pub fn init(format: LogFormat) -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(make_layer(format, std::io::stdout))
        .with(filter)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex, PoisonError};

    use serde_json::{Value, json};

    use super::*;
    use crate::log::Logger;

    /// In-memory writer shared between the layer and the test.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn lines(&self) -> Vec<Value> {
            let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&buf)
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    impl io::Write for Capture {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_json<F: FnOnce()>(f: F) -> Vec<Value> {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::registry()
            .with(make_layer(LogFormat::Json, move || writer.clone()));
        tracing::subscriber::with_default(subscriber, f);
        capture.lines()
    }

    #[test]
    fn default_format_is_json() {
        assert_eq!(LogFormat::default(), LogFormat::Json);
    }

    #[test]
    fn request_id_is_a_top_level_json_key() {
        let lines = capture_json(|| {
            Logger::tracing()
                .with("RequestID", "abc")
                .info("request received", [("Method", json!("GET")), ("Header", json!({ "X-Test": ["1"] }))]);
        });

        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["message"], "request received");
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["RequestID"], "abc");
        assert_eq!(line["Method"], "GET");
        // Non-scalar fields keep their JSON rendering under `fields`.
        let rest: Value = serde_json::from_str(line["fields"].as_str().unwrap()).unwrap();
        assert_eq!(rest, json!({ "Header": { "X-Test": ["1"] } }));
    }

    #[test]
    fn error_records_keep_the_error_key_and_level() {
        let lines = capture_json(|| {
            Logger::tracing().error("marker write failed", [("Error", json!("no space left on device"))]);
        });

        assert_eq!(lines[0]["level"], "ERROR");
        assert_eq!(lines[0]["Error"], "no space left on device");
        assert!(lines[0].get("fields").is_none());
        assert!(lines[0].get("RequestID").is_none());
    }

    #[test]
    fn second_init_is_rejected() {
        // The first call may already have happened in another test; either way
        // the second one must fail.
        let _ = init(LogFormat::Compact);
        assert!(matches!(init(LogFormat::Compact), Err(Error::Logging(_))));
    }
}
