//! Shared helpers for the server integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use pingd::log::{MemorySink, Record};
use pingd::{Error, Router, Server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A server running on an ephemeral localhost port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), Error>>,
}

impl TestServer {
    pub async fn start(router: Router) -> Self {
        Self::start_with(Server::bind(([127, 0, 0, 1], 0).into()), router).await
    }

    pub async fn start_with(server: Server, router: Router) -> Self {
        let listening = server.listen().await.unwrap();
        let addr = listening.local_addr();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(listening.serve_with_shutdown(router, async move {
            let _ = rx.await;
        }));
        Self { addr, shutdown: Some(tx), handle }
    }

    /// Triggers shutdown and waits for `serve` to return.
    pub async fn stop(mut self) -> Result<(), Error> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
    }
}

/// A parsed HTTP/1.1 response.
pub struct RawResponse {
    pub status: u16,
    pub head: String,
    pub body: Vec<u8>,
}

/// Sends `GET path` with `Connection: close` plus `headers`, reads to EOF.
pub async fn get(addr: SocketAddr, path: &str, headers: &[(&str, &str)]) -> RawResponse {
    let mut raw = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    for (name, value) in headers {
        raw.push_str(&format!("{name}: {value}\r\n"));
    }
    raw.push_str("\r\n");

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    parse(&buf)
}

fn parse(buf: &[u8]) -> RawResponse {
    let split = buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    let head = String::from_utf8_lossy(&buf[..split]).into_owned();
    let status = head.split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("malformed status line");
    RawResponse { status, head, body: buf[split + 4..].to_vec() }
}

/// Records whose message is one of the tracing wrapper's.
pub fn wrapper_records(sink: &MemorySink) -> Vec<Record> {
    sink.records()
        .into_iter()
        .filter(|r| r.message == "request received" || r.message == "response sent")
        .collect()
}

pub fn request_id(record: &Record) -> String {
    record.field("RequestID")
        .and_then(|v| v.as_str())
        .expect("record has no RequestID")
        .to_owned()
}

/// Polls `sink` until `pred` holds, or panics after five seconds.
pub async fn wait_for<F>(sink: &MemorySink, pred: F)
where
    F: Fn(&[Record]) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !pred(&sink.records()) {
        assert!(tokio::time::Instant::now() < deadline, "condition never met");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Runs `fut` with a ceiling so a hung server fails the test instead of
/// stalling the suite.
pub async fn within<T>(secs: u64, fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(secs), fut)
        .await
        .expect("timed out")
}
