//! Server configuration.
//!
//! Everything has a fixed default; the binary runs with
//! [`Config::default`]. Log filtering is the one knob left to the
//! environment (`RUST_LOG`).

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LogFormat;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default upper bound on the shutdown drain.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Default file appended to by the `/test` endpoint.
pub const DEFAULT_MARKER_PATH: &str = "/var/log/test/test.out";

#[derive(Clone, Debug)]
pub struct Config {
    /// Address the listener binds to.
    pub addr: SocketAddr,
    /// How long shutdown waits for in-flight connections.
    pub drain_timeout: Duration,
    /// File the marker endpoint appends to.
    pub marker_path: PathBuf,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            marker_path: PathBuf::from(DEFAULT_MARKER_PATH),
            log_format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_all_interfaces_port_8080() {
        let config = Config::default();
        assert_eq!(config.addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.drain_timeout, Duration::from_secs(1));
        assert_eq!(config.marker_path, PathBuf::from("/var/log/test/test.out"));
    }
}
