//! TCP connect probe
//!
//! An endpoint is reached as soon as a TCP connection to it is established.
//! Name resolution happens on every attempt, so a probe also waits for DNS.

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

use super::{Probe, ProbeError, ProbeResult};

/// Probe that opens (and immediately drops) a TCP connection
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

impl TcpProbe {
    pub fn new() -> Self {
        Self
    }

    /// Split `host:port` (optionally prefixed with `tcp://`) into its parts
    fn parse_endpoint(endpoint: &str) -> Result<(String, u16), ProbeError> {
        let target = endpoint.trim();
        let target = target.strip_prefix("tcp://").unwrap_or(target);
        let target = target.trim_end_matches('/');

        let (host, port) = target
            .rsplit_once(':')
            .ok_or_else(|| ProbeError::invalid(endpoint, "expected host:port"))?;

        // Bracketed IPv6 literal, e.g. [::1]:80
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if host.is_empty() {
            return Err(ProbeError::invalid(endpoint, "missing host"));
        }

        let port: u16 = port
            .parse()
            .map_err(|_| ProbeError::invalid(endpoint, format!("invalid port '{}'", port)))?;

        Ok((host.to_string(), port))
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn attempt(&self, endpoint: &str, timeout: Duration) -> ProbeResult {
        let (host, port) = Self::parse_endpoint(endpoint)?;

        debug!(endpoint = %endpoint, "Trying to connect");

        match tokio::time::timeout(timeout, TcpStream::connect((host.as_str(), port))).await {
            Ok(Ok(_stream)) => {
                debug!(endpoint = %endpoint, "Connected");
                Ok(())
            }
            Ok(Err(e)) => Err(ProbeError::Connect(e.to_string())),
            Err(_) => Err(ProbeError::Timeout(timeout)),
        }
    }
}
