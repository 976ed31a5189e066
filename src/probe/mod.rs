//! Reachability probes
//!
//! A probe performs one bounded attempt to reach an endpoint and reports the
//! result as a [`ProbeError`] variant the poller can match on:
//!
//! - **Retryable**: [`ProbeError::Connect`], [`ProbeError::Timeout`],
//!   [`ProbeError::Status`] - the endpoint is retried in the next round
//! - **Fatal**: [`ProbeError::InvalidEndpoint`] - the endpoint can never be
//!   reached, the session aborts
//! - **Unexpected**: [`ProbeError::Unexpected`] - anything else, the session
//!   aborts
//!
//! Two probes ship with the crate:
//!
//! - [`HttpProbe`]: HTTP(S) request against a URL, status < 400 counts as reached
//! - [`TcpProbe`]: plain TCP connect against `host:port`

pub mod http;
pub mod tcp;

pub use http::{HttpMethod, HttpProbe};
pub use tcp::TcpProbe;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque reachability target (a URL for HTTP probes, `host:port` for TCP)
pub type Endpoint = String;

/// Result of a single probe attempt
pub type ProbeResult = std::result::Result<(), ProbeError>;

/// Why a probe attempt did not reach its endpoint
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("Invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: Endpoint, reason: String },

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Endpoint answered with HTTP status {0}")]
    Status(u16),

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl ProbeError {
    pub fn invalid(endpoint: &str, reason: impl Into<String>) -> Self {
        ProbeError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the endpoint should simply be tried again next round
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProbeError::Connect(_) | ProbeError::Timeout(_) | ProbeError::Status(_)
        )
    }
}

/// A single bounded reachability attempt.
///
/// Implementations must be cheap to call repeatedly: the poller invokes
/// `attempt` once per unreached endpoint per round, with no backoff.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Try to reach `endpoint`, giving up after `timeout`
    async fn attempt(&self, endpoint: &str, timeout: Duration) -> ProbeResult;
}

/// Probe mechanism selectable from configuration and the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// HTTP(S) request against a URL
    #[default]
    Http,
    /// TCP connect against host:port
    Tcp,
}

impl std::str::FromStr for ProbeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(ProbeKind::Http),
            "tcp" => Ok(ProbeKind::Tcp),
            other => Err(format!("unknown probe kind '{}'", other)),
        }
    }
}
