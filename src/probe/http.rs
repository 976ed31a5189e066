//! HTTP(S) reachability probe
//!
//! Sends a single request per attempt and treats any status below 400 as
//! reached. Connection errors, timeouts and 4xx/5xx answers are retryable;
//! URLs that cannot be parsed, lack a host or use a non-HTTP scheme are fatal.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Empty;
use hyper::{Method, Request};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use native_tls::TlsConnector;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{Probe, ProbeError, ProbeResult};

/// Request method used by [`HttpProbe`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    #[default]
    Get,
    Head,
}

impl HttpMethod {
    fn as_method(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Head => Method::HEAD,
        }
    }
}

/// HTTP(S) probe backed by a hyper client
///
/// Clone is cheap - the underlying client uses Arc internally.
#[derive(Clone)]
pub struct HttpProbe {
    client: HyperClient<HttpsConnector<HttpConnector>, Empty<Bytes>>,
    method: HttpMethod,
}

impl HttpProbe {
    /// Create a probe issuing `method` requests
    ///
    /// With `insecure_tls` certificate and hostname verification are disabled.
    pub fn new(method: HttpMethod, insecure_tls: bool) -> Result<Self, ProbeError> {
        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.enforce_http(false);

        let tls = if insecure_tls {
            warn!("INSECURE TLS MODE ENABLED: Certificate verification is disabled!");
            TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
        } else {
            TlsConnector::new()
        }
        .map_err(|e| ProbeError::Unexpected(format!("Failed to build TLS connector: {}", e)))?;

        let https = HttpsConnector::from((http, tls.into()));

        // Every attempt must open a fresh connection, a pooled one proves nothing
        let client = HyperClient::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .set_host(true)
            .build(https);

        Ok(Self { client, method })
    }

    /// Validate an endpoint and turn it into a request URI
    fn parse_endpoint(endpoint: &str) -> Result<hyper::Uri, ProbeError> {
        let url = url::Url::parse(endpoint).map_err(|e| ProbeError::invalid(endpoint, e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ProbeError::invalid(
                    endpoint,
                    format!("unsupported scheme '{}'", other),
                ))
            }
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(ProbeError::invalid(endpoint, "missing host"));
        }

        url.as_str()
            .parse::<hyper::Uri>()
            .map_err(|e| ProbeError::invalid(endpoint, e.to_string()))
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn attempt(&self, endpoint: &str, timeout: Duration) -> ProbeResult {
        let uri = Self::parse_endpoint(endpoint)?;

        debug!(endpoint = %endpoint, method = ?self.method, "Trying to reach endpoint");

        let request = Request::builder()
            .method(self.method.as_method())
            .uri(uri)
            .body(Empty::<Bytes>::new())
            .map_err(|e| ProbeError::Unexpected(format!("Request build error: {}", e)))?;

        let response = match tokio::time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => return Err(ProbeError::Connect(error_chain(&e))),
            Err(_) => return Err(ProbeError::Timeout(timeout)),
        };

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(ProbeError::Status(status));
        }

        debug!(endpoint = %endpoint, status, "Reached endpoint");
        Ok(())
    }
}

/// Render an error with its whole source chain, hyper's top-level message is terse
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
