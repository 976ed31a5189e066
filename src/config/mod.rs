use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::poller::PollSettings;
use crate::probe::{HttpMethod, ProbeKind};

/// Endpoints waited on when none are configured
pub const DEFAULT_URLS: &[&str] = &[
    "https://google.com/",
    "http://archive.raspberrypi.org/debian",
    "http://raspbian.raspberrypi.org/raspbian",
];

/// Default session timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Probe configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Probe mechanism: http or tcp
    #[serde(default)]
    pub kind: ProbeKind,

    /// HTTP request method: get or head
    #[serde(default)]
    pub method: HttpMethod,

    /// Skip TLS certificate verification for https endpoints
    #[serde(default)]
    pub insecure: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            kind: ProbeKind::default(),
            method: HttpMethod::default(),
            insecure: false,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Endpoints to wait for
    #[serde(default = "default_urls")]
    pub urls: Vec<String>,

    /// Session timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Per-attempt timeout in seconds (defaults to the session timeout)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_timeout: Option<f64>,

    /// Concurrent attempts (0 = one per endpoint)
    #[serde(default)]
    pub threads: usize,

    /// Probe settings
    #[serde(default)]
    pub probe: ProbeConfig,
}

fn default_urls() -> Vec<String> {
    DEFAULT_URLS.iter().map(|url| url.to_string()).collect()
}

fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            timeout: default_timeout(),
            attempt_timeout: None,
            threads: 0,
            probe: ProbeConfig::default(),
        }
    }
}

impl WaitConfig {
    /// Convert to poller settings
    ///
    /// A negative session timeout clamps to zero, the session then times out
    /// at its first deadline check. Attempt timeouts must be positive.
    pub fn poll_settings(&self) -> Result<PollSettings> {
        let global_timeout = seconds(self.timeout.max(0.0)).context("Invalid timeout")?;

        let attempt_timeout = match self.attempt_timeout {
            Some(secs) => {
                if secs.is_nan() || secs <= 0.0 {
                    anyhow::bail!("Attempt timeout must be greater than 0, got {}", secs);
                }
                seconds(secs).context("Invalid attempt timeout")?
            }
            None => global_timeout,
        };

        Ok(PollSettings::new(global_timeout, attempt_timeout, self.threads))
    }
}

/// Fractional seconds to a Duration, rejecting NaN, infinities and overflow
fn seconds(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| anyhow::anyhow!("{} seconds: {}", secs, e))
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<WaitConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config: WaitConfig =
        serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?;

    Ok(config)
}

/// Override `config` from environment variables
///
/// - NETWAIT_URLS (comma-separated list of endpoints)
/// - NETWAIT_TIMEOUT (seconds)
/// - NETWAIT_ATTEMPT_TIMEOUT (seconds)
/// - NETWAIT_THREADS
/// - NETWAIT_PROBE (http or tcp)
///
/// A `.env` file in the working directory is loaded first if present.
pub fn apply_env(config: &mut WaitConfig) -> Result<()> {
    let _ = dotenvy::dotenv();

    if let Ok(urls) = std::env::var("NETWAIT_URLS") {
        config.urls = urls
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Ok(timeout) = std::env::var("NETWAIT_TIMEOUT") {
        config.timeout = timeout
            .trim()
            .parse()
            .context(format!("NETWAIT_TIMEOUT is not a number: {}", timeout))?;
    }

    if let Ok(timeout) = std::env::var("NETWAIT_ATTEMPT_TIMEOUT") {
        config.attempt_timeout = Some(
            timeout
                .trim()
                .parse()
                .context(format!("NETWAIT_ATTEMPT_TIMEOUT is not a number: {}", timeout))?,
        );
    }

    if let Ok(threads) = std::env::var("NETWAIT_THREADS") {
        config.threads = threads
            .trim()
            .parse()
            .context(format!("NETWAIT_THREADS is not a count: {}", threads))?;
    }

    if let Ok(kind) = std::env::var("NETWAIT_PROBE") {
        config.probe.kind = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }

    Ok(())
}

/// Load configuration from an optional YAML file, then the environment
pub fn load_config(config_path: Option<&str>) -> Result<WaitConfig> {
    let mut config = match config_path {
        Some(path) => load_from_yaml(path)?,
        None => WaitConfig::default(),
    };

    apply_env(&mut config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
urls:
  - https://mirror.example.com/debian
  - http://dns.example.com/
timeout: 12.5
attempt_timeout: 2
threads: 4
probe:
  kind: http
  method: head
  insecure: true
"#;

        let config: WaitConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.urls.len(), 2);
        assert_eq!(config.timeout, 12.5);
        assert_eq!(config.attempt_timeout, Some(2.0));
        assert_eq!(config.threads, 4);
        assert_eq!(config.probe.method, HttpMethod::Head);
        assert!(config.probe.insecure);
    }

    #[test]
    fn test_default_values() {
        let config: WaitConfig = serde_yaml::from_str("threads: 2").unwrap();

        assert_eq!(config.urls, default_urls());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.attempt_timeout, None);
        assert_eq!(config.probe, ProbeConfig::default());
    }

    #[test]
    fn test_poll_settings() {
        let config = WaitConfig {
            timeout: 1.5,
            attempt_timeout: Some(0.25),
            threads: 3,
            ..Default::default()
        };

        let settings = config.poll_settings().unwrap();
        assert_eq!(settings.global_timeout, Duration::from_millis(1500));
        assert_eq!(settings.attempt_timeout, Duration::from_millis(250));
        assert_eq!(settings.concurrency, 3);
    }

    #[test]
    fn test_attempt_timeout_defaults_to_timeout() {
        let config = WaitConfig {
            timeout: 4.0,
            ..Default::default()
        };
        let settings = config.poll_settings().unwrap();
        assert_eq!(settings.attempt_timeout, Duration::from_secs(4));
    }

    #[test]
    fn test_negative_timeout_clamps_to_zero() {
        let config = WaitConfig {
            timeout: -3.0,
            attempt_timeout: Some(1.0),
            ..Default::default()
        };
        let settings = config.poll_settings().unwrap();
        assert_eq!(settings.global_timeout, Duration::ZERO);
    }

    #[test]
    fn test_invalid_timeouts_rejected() {
        let config = WaitConfig {
            timeout: f64::INFINITY,
            ..Default::default()
        };
        assert!(config.poll_settings().is_err());

        let config = WaitConfig {
            attempt_timeout: Some(0.0),
            ..Default::default()
        };
        assert!(config.poll_settings().is_err());

        let config = WaitConfig {
            attempt_timeout: Some(f64::NAN),
            ..Default::default()
        };
        assert!(config.poll_settings().is_err());
    }
}
