use clap::Parser;

use crate::config::WaitConfig;
use crate::probe::{HttpMethod, ProbeKind};

/// netwait - wait for network endpoints to become reachable
///
/// Exits with 0 once every endpoint answered, N (1-125) for the number still
/// unreachable at the timeout, -1 when 126 or more are unreachable, -2 on
/// invalid input and -3 on unexpected errors.
#[derive(Parser, Debug)]
#[command(name = "netwait")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Seconds to wait before returning the number of unreachable endpoints [default: 30]
    #[arg(long, allow_negative_numbers = true)]
    pub timeout: Option<f64>,

    /// Endpoints to wait on in parallel (space separated)
    #[arg(long, num_args = 0..)]
    pub urls: Option<Vec<String>>,

    /// Seconds allowed for each attempt [default: --timeout]
    #[arg(long)]
    pub attempt_timeout: Option<f64>,

    /// Size of the worker pool [default: number of endpoints]
    #[arg(long)]
    pub threads: Option<usize>,

    /// Probe mechanism
    #[arg(long, value_enum)]
    pub probe: Option<ProbeKind>,

    /// HTTP request method
    #[arg(long, value_enum)]
    pub method: Option<HttpMethod>,

    /// Disable TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// YAML configuration file
    #[arg(long, env = "NETWAIT_CONFIG")]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command line arguments, leaving exit handling to the caller
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Cli::try_parse()
    }

    /// Apply command line overrides on top of file and environment configuration
    pub fn apply(&self, mut config: WaitConfig) -> WaitConfig {
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(urls) = &self.urls {
            config.urls = urls.clone();
        }
        if let Some(attempt_timeout) = self.attempt_timeout {
            config.attempt_timeout = Some(attempt_timeout);
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(kind) = self.probe {
            config.probe.kind = kind;
        }
        if let Some(method) = self.method {
            config.probe.method = method;
        }
        if self.insecure {
            config.probe.insecure = true;
        }
        config
    }
}
