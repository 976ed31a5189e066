//! CLI module for netwait
//!
//! Thin glue around the [`Poller`]: merges command line flags over the
//! configuration file and environment, builds the requested probe and maps
//! the session outcome to a process status code.
//!
//! # Usage
//!
//! ```bash
//! # Wait up to 30s for the default mirrors
//! netwait
//!
//! # Wait up to 60s for two URLs, debug logging
//! netwait --timeout 60 --urls https://deb.debian.org/ http://10.0.0.2:8080/ -v
//!
//! # Wait for TCP services instead of HTTP
//! netwait --probe tcp --urls db.internal:5432 cache.internal:6379
//! ```

pub mod args;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::{self, ProbeConfig};
use crate::poller::{PollOutcome, Poller, STATUS_INVALID_INPUT};
use crate::probe::{HttpProbe, Probe, ProbeError, ProbeKind, TcpProbe};
use args::Cli;

/// Run one poll session as described by `cli`
///
/// Errors are configuration or argument problems found before polling starts.
/// A probe that cannot be built is reported as an outcome, not an error, so
/// internal failures keep their own status code.
pub async fn run(cli: Cli) -> Result<PollOutcome> {
    debug!("CLI arguments: {:?}", cli);

    let config = config::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let config = cli.apply(config);

    let settings = config.poll_settings()?;
    let probe = match build_probe(&config.probe) {
        Ok(probe) => probe,
        Err(e) => {
            error!(error = ?e, "Failed to set up connectivity checks");
            return Ok(PollOutcome::from(e));
        }
    };

    info!(
        endpoints = config.urls.len(),
        timeout_secs = settings.global_timeout.as_secs_f64(),
        probe = ?config.probe.kind,
        "Waiting for endpoints"
    );

    let poller = Poller::new(probe, settings);
    Ok(poller.poll(&config.urls).await)
}

/// Build the probe selected by configuration
pub fn build_probe(config: &ProbeConfig) -> std::result::Result<Arc<dyn Probe>, ProbeError> {
    let probe: Arc<dyn Probe> = match config.kind {
        ProbeKind::Http => Arc::new(HttpProbe::new(config.method, config.insecure)?),
        ProbeKind::Tcp => Arc::new(TcpProbe::new()),
    };
    Ok(probe)
}

/// Status to exit with for a command line that failed to parse
///
/// `None` for `--help` and `--version`, which clap reports as errors but are
/// not failures. Anything else is invalid input, never clap's own status 2,
/// which would read as "2 endpoints unreachable".
pub fn usage_error_status(err: &clap::Error) -> Option<i32> {
    use clap::error::ErrorKind;

    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => None,
        _ => Some(STATUS_INVALID_INPUT),
    }
}

/// Initialize logging: debug with `verbose`, info otherwise, RUST_LOG wins when set
pub fn init_logging(verbose: bool) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
