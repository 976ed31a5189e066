//! Connectivity poller
//!
//! Waits until every endpoint in a set is reachable or a global deadline
//! passes. The session runs in rounds:
//!
//! 1. Check the deadline, stop if no time is left
//! 2. Submit one attempt per unreached endpoint, at most `concurrency` in flight
//! 3. Drain completions (first finished, first processed) until the round is
//!    done or the deadline fires
//!
//! A reached endpoint is never probed again. Retryable failures are retried
//! the next round without backoff; an invalid endpoint or an unexpected
//! failure ends the session immediately.
//!
//! Attempts run as spawned tokio tasks, each capped by the attempt timeout.
//! When the deadline fires mid-round the remaining attempts are abandoned and
//! their results are dropped with the round.

pub mod outcome;
pub mod state;

pub use outcome::{
    PollOutcome, UnreachableCount, SATURATION_THRESHOLD, STATUS_INVALID_INPUT, STATUS_REACHED,
    STATUS_SATURATED, STATUS_UNEXPECTED,
};
pub use state::ReachabilityState;

use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, Level};

use crate::probe::{Endpoint, Probe, ProbeError, ProbeResult};

/// Deadline used when the global timeout is too large to add to `Instant::now()`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Timing and parallelism for a poll session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Wall-clock budget for the whole session
    pub global_timeout: Duration,
    /// Budget for each individual probe attempt
    pub attempt_timeout: Duration,
    /// Maximum attempts in flight (0 = one per distinct endpoint)
    pub concurrency: usize,
}

impl PollSettings {
    pub fn new(global_timeout: Duration, attempt_timeout: Duration, concurrency: usize) -> Self {
        Self {
            global_timeout,
            attempt_timeout,
            concurrency,
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            global_timeout: Duration::from_secs(30),
            attempt_timeout: Duration::from_secs(30),
            concurrency: 0,
        }
    }
}

/// Runs poll sessions against a shared probe
#[derive(Clone)]
pub struct Poller {
    probe: Arc<dyn Probe>,
    settings: PollSettings,
}

impl Poller {
    pub fn new(probe: Arc<dyn Probe>, settings: PollSettings) -> Self {
        Self { probe, settings }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Poll `endpoints` until all are reachable or the global timeout elapses
    pub async fn poll<S: AsRef<str>>(&self, endpoints: &[S]) -> PollOutcome {
        let start = Instant::now();
        let deadline = start
            .checked_add(self.settings.global_timeout)
            .unwrap_or_else(|| start + FAR_FUTURE);

        let mut state = ReachabilityState::new(endpoints);
        if state.is_empty() {
            error!("No endpoints to wait for");
            return PollOutcome::InvalidInput("no endpoints to wait for".to_string());
        }

        let concurrency = match self.settings.concurrency {
            0 => state.len(),
            n => n,
        };

        debug!(
            endpoints = state.len(),
            concurrency,
            timeout_secs = self.settings.global_timeout.as_secs_f64(),
            attempt_timeout_secs = self.settings.attempt_timeout.as_secs_f64(),
            "Starting poll session"
        );

        'session: loop {
            let time_left = deadline.saturating_duration_since(Instant::now());
            debug!("{:.2} seconds left before timeout", time_left.as_secs_f64());
            if time_left.is_zero() {
                debug!("Session deadline reached");
                break;
            }

            let mut round = self.submit_round(state.unreached(), concurrency);

            loop {
                let completed = match tokio::time::timeout_at(deadline, round.next()).await {
                    Ok(completed) => completed,
                    Err(_) => {
                        debug!("Round wait hit the session deadline");
                        break 'session;
                    }
                };

                let Some((endpoint, result)) = completed else {
                    break;
                };

                match result {
                    Ok(()) => {
                        if state.mark_reached(&endpoint) {
                            info!(endpoint = %endpoint, "Endpoint reachable");
                        }
                        if state.all_reached() {
                            info!(
                                elapsed_ms = start.elapsed().as_millis() as u64,
                                "All endpoints reachable"
                            );
                            return PollOutcome::Reached;
                        }
                    }
                    Err(ProbeError::InvalidEndpoint { endpoint, reason }) => {
                        error!(endpoint = %endpoint, reason = %reason, "Invalid endpoint");
                        return PollOutcome::InvalidInput(format!("{}: {}", endpoint, reason));
                    }
                    Err(ProbeError::Unexpected(reason)) => {
                        error!(endpoint = %endpoint, error = ?reason, "Unexpected probe failure");
                        return PollOutcome::Unexpected(format!("{}: {}", endpoint, reason));
                    }
                    Err(e) if e.is_retryable() => {
                        debug!(endpoint = %endpoint, error = %e, "Retrying endpoint");
                    }
                    Err(e) => {
                        error!(endpoint = %endpoint, error = ?e, "Unclassified attempt failure");
                        return PollOutcome::Unexpected(format!("{}: {}", endpoint, e));
                    }
                }
            }
        }

        let unreachable = state.unreached();
        let elapsed_ms = start.elapsed().as_millis() as u64;
        if timeout_level(&unreachable) == Level::ERROR {
            error!(unreachable = ?unreachable, elapsed_ms, "Timed out waiting for endpoints");
        } else {
            info!(elapsed_ms, "Deadline reached with every endpoint reachable");
        }
        PollOutcome::TimedOut { unreachable }
    }

    /// Stream of attempt results for one round, at most `concurrency` in flight
    fn submit_round(
        &self,
        pending: Vec<Endpoint>,
        concurrency: usize,
    ) -> BoxStream<'static, (Endpoint, ProbeResult)> {
        let probe = Arc::clone(&self.probe);
        let attempt_timeout = self.settings.attempt_timeout;

        stream::iter(pending)
            .map(move |endpoint| {
                let probe = Arc::clone(&probe);
                async move {
                    let result = run_attempt(probe, endpoint.clone(), attempt_timeout).await;
                    (endpoint, result)
                }
            })
            .buffer_unordered(concurrency)
            .boxed()
    }
}

/// Level of the timeout report: only an actual shortfall is an error
fn timeout_level(unreachable: &[Endpoint]) -> Level {
    if unreachable.is_empty() {
        Level::INFO
    } else {
        Level::ERROR
    }
}

/// Run one attempt on its own task so a panicking probe cannot take down the session
async fn run_attempt(probe: Arc<dyn Probe>, endpoint: Endpoint, attempt_timeout: Duration) -> ProbeResult {
    let task = tokio::spawn(async move {
        match tokio::time::timeout(attempt_timeout, probe.attempt(&endpoint, attempt_timeout)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(attempt_timeout)),
        }
    });

    match task.await {
        Ok(result) => result,
        Err(e) => Err(ProbeError::Unexpected(format!("probe task failed: {}", e))),
    }
}
