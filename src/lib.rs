//! netwait - wait for network endpoints to become reachable

pub mod cli;
pub mod config;
pub mod poller;
pub mod probe;

pub use config::WaitConfig;
pub use poller::{PollOutcome, PollSettings, Poller};
pub use probe::{Endpoint, Probe, ProbeError, ProbeResult};
