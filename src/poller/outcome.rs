use std::fmt;

use crate::probe::{Endpoint, ProbeError};

/// Unreachable counts at or above this are reported as [`UnreachableCount::Saturated`]
pub const SATURATION_THRESHOLD: usize = 126;

/// Status code: every endpoint reached
pub const STATUS_REACHED: i32 = 0;
/// Status code: too many endpoints unreachable to report the exact count
pub const STATUS_SATURATED: i32 = -1;
/// Status code: malformed endpoint or configuration
pub const STATUS_INVALID_INPUT: i32 = -2;
/// Status code: anything else went wrong
pub const STATUS_UNEXPECTED: i32 = -3;

/// Number of endpoints left unreached when the deadline fired
///
/// The exact count is only kept while it fits the 1-125 exit code range.
/// Larger counts saturate to a sentinel instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreachableCount {
    Exact(u8),
    Saturated,
}

impl UnreachableCount {
    pub fn from_count(count: usize) -> Self {
        if count >= SATURATION_THRESHOLD {
            UnreachableCount::Saturated
        } else {
            // Below the threshold, always fits
            UnreachableCount::Exact(count as u8)
        }
    }

    pub fn status_code(self) -> i32 {
        match self {
            UnreachableCount::Exact(n) => i32::from(n),
            UnreachableCount::Saturated => STATUS_SATURATED,
        }
    }
}

/// Terminal result of a poll session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Every endpoint was reached before the deadline
    Reached,
    /// The deadline fired first; these endpoints were never reached
    TimedOut { unreachable: Vec<Endpoint> },
    /// An endpoint (or the endpoint set) is structurally invalid
    InvalidInput(String),
    /// A failure that is neither a network error nor invalid input
    Unexpected(String),
}

impl PollOutcome {
    /// Saturating unreachable count, `None` unless the session timed out
    pub fn unreachable_count(&self) -> Option<UnreachableCount> {
        match self {
            PollOutcome::TimedOut { unreachable } => {
                Some(UnreachableCount::from_count(unreachable.len()))
            }
            _ => None,
        }
    }

    /// Process status code for this outcome
    ///
    /// `0` all reached, `1..=125` unreachable count, `-1` saturated count,
    /// `-2` invalid input, `-3` unexpected error.
    pub fn status_code(&self) -> i32 {
        match self {
            PollOutcome::Reached => STATUS_REACHED,
            PollOutcome::TimedOut { unreachable } => {
                UnreachableCount::from_count(unreachable.len()).status_code()
            }
            PollOutcome::InvalidInput(_) => STATUS_INVALID_INPUT,
            PollOutcome::Unexpected(_) => STATUS_UNEXPECTED,
        }
    }

    pub fn is_reached(&self) -> bool {
        matches!(self, PollOutcome::Reached)
    }
}

/// Outcome for a probe failure that ends the session before or outside a round
///
/// Invalid endpoints stay invalid input, everything else is unexpected.
impl From<ProbeError> for PollOutcome {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::InvalidEndpoint { .. } => PollOutcome::InvalidInput(err.to_string()),
            other => PollOutcome::Unexpected(other.to_string()),
        }
    }
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollOutcome::Reached => write!(f, "all endpoints reachable"),
            PollOutcome::TimedOut { unreachable } => {
                write!(f, "timed out with {} unreachable endpoint(s)", unreachable.len())
            }
            PollOutcome::InvalidInput(reason) => write!(f, "invalid input: {}", reason),
            PollOutcome::Unexpected(reason) => write!(f, "unexpected error: {}", reason),
        }
    }
}
