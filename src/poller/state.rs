use std::collections::HashMap;

use crate::probe::Endpoint;

/// Per-endpoint reached / not-yet-reached map for one poll session
///
/// Endpoints keep the order in which they were first supplied. Duplicates
/// collapse into a single entry.
#[derive(Debug, Clone, Default)]
pub struct ReachabilityState {
    /// Distinct endpoints in input order
    order: Vec<Endpoint>,
    /// Endpoint -> reached
    reached: HashMap<Endpoint, bool>,
}

impl ReachabilityState {
    /// Start a session with every endpoint unreached
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = Self::default();
        for endpoint in endpoints {
            let endpoint = endpoint.as_ref();
            if !state.reached.contains_key(endpoint) {
                state.order.push(endpoint.to_string());
                state.reached.insert(endpoint.to_string(), false);
            }
        }
        state
    }

    /// Number of distinct endpoints
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Mark `endpoint` reached. Returns true only on the false -> true transition.
    pub fn mark_reached(&mut self, endpoint: &str) -> bool {
        match self.reached.get_mut(endpoint) {
            Some(reached) if !*reached => {
                *reached = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_reached(&self, endpoint: &str) -> bool {
        self.reached.get(endpoint).copied().unwrap_or(false)
    }

    pub fn all_reached(&self) -> bool {
        self.reached.values().all(|reached| *reached)
    }

    /// Endpoints still waiting to be reached, in input order
    pub fn unreached(&self) -> Vec<Endpoint> {
        self.order
            .iter()
            .filter(|endpoint| !self.is_reached(endpoint))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unreached() {
        let state = ReachabilityState::new(["http://a", "http://b"]);
        assert_eq!(state.len(), 2);
        assert!(!state.all_reached());
        assert_eq!(state.unreached(), vec!["http://a", "http://b"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let state = ReachabilityState::new(["http://a", "http://b", "http://a"]);
        assert_eq!(state.len(), 2);
        assert_eq!(state.unreached(), vec!["http://a", "http://b"]);
    }

    #[test]
    fn test_mark_reached_transitions_once() {
        let mut state = ReachabilityState::new(["http://a", "http://b"]);

        assert!(state.mark_reached("http://a"));
        assert!(!state.mark_reached("http://a"));
        assert!(state.is_reached("http://a"));
        assert_eq!(state.unreached(), vec!["http://b"]);

        assert!(state.mark_reached("http://b"));
        assert!(state.all_reached());
        assert!(state.unreached().is_empty());
    }

    #[test]
    fn test_unknown_endpoint_ignored() {
        let mut state = ReachabilityState::new(["http://a"]);
        assert!(!state.mark_reached("http://zzz"));
        assert!(!state.is_reached("http://zzz"));
        assert_eq!(state.len(), 1);
    }
}
