use serde::Serialize;
use std::collections::BTreeMap;

/// Authentication health of one domain during a crawl
///
/// Created lazily on the first auth failure. Once `blocked` is set it is never
/// cleared for the remainder of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainAuthState {
    /// The domain key (`host` or `host:port`)
    pub domain: String,

    /// Number of auth failures recorded so far
    pub failure_count: u32,

    /// Whether further fetches to this domain are refused
    pub blocked: bool,
}

impl DomainAuthState {
    /// Creates a healthy state for a domain
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            failure_count: 0,
            blocked: false,
        }
    }

    /// Records one auth failure
    ///
    /// # Arguments
    ///
    /// * `max_failures` - Threshold at which the domain becomes blocked
    ///
    /// # Returns
    ///
    /// * `true` - If this failure is the one that blocked the domain
    /// * `false` - Otherwise (still healthy, or already blocked)
    pub fn record_failure(&mut self, max_failures: u32) -> bool {
        self.failure_count = self.failure_count.saturating_add(1);

        if !self.blocked && self.failure_count >= max_failures {
            self.blocked = true;
            return true;
        }

        false
    }
}

/// Per-domain auth states for a run, keyed by domain
#[derive(Debug, Clone)]
pub struct AuthLedger {
    max_failures: u32,
    states: BTreeMap<String, DomainAuthState>,
}

/// What happened when an auth failure was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureRecord {
    pub failure_count: u32,
    pub newly_blocked: bool,
}

impl AuthLedger {
    pub fn new(max_failures: u32) -> Self {
        Self {
            max_failures,
            states: BTreeMap::new(),
        }
    }

    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }

    /// Returns true if the domain has been blocked
    pub fn is_blocked(&self, domain: &str) -> bool {
        self.states.get(domain).map_or(false, |s| s.blocked)
    }

    /// Records an auth failure for a domain, creating its state if needed
    pub fn record_failure(&mut self, domain: &str) -> FailureRecord {
        let max = self.max_failures;
        let state = self
            .states
            .entry(domain.to_string())
            .or_insert_with(|| DomainAuthState::new(domain));
        let newly_blocked = state.record_failure(max);

        FailureRecord {
            failure_count: state.failure_count,
            newly_blocked,
        }
    }

    pub fn get(&self, domain: &str) -> Option<&DomainAuthState> {
        self.states.get(domain)
    }

    /// Returns failure counts for every domain that has failed at least once
    pub fn failures_by_domain(&self) -> BTreeMap<String, u32> {
        self.states
            .iter()
            .map(|(domain, state)| (domain.clone(), state.failure_count))
            .collect()
    }

    /// Returns the domains currently blocked
    pub fn blocked_domains(&self) -> Vec<String> {
        self.states
            .values()
            .filter(|s| s.blocked)
            .map(|s| s.domain.clone())
            .collect()
    }
}
