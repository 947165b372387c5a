//! Per-domain crawl state
//!
//! Tracks authentication failures per domain and the circuit breaker that
//! stops a crawl from hammering a login endpoint.

mod domain_state;

pub use domain_state::{AuthLedger, DomainAuthState, FailureRecord};
