//! Access decision gate.
//!
//! Composes the rule matcher with the request's authentication state into a
//! terminal per-request [`Decision`]. Decisions carry no cross-request state
//! and the same `(path, session)` input always yields the same output.

use tracing::debug;

use crate::rules::RuleSet;
use crate::security::Session;

/// Terminal outcome of the access decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Pass the request through to the downstream handler.
    Allow,
    /// Redirect to the login flow; expected control flow, not an error.
    RedirectLogin,
    /// Reject outright. Reserved for malformed requests — the current rule
    /// shape never produces it, since unmatched paths route to login.
    Deny,
}

/// The gate itself: a compiled rule set, shared read-only across workers.
#[derive(Debug)]
pub struct AccessGate {
    rules: RuleSet,
}

impl AccessGate {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Decide the outcome for `path` given the request's session, if any.
    ///
    /// Public paths allow regardless of session; protected paths allow only
    /// an authenticated session and send everything else to login.
    #[must_use]
    pub fn decide(&self, path: &str, session: Option<&Session>) -> Decision {
        let rule = self.rules.match_path(path);
        if !rule.requires_auth {
            return Decision::Allow;
        }
        if session.is_some_and(|s| s.authenticated) {
            return Decision::Allow;
        }
        debug!(path = %path, "Unauthenticated access to protected path");
        Decision::RedirectLogin
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}
