//! OAuth2 login redirector.
//!
//! The OAuth2 handshake itself — provider metadata, token exchange — is an
//! external collaborator. This component only reacts to the handshake's
//! outcome: success redirects to the configured success URL, failure to the
//! failure URL with an error indicator.

use tracing::warn;

use crate::config::GateConfig;

/// Redirect targets for the two login outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTargets {
    pub success_url: String,
    pub failure_url: String,
}

impl RedirectTargets {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            success_url: config.oauth2_success_url.clone(),
            failure_url: config.oauth2_failure_url.clone(),
        }
    }
}

/// Maps login outcomes to redirect URLs. This is the collaborator interface
/// exposed to the OAuth2 provider integration.
#[derive(Debug)]
pub struct LoginRedirector {
    targets: RedirectTargets,
}

impl LoginRedirector {
    pub fn new(targets: RedirectTargets) -> Self {
        Self { targets }
    }

    /// Resolve the redirect URL for a completed login attempt.
    ///
    /// Failures append `error=true` unless the configured failure URL already
    /// carries an `error` query parameter, so the default
    /// `/login?error=true` is used verbatim. Failures are logged and never
    /// retried here — recovery is user-initiated.
    pub fn notify_login_outcome(&self, success: bool) -> String {
        if success {
            return self.targets.success_url.clone();
        }
        warn!("OAuth2 login failed, redirecting to failure URL");
        let failure = &self.targets.failure_url;
        if has_error_flag(failure) {
            failure.clone()
        } else if failure.contains('?') {
            format!("{failure}&error=true")
        } else {
            format!("{failure}?error=true")
        }
    }
}

fn has_error_flag(url: &str) -> bool {
    url.split_once('?')
        .map(|(_, query)| {
            query
                .split('&')
                .any(|pair| pair == "error" || pair.starts_with("error="))
        })
        .unwrap_or(false)
}
