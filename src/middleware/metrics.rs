use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Prometheus-compatible request metrics.
///
/// All counters use relaxed atomics — metrics are eventually consistent and
/// never block the request path. The dispatcher chain feeds the request and
/// latency counters; the server feeds the outcome counters directly for
/// requests that never reach a handler (redirects, denials, infrastructure
/// endpoints).
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    login_redirects: AtomicUsize,
    denied_requests: AtomicUsize,
    top_level_requests: AtomicUsize,
}

impl Default for MetricsMiddleware {
    fn default() -> Self {
        Self {
            request_count: AtomicUsize::new(0),
            total_latency_ns: AtomicU64::new(0),
            login_redirects: AtomicUsize::new(0),
            denied_requests: AtomicUsize::new(0),
            top_level_requests: AtomicUsize::new(0),
        }
    }
}

impl MetricsMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean handler latency across all dispatched requests.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Count a redirect-to-login outcome.
    pub fn inc_login_redirect(&self) {
        self.login_redirects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn login_redirects(&self) -> usize {
        self.login_redirects.load(Ordering::Relaxed)
    }

    /// Count a denied (malformed or forbidden) request.
    pub fn inc_denied_request(&self) {
        self.denied_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn denied_requests(&self) -> usize {
        self.denied_requests.load(Ordering::Relaxed)
    }

    /// Count an infrastructure request (`/health`, `/metrics`, preflight)
    /// that bypasses the dispatcher.
    pub fn inc_top_level_request(&self) {
        self.top_level_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn top_level_request_count(&self) -> usize {
        self.top_level_requests.load(Ordering::Relaxed)
    }

    /// Render the Prometheus text exposition served at `/metrics`.
    pub fn render(&self) -> String {
        format!(
            "# HELP authgate_requests_total Total number of dispatched requests\n\
             # TYPE authgate_requests_total counter\n\
             authgate_requests_total {}\n\
             # HELP authgate_request_latency_seconds Average handler latency in seconds\n\
             # TYPE authgate_request_latency_seconds gauge\n\
             authgate_request_latency_seconds {}\n\
             # HELP authgate_login_redirects_total Requests redirected to the login flow\n\
             # TYPE authgate_login_redirects_total counter\n\
             authgate_login_redirects_total {}\n\
             # HELP authgate_denied_requests_total Requests denied before dispatch\n\
             # TYPE authgate_denied_requests_total counter\n\
             authgate_denied_requests_total {}\n\
             # HELP authgate_top_level_requests_total Infrastructure requests answered without dispatch\n\
             # TYPE authgate_top_level_requests_total counter\n\
             authgate_top_level_requests_total {}\n",
            self.request_count(),
            self.average_latency().as_secs_f64(),
            self.login_redirects(),
            self.denied_requests(),
            self.top_level_request_count(),
        )
    }
}

impl Middleware for MetricsMiddleware {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, latency: Duration) {
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
    }
}
