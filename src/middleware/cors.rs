//! CORS evaluation and response decoration.
//!
//! A [`CorsPolicy`] is compiled once at startup from the configured origin
//! patterns, methods and headers, and answers one question per request:
//! given an `Origin`, a method and (for preflights) the requested headers,
//! which `Access-Control-*` headers may the response carry?
//!
//! Preflight (`OPTIONS`) and actual requests use the same
//! [`CorsPolicy::evaluate`]; the server answers preflights directly, while
//! [`CorsMiddleware`] decorates dispatched responses.
//!
//! # Credentials and the wildcard origin
//!
//! The policy accepts the permissive combination of a `*` origin pattern with
//! `allow_credentials` — but a credentialed response must never carry a
//! literal `*`. When that combination matches, the evaluator echoes the
//! literal requesting origin instead and the response carries
//! `Vary: Origin`. This is a correctness constraint of the CORS protocol,
//! not a policy choice.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::Method;
use regex::Regex;
use tracing::{debug, warn};

use super::Middleware;
use crate::config::GateConfig;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// How a configured origin entry matches request origins.
#[derive(Debug, Clone)]
enum OriginPattern {
    /// The literal `*` entry: any origin.
    Wildcard,
    /// Exact string match.
    Exact(String),
    /// Pattern with embedded `*` segments, e.g. `https://*.example.com`,
    /// compiled to a regex at startup.
    Pattern(Regex),
}

impl OriginPattern {
    fn parse(pattern: &str) -> Result<Self, CorsConfigError> {
        if pattern == "*" {
            return Ok(Self::Wildcard);
        }
        if !pattern.contains('*') {
            return Ok(Self::Exact(pattern.to_string()));
        }
        let escaped = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^{escaped}$"))
            .map_err(|_| CorsConfigError::InvalidOriginPattern(pattern.to_string()))?;
        Ok(Self::Pattern(regex))
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Exact(exact) => exact == origin,
            Self::Pattern(regex) => regex.is_match(origin),
        }
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }
}

/// Invalid CORS configuration detected at startup.
#[derive(Debug)]
pub enum CorsConfigError {
    InvalidOriginPattern(String),
    InvalidMethod(String),
}

impl fmt::Display for CorsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOriginPattern(pattern) => {
                write!(f, "invalid CORS origin pattern: {pattern}")
            }
            Self::InvalidMethod(method) => write!(f, "invalid CORS method: {method}"),
        }
    }
}

impl std::error::Error for CorsConfigError {}

/// The evaluator's verdict for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsDecision {
    pub allow: bool,
    /// Value for `Access-Control-Allow-Origin`: the echoed origin, or `*`
    /// for uncredentialed wildcard matches.
    pub allowed_origin: Option<String>,
    /// Value for `Access-Control-Allow-Methods`.
    pub allowed_methods: String,
    /// Value for `Access-Control-Allow-Headers`.
    pub allowed_headers: String,
    pub allow_credentials: bool,
    /// Whether the response must carry `Vary: Origin` (set whenever the
    /// allow-origin value depends on the request origin).
    pub vary_origin: bool,
}

impl CorsDecision {
    fn deny() -> Self {
        Self {
            allow: false,
            allowed_origin: None,
            allowed_methods: String::new(),
            allowed_headers: String::new(),
            allow_credentials: false,
            vary_origin: false,
        }
    }
}

/// Immutable CORS policy, compiled at startup.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Vec<OriginPattern>,
    allowed_methods: Vec<Method>,
    allowed_headers: Vec<String>,
    allow_credentials: bool,
    max_age: Option<u32>,
}

impl CorsPolicy {
    /// Compile a policy from explicit lists. Origin patterns with embedded
    /// `*` are compiled to regexes here; method names must parse.
    pub fn new(
        allowed_origins: &[String],
        allowed_methods: &[String],
        allowed_headers: &[String],
        allow_credentials: bool,
    ) -> Result<Self, CorsConfigError> {
        let origins = allowed_origins
            .iter()
            .map(|p| OriginPattern::parse(p))
            .collect::<Result<Vec<_>, _>>()?;
        let methods = allowed_methods
            .iter()
            .map(|m| {
                m.parse::<Method>()
                    .map_err(|_| CorsConfigError::InvalidMethod(m.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            origins,
            allowed_methods: methods,
            allowed_headers: allowed_headers.to_vec(),
            allow_credentials,
            max_age: None,
        })
    }

    /// Compile the policy described by the gate configuration.
    pub fn from_config(config: &GateConfig) -> Result<Self, CorsConfigError> {
        Self::new(
            &config.cors_allowed_origins,
            &config.cors_allowed_methods,
            &config.cors_allowed_headers,
            config.cors_allow_credentials,
        )
    }

    /// Cache preflight responses for `seconds`.
    pub fn with_max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn max_age(&self) -> Option<u32> {
        self.max_age
    }

    /// Evaluate a cross-origin request.
    ///
    /// `method` is the request method for actual requests and the value of
    /// `Access-Control-Request-Method` for preflights;
    /// `requested_headers` is the preflight's
    /// `Access-Control-Request-Headers` list, if any.
    #[must_use]
    pub fn evaluate(
        &self,
        origin: &str,
        method: &Method,
        requested_headers: Option<&str>,
    ) -> CorsDecision {
        let matched = match self.origins.iter().find(|p| p.matches(origin)) {
            Some(pattern) => pattern,
            None => {
                debug!(origin = %origin, "CORS: origin not allowed");
                return CorsDecision::deny();
            }
        };

        if !self.allowed_methods.contains(method) {
            debug!(origin = %origin, method = %method, "CORS: method not allowed");
            return CorsDecision::deny();
        }

        let wildcard_headers = self.allowed_headers.iter().any(|h| h == "*");
        if let Some(requested) = requested_headers {
            if !wildcard_headers {
                for header in requested.split(',').map(str::trim).filter(|h| !h.is_empty()) {
                    if !self
                        .allowed_headers
                        .iter()
                        .any(|h| h.eq_ignore_ascii_case(header))
                    {
                        debug!(origin = %origin, header = %header, "CORS: requested header not allowed");
                        return CorsDecision::deny();
                    }
                }
            }
        }

        // Credentialed responses must never carry a literal wildcard: echo
        // the requesting origin instead.
        let (allowed_origin, vary_origin) = if matched.is_wildcard() && !self.allow_credentials {
            ("*".to_string(), false)
        } else {
            (origin.to_string(), true)
        };

        // With a `*` header list, echo what the preflight asked for; the
        // literal `*` is likewise invalid for credentialed requests.
        let allowed_headers = match requested_headers {
            Some(requested) if wildcard_headers => requested
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            _ => self.allowed_headers.join(", "),
        };

        CorsDecision {
            allow: true,
            allowed_origin: Some(allowed_origin),
            allowed_methods: self
                .allowed_methods
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            allowed_headers,
            allow_credentials: self.allow_credentials,
            vary_origin,
        }
    }

    /// Apply this policy's headers to a response for an actual (non-preflight)
    /// request. No-op when the origin or method is not allowed.
    pub fn decorate(&self, origin: &str, method: &Method, res: &mut HandlerResponse) {
        let decision = self.evaluate(origin, method, None);
        if !decision.allow {
            return;
        }
        if let Some(allowed_origin) = decision.allowed_origin {
            res.set_header("access-control-allow-origin", allowed_origin);
        }
        res.set_header("access-control-allow-methods", decision.allowed_methods);
        res.set_header("access-control-allow-headers", decision.allowed_headers);
        if decision.allow_credentials {
            res.set_header("access-control-allow-credentials", "true".to_string());
        }
        if decision.vary_origin {
            res.set_header("vary", "Origin".to_string());
        }
    }
}

/// Middleware decorating dispatched responses with CORS headers.
///
/// Cross-origin requests whose origin or method the policy rejects are
/// stopped with 403 before reaching their handler; same-origin requests (no
/// `Origin` header) pass through untouched. Preflights never reach the
/// dispatcher — the server answers them from the policy directly.
pub struct CorsMiddleware {
    policy: Arc<CorsPolicy>,
}

impl CorsMiddleware {
    pub fn new(policy: Arc<CorsPolicy>) -> Self {
        Self { policy }
    }
}

impl Middleware for CorsMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        let origin = req.get_header("origin")?;
        let decision = self.policy.evaluate(origin, &req.method, None);
        if decision.allow {
            None
        } else {
            warn!(origin = %origin, method = %req.method, "CORS: rejecting cross-origin request");
            Some(HandlerResponse::error(403, "origin not allowed"))
        }
    }

    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        if let Some(origin) = req.get_header("origin") {
            self.policy.decorate(origin, &req.method, res);
        }
    }
}
