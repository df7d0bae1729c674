//! # Gate Configuration
//!
//! Startup-time configuration for the authorization gate. A [`GateConfig`] is
//! built once at process start — from built-in defaults, a YAML file, and
//! `GATE_*` environment variables (later sources override earlier ones) — and
//! then shared read-only behind an `Arc`. Nothing mutates it after startup.
//!
//! ## Environment Variables
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `GATE_ADDR` | listen address | `0.0.0.0:8080` |
//! | `GATE_PUBLIC_PATHS` | comma-separated public path patterns | `/teams,/games,/login,/oauth2/**` |
//! | `GATE_CORS_ALLOWED_ORIGINS` | comma-separated origin patterns | `*` |
//! | `GATE_CORS_ALLOWED_METHODS` | comma-separated methods | `GET,POST,PUT,DELETE,OPTIONS` |
//! | `GATE_CORS_ALLOWED_HEADERS` | comma-separated headers | `*` |
//! | `GATE_CORS_ALLOW_CREDENTIALS` | `true`/`false` | `true` |
//! | `GATE_LOGIN_PATH` | redirect target for unauthenticated access | `/login` |
//! | `GATE_OAUTH2_SUCCESS_URL` | redirect after successful login | `/` |
//! | `GATE_OAUTH2_FAILURE_URL` | redirect after failed login | `/login?error=true` |
//! | `GATE_SESSION_SIGNATURE` | expected session token signature | dev placeholder |
//! | `GATE_SESSION_COOKIE` | session cookie name | `gate_session` |
//! | `GATE_STACK_SIZE` | coroutine stack size (decimal or `0x` hex) | `0x4000` |

use std::env;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Placeholder signature accepted in development when none is configured.
pub const DEV_SESSION_SIGNATURE: &str = "insecure-dev-signature";

const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Immutable gate configuration.
///
/// Construct with [`GateConfig::default`], [`GateConfig::from_env`] or
/// [`GateConfig::load`], then pass by reference into the components built at
/// startup. Request-time code never sees this type directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Listen address, e.g. `0.0.0.0:8080`.
    pub addr: String,
    /// Ordered public path patterns (exact, or trailing `/**` prefix).
    /// Everything else requires an authenticated session.
    pub public_paths: Vec<String>,
    /// Allowed CORS origin patterns (`*`, exact origins, or embedded-`*`
    /// patterns such as `https://*.example.com`).
    pub cors_allowed_origins: Vec<String>,
    /// Allowed CORS methods.
    pub cors_allowed_methods: Vec<String>,
    /// Allowed CORS request headers (`*` allows any).
    pub cors_allowed_headers: Vec<String>,
    /// Whether credentialed cross-origin requests are allowed.
    pub cors_allow_credentials: bool,
    /// Where unauthenticated requests to protected paths are redirected.
    pub login_path: String,
    /// Redirect target after a successful OAuth2 login.
    pub oauth2_success_url: String,
    /// Redirect target after a failed OAuth2 login.
    pub oauth2_failure_url: String,
    /// Signature expected on session tokens.
    pub session_signature: String,
    /// Name of the session cookie consulted alongside the bearer header.
    pub session_cookie: String,
    /// Coroutine stack size in bytes.
    pub stack_size: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            public_paths: vec![
                "/teams".to_string(),
                "/games".to_string(),
                "/login".to_string(),
                "/oauth2/**".to_string(),
            ],
            cors_allowed_origins: vec!["*".to_string()],
            cors_allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            cors_allowed_headers: vec!["*".to_string()],
            cors_allow_credentials: true,
            login_path: "/login".to_string(),
            oauth2_success_url: "/".to_string(),
            oauth2_failure_url: "/login?error=true".to_string(),
            session_signature: DEV_SESSION_SIGNATURE.to_string(),
            session_cookie: "gate_session".to_string(),
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl GateConfig {
    /// Defaults overlaid with any `GATE_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load configuration from an optional YAML file, then overlay the
    /// environment. This is the startup entry point used by the CLI.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a YAML config file. Unknown keys are ignored; missing keys fall
    /// back to the defaults.
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Overlay `GATE_*` environment variables onto this configuration.
    pub fn apply_env(&mut self) {
        if let Ok(addr) = env::var("GATE_ADDR") {
            self.addr = addr;
        }
        if let Some(paths) = env_list("GATE_PUBLIC_PATHS") {
            self.public_paths = paths;
        }
        if let Some(origins) = env_list("GATE_CORS_ALLOWED_ORIGINS") {
            self.cors_allowed_origins = origins;
        }
        if let Some(methods) = env_list("GATE_CORS_ALLOWED_METHODS") {
            self.cors_allowed_methods = methods;
        }
        if let Some(headers) = env_list("GATE_CORS_ALLOWED_HEADERS") {
            self.cors_allowed_headers = headers;
        }
        if let Ok(val) = env::var("GATE_CORS_ALLOW_CREDENTIALS") {
            if let Ok(flag) = val.trim().parse::<bool>() {
                self.cors_allow_credentials = flag;
            }
        }
        if let Ok(path) = env::var("GATE_LOGIN_PATH") {
            self.login_path = path;
        }
        if let Ok(url) = env::var("GATE_OAUTH2_SUCCESS_URL") {
            self.oauth2_success_url = url;
        }
        if let Ok(url) = env::var("GATE_OAUTH2_FAILURE_URL") {
            self.oauth2_failure_url = url;
        }
        if let Ok(signature) = env::var("GATE_SESSION_SIGNATURE") {
            self.session_signature = signature;
        }
        if let Ok(cookie) = env::var("GATE_SESSION_COOKIE") {
            self.session_cookie = cookie;
        }
        if let Ok(val) = env::var("GATE_STACK_SIZE") {
            if let Some(size) = parse_stack_size(&val) {
                self.stack_size = size;
            }
        }
    }

    /// True when the gate is still running with the development placeholder
    /// signature. Startup logs a warning in that case.
    pub fn uses_dev_signature(&self) -> bool {
        self.session_signature == DEV_SESSION_SIGNATURE
    }
}

fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = env::var(key).ok()?;
    let items: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Parse a stack size in decimal (`16384`) or hex (`0x4000`) notation.
fn parse_stack_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}
