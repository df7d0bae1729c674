//! # Authgate
//!
//! **Authgate** is an HTTP request-authorization gate built on the `may`
//! coroutine runtime: path-rule access control, CORS preflight handling, and
//! OAuth2 login redirection in front of a dispatched application.
//!
//! ## Overview
//!
//! The gate reproduces the externally observable behavior of a web
//! framework's security filter chain. An ordered allow-list of path patterns
//! marks public endpoints; every other path requires an authenticated
//! session. Unauthenticated requests to protected paths are redirected to
//! the login flow, whose completion (performed by an external OAuth2
//! provider) lands on the callback endpoint and is redirected to the
//! configured success or failure URL.
//!
//! ## Architecture
//!
//! - **[`config`]** - immutable startup configuration (defaults, YAML, env)
//! - **[`rules`]** - ordered path-pattern access rules, first match wins
//! - **[`gate`]** - the access decision: allow, redirect to login, or deny
//! - **[`security`]** - session providers validating bearer/cookie tokens
//! - **[`login`]** - OAuth2 login outcome → redirect URL
//! - **[`middleware`]** - CORS policy/evaluation, metrics, tracing
//! - **[`router`]** - route table for allowed requests
//! - **[`dispatcher`]** - coroutine-based handler dispatch over channels
//! - **[`server`]** - `may_minihttp` service wiring the whole flow together
//! - **[`handlers`]** - built-in application endpoints behind the gate
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService
//!     participant Cors as CorsPolicy
//!     participant Gate as AccessGate
//!     participant Router
//!     participant Handler as Handler (coroutine)
//!
//!     Client->>Server: HTTP request
//!     Server->>Server: parse (headers, cookies, query)
//!     alt OPTIONS preflight
//!         Server->>Cors: evaluate(origin, method, headers)
//!         Cors-->>Client: 204 + Access-Control-* / 403
//!     end
//!     Server->>Gate: decide(path, session)
//!     alt public path or authenticated
//!         Gate-->>Server: Allow
//!         Server->>Router: route(method, path)
//!         Router->>Handler: dispatch via channel
//!         Handler-->>Client: response (+ CORS headers)
//!     else protected, no session
//!         Gate-->>Client: 302 Location: /login
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use authgate::config::GateConfig;
//! use authgate::server::{AppService, HttpServer};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = GateConfig::from_env();
//!     may::config().set_stack_size(config.stack_size);
//!     let service = AppService::from_config(&config)?;
//!     let handle = HttpServer(service).start(&config.addr)?;
//!     handle.join().ok();
//!     Ok(())
//! }
//! ```
//!
//! ## Runtime Considerations
//!
//! Authgate uses the `may` coroutine runtime, not tokio. Handlers run in
//! coroutines with a configurable stack size (`GATE_STACK_SIZE`); blocking
//! operations inside handlers should use `may`'s facilities. All gate state
//! — rules, CORS policy, route table — is built once at startup and shared
//! read-only, so the decision path takes no locks.

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod gate;
pub mod handlers;
pub mod ids;
pub mod login;
pub mod middleware;
pub mod router;
pub mod rules;
pub mod security;
pub mod server;

pub use config::GateConfig;
pub use gate::{AccessGate, Decision};
pub use login::{LoginRedirector, RedirectTargets};
pub use middleware::{CorsDecision, CorsPolicy};
pub use rules::{AccessRule, PathPattern, RuleSet};
pub use security::{
    BearerSessionProvider, CookieSessionProvider, SecurityRequest, Session, SessionProvider,
};
