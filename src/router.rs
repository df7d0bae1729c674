//! Handler routing for allowed requests.
//!
//! A [`Router`] is a startup-built table mapping (method, path pattern) to a
//! handler name. Patterns reuse the gate's [`PathPattern`] grammar — exact
//! paths or trailing-`/**` prefixes — and the first matching route wins.
//! Routing happens after the access decision: the gate decides whether a
//! request may pass, the router decides who handles it.

use http::Method;
use tracing::{debug, info};

use crate::rules::PathPattern;

/// One route: method + pattern + the handler that serves it.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: PathPattern,
    pub handler_name: String,
}

impl Route {
    pub fn new(method: Method, pattern: &str, handler_name: &str) -> Self {
        Self {
            method,
            pattern: PathPattern::parse(pattern),
            handler_name: handler_name.to_string(),
        }
    }
}

/// Ordered route table, immutable after startup.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new(routes: Vec<Route>) -> Self {
        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|r| format!("{} {} -> {}", r.method, r.pattern, r.handler_name))
            .collect();
        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );
        Self { routes }
    }

    /// Match a request to a route. `None` means 404.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<&Route> {
        let found = self
            .routes
            .iter()
            .find(|r| &r.method == method && r.pattern.matches(path));
        match found {
            Some(route) => {
                debug!(method = %method, path = %path, handler = %route.handler_name, "Route matched");
            }
            None => {
                debug!(method = %method, path = %path, "No route matched");
            }
        }
        found
    }

    /// Print the route table to stdout (used by the `routes` CLI command).
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for route in &self.routes {
            println!("[route] {} {} -> {}", route.method, route.pattern, route.handler_name);
        }
    }
}
