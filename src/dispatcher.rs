//! Coroutine-based request dispatch.
//!
//! Allowed requests are handed to named handler coroutines over MPSC
//! channels. Each handler runs in its own `may` coroutine, isolated with
//! panic recovery so one failing handler cannot take the server down. An
//! ordered middleware chain observes every dispatched request before and
//! after its handler runs.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use may::coroutine;
use may::sync::mpsc;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::{debug, error, info, warn};

use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::router::Route;
use crate::security::Session;

/// Maximum inline headers/cookies before heap allocation. Most requests stay
/// under this, keeping the request path allocation-free.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Maximum inline query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated header/cookie storage. Names use `Arc<str>` — they repeat
/// across requests, and cloning an `Arc` beats copying the string.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Stack-allocated query parameter storage.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Request data passed to a handler coroutine.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Request path (query string stripped).
    pub path: String,
    /// Name of the handler processing this request.
    pub handler_name: String,
    /// Query string parameters.
    pub query_params: ParamVec,
    /// HTTP headers (lowercase names).
    pub headers: HeaderVec,
    /// Cookies parsed from the Cookie header.
    pub cookies: HeaderVec,
    /// Request body parsed as JSON, if present.
    pub body: Option<Value>,
    /// Session established by the gate's providers, if the request carried
    /// valid credentials. Public-path handlers may see `None`.
    pub session: Option<Session>,
    /// Channel for sending the response back to the dispatcher.
    pub reply_tx: mpsc::Sender<HandlerResponse>,
}

impl HandlerRequest {
    /// Get a header by name (case-insensitive).
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name. Last occurrence wins for duplicates.
    #[inline]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a cookie by name.
    #[inline]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Response data sent back from a handler coroutine.
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Value,
}

impl HandlerResponse {
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A JSON response with the content type preset.
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// An error response with a JSON `{"error": ...}` body.
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// A 302 redirect to `location` with an empty body.
    pub fn redirect(location: &str) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("location"), location.to_string()));
        Self {
            status: 302,
            headers,
            body: Value::Null,
        }
    }

    /// Get a header by name (case-insensitive).
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Channel sender that delivers requests to one handler coroutine.
pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Dispatcher routing allowed requests to registered handler coroutines
/// through the middleware chain.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: HashMap<String, HandlerSender>,
    middlewares: Vec<Arc<dyn Middleware>>,
    stack_size: usize,
}

impl Dispatcher {
    /// Create an empty dispatcher. `stack_size` is used for every handler
    /// coroutine spawned through [`Dispatcher::register_handler`].
    pub fn new(stack_size: usize) -> Self {
        Self {
            handlers: HashMap::new(),
            middlewares: Vec::new(),
            stack_size,
        }
    }

    /// Add middleware to the chain. `before` hooks run in registration
    /// order, `after` hooks run for every dispatched request.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Registered handler names, for startup diagnostics.
    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Register a handler coroutine under `name`.
    ///
    /// Spawns a coroutine that drains the handler's channel. Panics inside
    /// the handler are caught and converted to 500 responses; replacing an
    /// existing handler drops its sender, which closes the old channel and
    /// lets the old coroutine exit.
    ///
    /// # Safety
    ///
    /// `may::coroutine::Builder::spawn` is unsafe by the runtime's contract.
    /// The caller must ensure the may runtime is initialized (stack size
    /// configured) before registration, and that the handler sends exactly
    /// one response per request.
    pub unsafe fn register_handler<F>(&mut self, name: &str, handler_fn: F)
    where
        F: Fn(HandlerRequest) + Send + 'static + Clone,
    {
        let (tx, rx) = mpsc::channel::<HandlerRequest>();
        let name = name.to_string();
        let coroutine_name = name.clone();

        if let Some(old_sender) = self.handlers.remove(&name) {
            drop(old_sender);
            warn!(handler_name = %name, "Replaced existing handler, old coroutine will exit");
        }

        let spawn_result = coroutine::Builder::new()
            .stack_size(self.stack_size)
            .spawn(move || {
                debug!(handler_name = %coroutine_name, "Handler coroutine started");
                for req in rx.iter() {
                    let reply_tx = req.reply_tx.clone();
                    let request_id = req.request_id;
                    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| {
                        handler_fn(req);
                    })) {
                        error!(
                            request_id = %request_id,
                            handler_name = %coroutine_name,
                            panic_message = ?panic,
                            "Handler panicked"
                        );
                        let _ = reply_tx.send(HandlerResponse::error(500, "handler panicked"));
                    }
                }
            });

        match spawn_result {
            Ok(_) => {
                info!(
                    handler_name = %name,
                    total_handlers = self.handlers.len() + 1,
                    "Handler registered"
                );
                self.handlers.insert(name, tx);
            }
            Err(e) => {
                // Leave the handler unregistered; dispatch will answer 503.
                error!(handler_name = %name, error = %e, "Failed to spawn handler coroutine");
            }
        }
    }

    /// Dispatch a request to the handler named by `route` and wait for its
    /// response.
    ///
    /// Runs the middleware `before` chain first — the first middleware to
    /// return a response short-circuits the handler. `after` hooks always run
    /// on the final response. Returns `None` when no handler is registered
    /// for the route.
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch(
        &self,
        route: &Route,
        request_id: RequestId,
        path: String,
        query_params: ParamVec,
        headers: HeaderVec,
        cookies: HeaderVec,
        body: Option<Value>,
        session: Option<Session>,
    ) -> Option<HandlerResponse> {
        let tx = match self.handlers.get(&route.handler_name) {
            Some(tx) => tx,
            None => {
                error!(
                    handler_name = %route.handler_name,
                    available_handlers = ?self.handler_names(),
                    "Handler not registered"
                );
                return None;
            }
        };

        let (reply_tx, reply_rx) = mpsc::channel();
        let request = HandlerRequest {
            request_id,
            method: route.method.clone(),
            path,
            handler_name: route.handler_name.clone(),
            query_params,
            headers,
            cookies,
            body,
            session,
            reply_tx,
        };

        let mut early_resp: Option<HandlerResponse> = None;
        for mw in &self.middlewares {
            if early_resp.is_none() {
                early_resp = mw.before(&request);
            } else {
                mw.before(&request);
            }
        }

        let (mut resp, latency) = if let Some(r) = early_resp {
            debug!(request_id = %request_id, "Middleware returned early response");
            (r, Duration::from_millis(0))
        } else {
            let start = Instant::now();
            if let Err(e) = tx.send(request.clone()) {
                error!(
                    request_id = %request_id,
                    handler_name = %request.handler_name,
                    error = %e,
                    "Failed to send request to handler"
                );
                return None;
            }
            match reply_rx.recv() {
                Ok(response) => {
                    let latency = start.elapsed();
                    debug!(
                        request_id = %request_id,
                        handler_name = %request.handler_name,
                        status = response.status,
                        latency_ms = latency.as_millis() as u64,
                        "Handler response received"
                    );
                    (response, latency)
                }
                Err(e) => {
                    error!(
                        request_id = %request_id,
                        handler_name = %request.handler_name,
                        error = %e,
                        "Handler channel closed, handler may have crashed"
                    );
                    return Some(HandlerResponse::error(503, "handler not responding"));
                }
            }
        };

        for mw in &self.middlewares {
            mw.after(&request, &mut resp, latency);
        }

        Some(resp)
    }
}
