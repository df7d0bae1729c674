//! The gate service: the full per-request control flow.
//!
//! Every inbound request passes through, in order: request parsing →
//! infrastructure endpoints (`/health`, `/metrics`) → CORS preflight
//! handling → session authentication → the access decision gate → routing
//! and coroutine dispatch. Requests the gate turns away never reach the
//! router.

use std::io;
use std::sync::Arc;

use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use tracing::{info, warn};

use super::request::{parse_request, ParsedRequest};
use super::response::{push_header, write_handler_response, write_json, write_text};
use crate::config::GateConfig;
use crate::dispatcher::{Dispatcher, HandlerResponse};
use crate::gate::{AccessGate, Decision};
use crate::handlers;
use crate::ids::RequestId;
use crate::login::{LoginRedirector, RedirectTargets};
use crate::middleware::{
    CorsMiddleware, CorsPolicy, MetricsMiddleware, Middleware, TracingMiddleware,
};
use crate::router::Router;
use crate::rules::RuleSet;
use crate::security::{
    BearerSessionProvider, CookieSessionProvider, SecurityRequest, SessionProvider,
};

/// The HTTP service wiring gate, CORS policy, session providers, router and
/// dispatcher together. Cheap to clone — everything request-relevant is
/// behind an `Arc` and immutable after startup.
#[derive(Clone)]
pub struct AppService {
    router: Arc<Router>,
    dispatcher: Arc<Dispatcher>,
    gate: Arc<AccessGate>,
    cors: Arc<CorsPolicy>,
    session_providers: Arc<Vec<Arc<dyn SessionProvider>>>,
    login_path: String,
    metrics: Arc<MetricsMiddleware>,
}

impl AppService {
    /// Assemble a service from explicitly constructed parts.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        router: Arc<Router>,
        dispatcher: Arc<Dispatcher>,
        gate: Arc<AccessGate>,
        cors: Arc<CorsPolicy>,
        session_providers: Vec<Arc<dyn SessionProvider>>,
        login_path: String,
        metrics: Arc<MetricsMiddleware>,
    ) -> Self {
        Self {
            router,
            dispatcher,
            gate,
            cors,
            session_providers: Arc::new(session_providers),
            login_path,
            metrics,
        }
    }

    /// Build the default gate service for a configuration: public-path rules,
    /// CORS policy, bearer + cookie session providers, the default
    /// application handlers, and the tracing/metrics/CORS middleware chain.
    pub fn from_config(config: &GateConfig) -> anyhow::Result<Self> {
        let gate = Arc::new(AccessGate::new(RuleSet::public_paths(&config.public_paths)));
        let cors = Arc::new(CorsPolicy::from_config(config)?);
        let metrics = Arc::new(MetricsMiddleware::new());
        let redirector = Arc::new(LoginRedirector::new(RedirectTargets::from_config(config)));

        let mut dispatcher = Dispatcher::new(config.stack_size);
        dispatcher.add_middleware(Arc::new(TracingMiddleware));
        let metrics_mw: Arc<dyn Middleware> = metrics.clone();
        dispatcher.add_middleware(metrics_mw);
        dispatcher.add_middleware(Arc::new(CorsMiddleware::new(Arc::clone(&cors))));

        // SAFETY: handler registration spawns coroutines; callers construct
        // the service at startup after configuring the may runtime, and every
        // built-in handler replies exactly once.
        unsafe {
            handlers::register_default_handlers(&mut dispatcher, Arc::clone(&redirector));
        }

        let router = Arc::new(Router::new(handlers::default_routes()));
        let session_providers: Vec<Arc<dyn SessionProvider>> = vec![
            Arc::new(BearerSessionProvider::new(config.session_signature.clone())),
            Arc::new(CookieSessionProvider::new(
                config.session_signature.clone(),
                config.session_cookie.clone(),
            )),
        ];

        Ok(Self::new(
            router,
            Arc::new(dispatcher),
            gate,
            cors,
            session_providers,
            config.login_path.clone(),
            metrics,
        ))
    }

    pub fn metrics(&self) -> &Arc<MetricsMiddleware> {
        &self.metrics
    }

    /// Answer a CORS preflight. Invalid origins and disallowed methods or
    /// headers get 403; a missing `Access-Control-Request-Method` means this
    /// is a plain OPTIONS request, answered 200 without CORS headers.
    fn handle_preflight(
        &self,
        parsed: &ParsedRequest,
        origin: &str,
        res: &mut Response,
    ) -> io::Result<()> {
        let requested_method = match parsed.get_header("access-control-request-method") {
            Some(raw) => match raw.parse::<Method>() {
                Ok(method) => method,
                Err(_) => {
                    self.metrics.inc_denied_request();
                    write_json(res, 400, json!({ "error": "Malformed preflight request" }));
                    return Ok(());
                }
            },
            None => {
                res.status_code(200, "OK");
                res.body_vec(Vec::new());
                return Ok(());
            }
        };
        let requested_headers = parsed.get_header("access-control-request-headers");

        let decision = self
            .cors
            .evaluate(origin, &requested_method, requested_headers);
        if !decision.allow {
            warn!(origin = %origin, method = %requested_method, "CORS preflight rejected");
            write_json(res, 403, json!({ "error": "Origin not allowed" }));
            return Ok(());
        }

        res.status_code(204, "No Content");
        if let Some(allowed_origin) = &decision.allowed_origin {
            push_header(res, "Access-Control-Allow-Origin", allowed_origin);
        }
        push_header(res, "Access-Control-Allow-Methods", &decision.allowed_methods);
        push_header(res, "Access-Control-Allow-Headers", &decision.allowed_headers);
        if decision.allow_credentials {
            res.header("Access-Control-Allow-Credentials: true");
        }
        if let Some(max_age) = self.cors.max_age() {
            push_header(res, "Access-Control-Max-Age", &max_age.to_string());
        }
        if decision.vary_origin {
            res.header("Vary: Origin");
        }
        res.body_vec(Vec::new());
        Ok(())
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req);
        let request_id = RequestId::from_header_or_new(parsed.get_header("x-request-id"));

        if parsed.path.is_empty() || !parsed.path.starts_with('/') {
            self.metrics.inc_denied_request();
            write_json(res, 400, json!({ "error": "Malformed request path" }));
            return Ok(());
        }
        let method = match parsed.method.parse::<Method>() {
            Ok(method) => method,
            Err(_) => {
                self.metrics.inc_denied_request();
                write_json(res, 400, json!({ "error": "Malformed request method" }));
                return Ok(());
            }
        };

        if method == Method::GET && parsed.path == "/health" {
            self.metrics.inc_top_level_request();
            write_json(res, 200, json!({ "status": "ok" }));
            return Ok(());
        }
        if method == Method::GET && parsed.path == "/metrics" {
            self.metrics.inc_top_level_request();
            write_text(res, 200, self.metrics.render());
            return Ok(());
        }

        let origin = parsed.get_header("origin").map(str::to_string);

        if method == Method::OPTIONS {
            self.metrics.inc_top_level_request();
            return match &origin {
                Some(origin) => self.handle_preflight(&parsed, origin, res),
                None => {
                    res.status_code(200, "OK");
                    res.body_vec(Vec::new());
                    Ok(())
                }
            };
        }

        let security_req = SecurityRequest {
            headers: &parsed.headers,
            query: &parsed.query_params,
            cookies: &parsed.cookies,
        };
        let session = self
            .session_providers
            .iter()
            .find_map(|p| p.authenticate(&security_req));

        match self.gate.decide(&parsed.path, session.as_ref()) {
            Decision::RedirectLogin => {
                self.metrics.inc_login_redirect();
                info!(
                    request_id = %request_id,
                    path = %parsed.path,
                    "Redirecting unauthenticated request to login"
                );
                let mut response = HandlerResponse::redirect(&self.login_path);
                if let Some(origin) = &origin {
                    self.cors.decorate(origin, &method, &mut response);
                }
                write_handler_response(res, &response);
                Ok(())
            }
            Decision::Deny => {
                self.metrics.inc_denied_request();
                write_json(res, 400, json!({ "error": "Bad Request" }));
                Ok(())
            }
            Decision::Allow => {
                let route = match self.router.route(&method, &parsed.path) {
                    Some(route) => route,
                    None => {
                        let mut response = HandlerResponse::error(404, "Not Found");
                        if let Some(origin) = &origin {
                            self.cors.decorate(origin, &method, &mut response);
                        }
                        write_handler_response(res, &response);
                        return Ok(());
                    }
                };
                let dispatched = self.dispatcher.dispatch(
                    route,
                    request_id,
                    parsed.path.clone(),
                    parsed.query_params,
                    parsed.headers,
                    parsed.cookies,
                    parsed.body,
                    session,
                );
                match dispatched {
                    Some(hr) => write_handler_response(res, &hr),
                    None => write_json(
                        res,
                        500,
                        json!({ "error": "Handler failed or not registered", "path": parsed.path }),
                    ),
                }
                Ok(())
            }
        }
    }
}
