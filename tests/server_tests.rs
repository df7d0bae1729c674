//! Integration tests for the full gate: HTTP in, decision out.
//!
//! Each test starts a real gate server on a random localhost port, sends raw
//! HTTP requests over a TCP socket, and asserts on the wire-level responses:
//! public pass-through, login redirects, session acceptance, CORS preflight,
//! and the OAuth2 callback redirects.

use std::net::SocketAddr;

use authgate::config::GateConfig;
use authgate::server::{AppService, HttpServer, ServerHandle};

mod common;
use common::{http, net, runtime, tokens};

const SIGNATURE: &str = "itest-signature";

/// Test fixture with automatic teardown: the server stops when the fixture
/// drops.
struct GateTestServer {
    handle: Option<ServerHandle>,
    addr: SocketAddr,
}

impl GateTestServer {
    fn start() -> Self {
        Self::start_with(|_| {})
    }

    fn start_with(customize: impl FnOnce(&mut GateConfig)) -> Self {
        runtime::setup_may_runtime();
        let port = net::free_port();
        let mut config = GateConfig::default();
        config.addr = format!("127.0.0.1:{port}");
        config.session_signature = SIGNATURE.to_string();
        customize(&mut config);

        let service = AppService::from_config(&config).expect("service must build");
        let handle = HttpServer(service)
            .start(&config.addr)
            .expect("server must start");
        handle.wait_ready().expect("server must become ready");
        let addr = config.addr.parse().expect("listen addr must parse");
        Self {
            handle: Some(handle),
            addr,
        }
    }
}

impl Drop for GateTestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[test]
fn public_paths_pass_through_without_a_session() {
    let server = GateTestServer::start();
    let res = http::get(server.addr, "/teams", &[]);
    assert_eq!(res.status, 200);
    assert!(res.header("location").is_none());
    assert!(res.body.contains("Denver Nuggets"));

    let res = http::get(server.addr, "/games", &[]);
    assert_eq!(res.status, 200);
    assert!(res.body.contains("starts_at"));
}

#[test]
fn protected_paths_redirect_anonymous_requests_to_login() {
    let server = GateTestServer::start();
    for path in ["/admin", "/", "/favorites"] {
        let res = http::get(server.addr, path, &[]);
        assert_eq!(res.status, 302, "path {path}");
        assert_eq!(res.header("location"), Some("/login"), "path {path}");
    }
}

#[test]
fn bearer_session_unlocks_protected_paths() {
    let server = GateTestServer::start();
    let token = tokens::session_token(SIGNATURE, "alice@example.com");
    let auth = format!("Bearer {token}");
    let res = http::get(server.addr, "/", &[("Authorization", &auth)]);
    assert_eq!(res.status, 200);
    assert!(res.body.contains("alice@example.com"));
}

#[test]
fn cookie_session_unlocks_protected_paths() {
    let server = GateTestServer::start();
    let token = tokens::session_token(SIGNATURE, "bob@example.com");
    let cookie = format!("gate_session={token}");
    let res = http::get(server.addr, "/", &[("Cookie", &cookie)]);
    assert_eq!(res.status, 200);
    assert!(res.body.contains("bob@example.com"));
}

#[test]
fn invalid_token_is_treated_as_anonymous() {
    let server = GateTestServer::start();
    let token = tokens::session_token("wrong-signature", "mallory@example.com");
    let auth = format!("Bearer {token}");
    let res = http::get(server.addr, "/", &[("Authorization", &auth)]);
    assert_eq!(res.status, 302);
    assert_eq!(res.header("location"), Some("/login"));
}

#[test]
fn authenticated_request_to_unknown_route_is_not_found() {
    let server = GateTestServer::start();
    let token = tokens::session_token(SIGNATURE, "alice@example.com");
    let auth = format!("Bearer {token}");
    let res = http::get(server.addr, "/no/such/route", &[("Authorization", &auth)]);
    assert_eq!(res.status, 404);
}

#[test]
fn preflight_echoes_the_requesting_origin_with_credentials() {
    let server = GateTestServer::start();
    let raw = "OPTIONS /teams HTTP/1.1\r\n\
               Host: localhost\r\n\
               Origin: http://x.com\r\n\
               Access-Control-Request-Method: GET\r\n\
               Access-Control-Request-Headers: Content-Type\r\n\
               \r\n";
    let res = http::send_request(server.addr, raw);
    assert_eq!(res.status, 204);
    // Credentialed wildcard must echo the origin, never "*".
    assert_eq!(res.header("access-control-allow-origin"), Some("http://x.com"));
    assert_eq!(res.header("access-control-allow-credentials"), Some("true"));
    assert_eq!(res.header("vary"), Some("Origin"));
    assert!(res
        .header("access-control-allow-methods")
        .is_some_and(|v| v.contains("GET")));
}

#[test]
fn preflight_with_disallowed_method_is_forbidden() {
    let server = GateTestServer::start();
    let raw = "OPTIONS /teams HTTP/1.1\r\n\
               Host: localhost\r\n\
               Origin: http://x.com\r\n\
               Access-Control-Request-Method: PATCH\r\n\
               \r\n";
    let res = http::send_request(server.addr, raw);
    assert_eq!(res.status, 403);
}

#[test]
fn preflight_respects_a_restricted_origin_list() {
    let server = GateTestServer::start_with(|config| {
        config.cors_allowed_origins = vec!["https://app.example.com".to_string()];
    });
    let raw = "OPTIONS /teams HTTP/1.1\r\n\
               Host: localhost\r\n\
               Origin: https://evil.example.com\r\n\
               Access-Control-Request-Method: GET\r\n\
               \r\n";
    let res = http::send_request(server.addr, raw);
    assert_eq!(res.status, 403);
}

#[test]
fn actual_cross_origin_responses_carry_cors_headers() {
    let server = GateTestServer::start();
    let res = http::get(server.addr, "/teams", &[("Origin", "http://x.com")]);
    assert_eq!(res.status, 200);
    assert_eq!(res.header("access-control-allow-origin"), Some("http://x.com"));
    assert_eq!(res.header("access-control-allow-credentials"), Some("true"));
}

#[test]
fn login_redirects_carry_cors_headers_for_browser_clients() {
    let server = GateTestServer::start();
    let res = http::get(server.addr, "/admin", &[("Origin", "http://x.com")]);
    assert_eq!(res.status, 302);
    assert_eq!(res.header("location"), Some("/login"));
    assert_eq!(res.header("access-control-allow-origin"), Some("http://x.com"));
}

#[test]
fn oauth2_callback_success_redirects_to_the_success_url() {
    let server = GateTestServer::start();
    let res = http::get(server.addr, "/oauth2/callback?code=abc123", &[]);
    assert_eq!(res.status, 302);
    assert_eq!(res.header("location"), Some("/"));
}

#[test]
fn oauth2_callback_failure_redirects_to_the_failure_url() {
    let server = GateTestServer::start();
    let res = http::get(server.addr, "/oauth2/callback?error=access_denied", &[]);
    assert_eq!(res.status, 302);
    assert_eq!(res.header("location"), Some("/login?error=true"));

    // Missing authorization code counts as failure too.
    let res = http::get(server.addr, "/oauth2/callback", &[]);
    assert_eq!(res.status, 302);
    assert_eq!(res.header("location"), Some("/login?error=true"));
}

#[test]
fn login_page_is_public_and_reports_failed_attempts() {
    let server = GateTestServer::start();
    let res = http::get(server.addr, "/login", &[]);
    assert_eq!(res.status, 200);
    assert!(res.body.contains("\"failed\":false"));

    let res = http::get(server.addr, "/login?error=true", &[]);
    assert_eq!(res.status, 200);
    assert!(res.body.contains("\"failed\":true"));
}

#[test]
fn health_endpoint_bypasses_the_gate() {
    let server = GateTestServer::start();
    let res = http::get(server.addr, "/health", &[]);
    assert_eq!(res.status, 200);
    assert!(res.body.contains("\"status\":\"ok\""));
}

#[test]
fn metrics_endpoint_reports_gate_counters() {
    let server = GateTestServer::start();
    let _ = http::get(server.addr, "/teams", &[]);
    let _ = http::get(server.addr, "/admin", &[]);
    let res = http::get(server.addr, "/metrics", &[]);
    assert_eq!(res.status, 200);
    assert!(res.body.contains("authgate_requests_total"));
    assert!(res.body.contains("authgate_login_redirects_total 1"));
}

#[test]
fn custom_public_paths_are_honored() {
    let server = GateTestServer::start_with(|config| {
        config.public_paths = vec!["/login".to_string(), "/oauth2/**".to_string()];
    });
    // /teams is no longer public.
    let res = http::get(server.addr, "/teams", &[]);
    assert_eq!(res.status, 302);
    assert_eq!(res.header("location"), Some("/login"));

    let token = tokens::session_token(SIGNATURE, "alice@example.com");
    let auth = format!("Bearer {token}");
    let res = http::get(server.addr, "/teams", &[("Authorization", &auth)]);
    assert_eq!(res.status, 200);
}
