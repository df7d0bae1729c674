//! Tests for the access decision gate.

use authgate::gate::{AccessGate, Decision};
use authgate::rules::RuleSet;
use authgate::security::Session;

fn gate() -> AccessGate {
    AccessGate::new(RuleSet::public_paths([
        "/teams",
        "/games",
        "/login",
        "/oauth2/**",
    ]))
}

fn authenticated() -> Session {
    Session::authenticated(Some("alice@example.com".to_string()))
}

#[test]
fn public_paths_allow_any_session() {
    let gate = gate();
    for path in ["/teams", "/games", "/login", "/oauth2/callback"] {
        assert_eq!(gate.decide(path, None), Decision::Allow, "path {path}");
        assert_eq!(
            gate.decide(path, Some(&authenticated())),
            Decision::Allow,
            "path {path}"
        );
    }
}

#[test]
fn protected_paths_redirect_anonymous_requests() {
    let gate = gate();
    for path in ["/", "/admin", "/favorites", "/teams/1"] {
        assert_eq!(gate.decide(path, None), Decision::RedirectLogin, "path {path}");
    }
}

#[test]
fn protected_paths_allow_authenticated_sessions() {
    let gate = gate();
    let session = authenticated();
    for path in ["/", "/admin", "/favorites"] {
        assert_eq!(gate.decide(path, Some(&session)), Decision::Allow, "path {path}");
    }
}

#[test]
fn unauthenticated_session_object_still_redirects() {
    let gate = gate();
    let session = Session {
        authenticated: false,
        identity: None,
    };
    assert_eq!(gate.decide("/admin", Some(&session)), Decision::RedirectLogin);
}

#[test]
fn decisions_are_idempotent() {
    let gate = gate();
    let session = authenticated();
    for _ in 0..3 {
        assert_eq!(gate.decide("/admin", None), Decision::RedirectLogin);
        assert_eq!(gate.decide("/admin", Some(&session)), Decision::Allow);
        assert_eq!(gate.decide("/teams", None), Decision::Allow);
    }
}
