//! # Security Module
//!
//! Authentication state for the gate: a request either carries a valid
//! session token or it does not. [`SessionProvider`] implementations extract
//! and validate credentials from the request; the server asks each configured
//! provider in order and the first one to produce a [`Session`] wins.
//!
//! Two providers are built in:
//! - [`BearerSessionProvider`] — `Authorization: Bearer {token}` header
//! - [`CookieSessionProvider`] — a configurable session cookie
//!
//! Both validate the same token format: `header.payload.signature`, where the
//! signature part must equal the configured signature string and the payload
//! is base64-encoded JSON carrying the subject identity in `sub`. Token
//! issuance and expiry live with the external OAuth2 integration; the gate
//! only verifies what a request presents.
//!
//! Invalid or missing credentials never produce an error — they produce no
//! session, which the gate turns into a login redirect for protected paths.

use crate::dispatcher::{HeaderVec, ParamVec};

/// Authentication state attached to a request once a provider accepts its
/// credentials. Absence of a `Session` means the request is anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    /// Subject identity from the validated token, when the token carries one.
    pub identity: Option<String>,
}

impl Session {
    /// An authenticated session for the given identity.
    pub fn authenticated(identity: Option<String>) -> Self {
        Self {
            authenticated: true,
            identity,
        }
    }
}

/// Read-only view of the request parts a provider may consult.
///
/// Borrows the server's parsed header/cookie/query storage; providers never
/// copy request data to validate it.
pub struct SecurityRequest<'a> {
    pub headers: &'a HeaderVec,
    pub query: &'a ParamVec,
    pub cookies: &'a HeaderVec,
}

impl<'a> SecurityRequest<'a> {
    /// Get a header by name (case-insensitive).
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name.
    #[inline]
    pub fn get_query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k.as_ref() == name)
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

/// Trait for extracting and validating a session from request credentials.
pub trait SessionProvider: Send + Sync {
    /// Return the session this request's credentials establish, or `None`
    /// when the credentials are missing or invalid.
    fn authenticate(&self, req: &SecurityRequest) -> Option<Session>;
}

pub use bearer::BearerSessionProvider;
pub use cookie::CookieSessionProvider;

mod bearer;
mod cookie;
mod token;
