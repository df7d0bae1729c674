use super::{token, SecurityRequest, Session, SessionProvider};

/// Session provider reading the session token from a cookie.
///
/// Same token format as [`super::BearerSessionProvider`]; the cookie name is
/// configurable (`gate_session` by default) so browser clients that cannot
/// set an `Authorization` header still authenticate.
pub struct CookieSessionProvider {
    signature: String,
    cookie_name: String,
}

impl CookieSessionProvider {
    pub fn new(signature: impl Into<String>, cookie_name: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            cookie_name: cookie_name.into(),
        }
    }
}

impl SessionProvider for CookieSessionProvider {
    fn authenticate(&self, req: &SecurityRequest) -> Option<Session> {
        let token = req.get_cookie(&self.cookie_name)?;
        token::decode_session(token, &self.signature)
    }
}
