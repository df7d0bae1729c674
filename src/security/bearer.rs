use tracing::debug;

use super::{token, SecurityRequest, Session, SessionProvider};

/// Session provider reading `Authorization: Bearer {token}`.
///
/// Tokens have the form `header.payload.signature` — the signature part must
/// match the configured signature and the payload section carries the
/// subject identity. Suitable for development and internal deployments with a
/// pre-shared signature; production token validation belongs to the external
/// identity-provider integration.
pub struct BearerSessionProvider {
    signature: String,
}

impl BearerSessionProvider {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
        }
    }
}

impl SessionProvider for BearerSessionProvider {
    fn authenticate(&self, req: &SecurityRequest) -> Option<Session> {
        let token = req
            .get_header("authorization")
            .and_then(|h| h.strip_prefix("Bearer "))?;
        let session = token::decode_session(token, &self.signature);
        if session.is_none() {
            debug!("Bearer authentication failed: invalid token");
        }
        session
    }
}
