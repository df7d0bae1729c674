use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;
use tracing::debug;

use super::Session;

/// Validate a `header.payload.signature` session token and build the session
/// it represents.
///
/// The signature part must equal `signature`; the payload must decode as
/// base64 JSON. The subject identity is read from the payload's `sub` field.
pub(crate) fn decode_session(token: &str, signature: &str) -> Option<Session> {
    let mut parts = token.split('.');
    let header = parts.next();
    let payload = parts.next();
    let sig = parts.next();
    if header.is_none() || sig != Some(signature) {
        debug!("Session token rejected: malformed token or signature mismatch");
        return None;
    }
    let payload_bytes = match general_purpose::STANDARD.decode(payload?) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = ?e, "Session token rejected: invalid base64 payload");
            return None;
        }
    };
    let json: Value = match serde_json::from_slice(&payload_bytes) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = ?e, "Session token rejected: invalid JSON payload");
            return None;
        }
    };
    let identity = json
        .get("sub")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    Some(Session::authenticated(identity))
}
