use tracing::warn;

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::login::LoginRedirector;

/// `GET /oauth2/callback` — completion of the external OAuth2 handshake.
///
/// An authorization `code` without an `error` parameter counts as success;
/// anything else is a failed login. Either way the response is a redirect —
/// the token exchange itself belongs to the provider integration, not the
/// gate.
pub fn oauth2_callback(redirector: &LoginRedirector, req: HandlerRequest) {
    let error = req.get_query_param("error");
    let code = req.get_query_param("code");
    let success = error.is_none() && code.is_some();
    if let Some(error) = error {
        warn!(request_id = %req.request_id, error = %error, "OAuth2 provider reported an error");
    } else if code.is_none() {
        warn!(request_id = %req.request_id, "OAuth2 callback missing authorization code");
    }
    let location = redirector.notify_login_outcome(success);
    let _ = req.reply_tx.send(HandlerResponse::redirect(&location));
}
