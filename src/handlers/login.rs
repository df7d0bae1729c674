use serde_json::json;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// `GET /login` — public login page. The actual login happens at the
/// external identity provider; this page tells clients where the flow
/// completes. An `error=true` query parameter marks a failed attempt.
pub fn login_page(req: HandlerRequest) {
    let failed = req.get_query_param("error").is_some();
    let body = json!({
        "login_required": true,
        "failed": failed,
        "callback": "/oauth2/callback",
    });
    let _ = req.reply_tx.send(HandlerResponse::json(200, body));
}
