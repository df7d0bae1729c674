use serde_json::json;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// `GET /` — authenticated landing page, reflects the session identity.
pub fn home(req: HandlerRequest) {
    let identity = req
        .session
        .as_ref()
        .and_then(|s| s.identity.as_deref())
        .unwrap_or("unknown");
    let body = json!({ "message": "welcome", "identity": identity });
    let _ = req.reply_tx.send(HandlerResponse::json(200, body));
}
