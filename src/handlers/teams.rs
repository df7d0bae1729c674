use serde_json::json;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// `GET /teams` — public team listing.
pub fn list_teams(req: HandlerRequest) {
    let teams = json!([
        { "id": 1, "name": "Denver Nuggets", "city": "Denver" },
        { "id": 2, "name": "Boston Celtics", "city": "Boston" },
        { "id": 3, "name": "Golden State Warriors", "city": "San Francisco" },
        { "id": 4, "name": "Milwaukee Bucks", "city": "Milwaukee" }
    ]);
    let _ = req.reply_tx.send(HandlerResponse::json(200, teams));
}
