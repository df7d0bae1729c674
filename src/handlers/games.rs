use serde_json::json;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// `GET /games` — public upcoming games listing.
pub fn list_games(req: HandlerRequest) {
    let games = json!([
        { "id": 101, "home": "Denver Nuggets", "away": "Boston Celtics", "starts_at": "2026-01-12T19:00:00Z" },
        { "id": 102, "home": "Golden State Warriors", "away": "Milwaukee Bucks", "starts_at": "2026-01-13T19:30:00Z" }
    ]);
    let _ = req.reply_tx.send(HandlerResponse::json(200, games));
}
