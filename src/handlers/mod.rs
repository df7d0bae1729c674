//! Built-in application handlers.
//!
//! The minimal downstream application the gate fronts: public team and game
//! listings, a login page, the OAuth2 callback, and an authenticated home
//! page. Each handler is a plain function taking a `HandlerRequest` and
//! replying exactly once on its channel.

mod games;
mod home;
mod login;
mod oauth2_callback;
mod teams;

use std::sync::Arc;

use http::Method;

use crate::dispatcher::Dispatcher;
use crate::login::LoginRedirector;
use crate::router::Route;

/// The route table for the built-in handlers.
pub fn default_routes() -> Vec<Route> {
    vec![
        Route::new(Method::GET, "/teams", "list_teams"),
        Route::new(Method::GET, "/games", "list_games"),
        Route::new(Method::GET, "/login", "login_page"),
        Route::new(Method::GET, "/oauth2/callback", "oauth2_callback"),
        Route::new(Method::GET, "/", "home"),
    ]
}

/// Register the built-in handlers with the dispatcher.
///
/// # Safety
///
/// Spawns handler coroutines; see [`Dispatcher::register_handler`]. Call at
/// startup, after the may runtime is configured.
pub unsafe fn register_default_handlers(
    dispatcher: &mut Dispatcher,
    redirector: Arc<LoginRedirector>,
) {
    dispatcher.register_handler("list_teams", teams::list_teams);
    dispatcher.register_handler("list_games", games::list_games);
    dispatcher.register_handler("login_page", login::login_page);
    dispatcher.register_handler("home", home::home);
    dispatcher.register_handler("oauth2_callback", move |req| {
        oauth2_callback::oauth2_callback(&redirector, req)
    });
}
