//! HTTP route handlers.

use axum::Router;

use crate::state::AppState;

pub mod chat;

/// Build the application router.
pub fn routes() -> Router<AppState> {
    Router::new().merge(chat::router())
}
