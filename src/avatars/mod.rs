use crate::state::AppState;
use axum::Router;

pub mod handlers;
mod service;

pub fn router() -> Router<AppState> {
    handlers::avatar_routes()
}
