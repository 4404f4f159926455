pub mod auth;
pub mod health;
pub mod history;
pub mod predict;

use axum::Router;

use crate::state::AppState;

/// Build the route tree.
///
/// ```text
/// /                       service info (public)
/// /health                 readiness (public)
///
/// /auth/register          register (public)
/// /auth/login             login (public)
/// /auth/refresh           refresh (public)
/// /auth/me                current user (requires auth)
///
/// /predict                classify an uploaded image (requires auth)
/// /history/predict        caller's prediction history (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/auth", auth::router())
        .merge(predict::router())
        .nest("/history", history::router())
}
