use axum::routing::get;
use axum::Router;

use crate::handlers::history;
use crate::state::AppState;

/// Routes mounted at `/history`.
///
/// ```text
/// GET /predict?limit=N  -> list_predictions (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/predict", get(history::list_predictions))
}
