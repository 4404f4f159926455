//! Handler for `GET /history/predict`.

use axum::extract::State;
use axum::Json;
use banamon_core::error::CoreError;
use banamon_db::models::prediction::PredictionRecord;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extract::ApiQuery;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Largest page a caller may request.
pub const MAX_HISTORY_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Return at most this many records. Omitted means all.
    pub limit: Option<i64>,
}

/// GET /history/predict
///
/// The caller's prediction records, newest first. Never includes records
/// owned by anyone else; an empty history is an empty list.
pub async fn list_predictions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiQuery(params): ApiQuery<HistoryParams>,
) -> AppResult<Json<DataResponse<Vec<PredictionRecord>>>> {
    if let Some(limit) = params.limit {
        if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "limit must be between 1 and {MAX_HISTORY_LIMIT}"
            ))));
        }
    }

    let records = state
        .history
        .list_for_user(auth_user.user_id, params.limit)
        .await?;
    tracing::debug!(user_id = auth_user.user_id, count = records.len(), "Listed history");

    Ok(Json(DataResponse { data: records }))
}
