use axum::extract::{RawQuery, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate;
use crate::models::{RollupResult, ViewRequest};

/// `GET /api/leaderboard`
///
/// Serves every tier plus the filter enumeration, selected by `view`. Rollup
/// views answer with a bare array of rows; `view=filters` answers with
/// `{products, gameTypes}`.
pub async fn leaderboard(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let request = ViewRequest::from_query_string(query.as_deref().unwrap_or_default())?;
    tracing::debug!(view = request.view_name(), "Leaderboard query");

    let store = state.store.clone();
    let response = tokio::task::spawn_blocking(move || match request {
        ViewRequest::Rollup(scope) => calculate::aggregate(store.as_ref(), &scope).map(|result| {
            match result {
                RollupResult::Companies(rows) => Json(rows).into_response(),
                RollupResult::CompanyDetail(rows) => Json(rows).into_response(),
                RollupResult::PlayerRankings(rows) => Json(rows).into_response(),
            }
        }),
        ViewRequest::Filters(tenant) => calculate::available_filters(store.as_ref(), &tenant)
            .map(|filters| Json(filters).into_response()),
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(response)
}
