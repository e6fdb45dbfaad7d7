use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use amity_core::identity;
use amity_types::api::SearchResponse;

use crate::auth::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive substring match on username.
    pub name: Option<String>,
    /// Case-insensitive exact match on email.
    pub email: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    10
}

/// GET /users/search — public user discovery, paged by limit/offset.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.min(identity::MAX_SEARCH_LIMIT);
    let offset = query.offset;

    let db = state.db.clone();
    let users = tokio::task::spawn_blocking(move || {
        identity::search(
            &db,
            query.name.as_deref(),
            query.email.as_deref(),
            limit,
            offset,
        )
    })
    .await
    .map_err(|e| ApiError::internal(format!("spawn_blocking join error: {e}")))??;

    Ok(Json(SearchResponse {
        users,
        limit,
        offset,
    }))
}
