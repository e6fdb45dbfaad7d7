use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use amity_core::query;
use amity_types::api::{Claims, SendFriendRequest};

use crate::auth::AppState;
use crate::error::ApiError;

/// POST /friend-requests/send — send a request to the user behind the
/// given email. The acting user comes from the JWT claims, never the body.
pub async fn send_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendFriendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = tokio::task::spawn_blocking(move || state.lifecycle.send(claims.sub, &req.email))
        .await
        .map_err(|e| ApiError::internal(format!("spawn_blocking join error: {e}")))??;

    Ok((StatusCode::CREATED, Json(view)))
}

/// POST /friend-requests/{id}/accept
pub async fn accept_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    tokio::task::spawn_blocking(move || state.lifecycle.accept(request_id, claims.sub))
        .await
        .map_err(|e| ApiError::internal(format!("spawn_blocking join error: {e}")))??;

    Ok(Json(serde_json::json!({ "status": "accepted" })))
}

/// POST /friend-requests/{id}/reject
pub async fn reject_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    tokio::task::spawn_blocking(move || state.lifecycle.reject(request_id, claims.sub))
        .await
        .map_err(|e| ApiError::internal(format!("spawn_blocking join error: {e}")))??;

    Ok(Json(serde_json::json!({ "status": "rejected" })))
}

/// GET /friend-requests/pending — outstanding requests addressed to the
/// acting user.
pub async fn pending_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let pending =
        tokio::task::spawn_blocking(move || query::list_pending(&state.db, claims.sub))
            .await
            .map_err(|e| ApiError::internal(format!("spawn_blocking join error: {e}")))??;

    Ok(Json(pending))
}

/// GET /friends — everyone connected to the acting user by an accepted
/// request, in either direction.
pub async fn list_friends(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let friends =
        tokio::task::spawn_blocking(move || query::list_friends(&state.db, claims.sub))
            .await
            .map_err(|e| ApiError::internal(format!("spawn_blocking join error: {e}")))??;

    Ok(Json(friends))
}
