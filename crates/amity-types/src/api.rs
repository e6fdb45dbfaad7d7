use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{RequestStatus, User};

// -- JWT Claims --

/// JWT claims shared between token issuance (register/login) and the REST
/// auth middleware. Canonical definition lives here in amity-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Users --

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub users: Vec<User>,
    pub limit: u32,
    pub offset: u32,
}

// -- Friend requests --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendFriendRequest {
    pub email: String,
}

/// A friend request with both parties' usernames joined in for display.
#[derive(Debug, Clone, Serialize)]
pub struct FriendRequestView {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub receiver_id: Uuid,
    pub receiver_username: String,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
