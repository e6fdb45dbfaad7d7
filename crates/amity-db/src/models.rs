//! Database row types — these map directly to SQLite rows.
//! Distinct from the amity-types API models to keep the DB layer
//! independent; conversions parse the stored TEXT columns back into
//! typed domain values.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use amity_types::api::FriendRequestView;
use amity_types::models::{FriendRequest, RequestStatus, User};

use crate::DbError;

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct FriendRequestRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: String,
    pub created_at: String,
}

/// A friend request joined with both parties' usernames.
pub struct FriendRequestViewRow {
    pub id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub receiver_id: String,
    pub receiver_username: String,
    pub status: String,
    pub created_at: String,
}

impl UserRow {
    pub fn into_user(self) -> Result<User, DbError> {
        Ok(User {
            id: parse_uuid(&self.id)?,
            username: self.username,
            email: self.email,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl FriendRequestRow {
    pub fn into_request(self) -> Result<FriendRequest, DbError> {
        Ok(FriendRequest {
            id: parse_uuid(&self.id)?,
            sender_id: parse_uuid(&self.sender_id)?,
            receiver_id: parse_uuid(&self.receiver_id)?,
            status: parse_status(&self.status)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl FriendRequestViewRow {
    pub fn into_view(self) -> Result<FriendRequestView, DbError> {
        Ok(FriendRequestView {
            id: parse_uuid(&self.id)?,
            sender_id: parse_uuid(&self.sender_id)?,
            sender_username: self.sender_username,
            receiver_id: parse_uuid(&self.receiver_id)?,
            receiver_username: self.receiver_username,
            status: parse_status(&self.status)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, DbError> {
    s.parse()
        .map_err(|_| DbError::Corrupt(format!("invalid uuid: {s}")))
}

fn parse_status(s: &str) -> Result<RequestStatus, DbError> {
    RequestStatus::parse(s).ok_or_else(|| DbError::Corrupt(format!("invalid status: {s}")))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DbError::Corrupt(format!("invalid timestamp: {s}")))
}
