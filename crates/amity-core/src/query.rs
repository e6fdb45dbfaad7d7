//! Read-only views derived from the relationship store.

use uuid::Uuid;

use amity_db::Database;
use amity_types::api::FriendRequestView;
use amity_types::models::{RequestStatus, User};

use crate::error::Error;

/// Users connected to `user_id` by an accepted request in either direction,
/// deduplicated, never including the user themself.
pub fn list_friends(db: &Database, user_id: Uuid) -> Result<Vec<User>, Error> {
    let rows = db.friends_of(&user_id.to_string())?;
    rows.into_iter()
        .map(|r| r.into_user().map_err(Error::from))
        .collect()
}

/// Outstanding requests addressed to `user_id`, oldest first.
pub fn list_pending(db: &Database, user_id: Uuid) -> Result<Vec<FriendRequestView>, Error> {
    let rows =
        db.requests_for_receiver(&user_id.to_string(), RequestStatus::Sent.as_str())?;
    rows.into_iter()
        .map(|r| r.into_view().map_err(Error::from))
        .collect()
}
