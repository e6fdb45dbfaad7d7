//! The friend-request state machine.
//!
//! States: sent -> accepted | rejected. `send` is the only entry point,
//! `accept`/`reject` the only transitions, and only the receiver may
//! transition. Acting identity is always an explicit parameter; there is
//! no ambient session in this crate.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use amity_db::Database;
use amity_types::api::FriendRequestView;
use amity_types::models::{FriendRequest, RequestStatus};

use crate::error::Error;
use crate::identity;
use crate::rate_limit::RateLimiter;

pub struct Lifecycle {
    db: Arc<Database>,
    limiter: RateLimiter,
}

impl Lifecycle {
    pub fn new(db: Arc<Database>, limiter: RateLimiter) -> Self {
        Self { db, limiter }
    }

    /// Send a friend request from `sender_id` to the user behind
    /// `receiver_email`.
    ///
    /// Check order: receiver resolution, self-request, rate limit,
    /// outstanding duplicate. The duplicate pre-check is advisory; the
    /// partial unique index on (sender, receiver, status='sent') is what
    /// actually closes the race, and a lost race surfaces as `Conflict`.
    pub fn send(&self, sender_id: Uuid, receiver_email: &str) -> Result<FriendRequestView, Error> {
        let sender = identity::find_by_id(&self.db, sender_id)?;
        let receiver = identity::find_by_email(&self.db, receiver_email)?;

        if sender.id == receiver.id {
            return Err(Error::InvalidOperation(
                "cannot send a friend request to yourself".into(),
            ));
        }

        self.limiter.check(sender.id)?;

        if self
            .db
            .exists_sent_between(&sender.id.to_string(), &receiver.id.to_string())?
        {
            return Err(Error::Conflict("friend request already sent"));
        }

        let request_id = Uuid::new_v4();
        let created_at = Utc::now();

        self.db
            .insert_request(
                &request_id.to_string(),
                &sender.id.to_string(),
                &receiver.id.to_string(),
                RequestStatus::Sent.as_str(),
                &created_at.to_rfc3339(),
            )
            .map_err(|e| {
                if e.is_unique_violation() {
                    Error::Conflict("friend request already sent")
                } else {
                    e.into()
                }
            })?;

        info!(request_id = %request_id, sender = %sender.username, receiver = %receiver.username, "friend request sent");

        Ok(FriendRequestView {
            id: request_id,
            sender_id: sender.id,
            sender_username: sender.username,
            receiver_id: receiver.id,
            receiver_username: receiver.username,
            status: RequestStatus::Sent,
            created_at,
        })
    }

    /// Accept an outstanding request. Only the receiver may accept, and
    /// only while the request is still `sent`.
    pub fn accept(&self, request_id: Uuid, acting_user: Uuid) -> Result<FriendRequest, Error> {
        self.transition(request_id, acting_user, RequestStatus::Accepted)
    }

    /// Reject an outstanding request. Symmetric to `accept`.
    pub fn reject(&self, request_id: Uuid, acting_user: Uuid) -> Result<FriendRequest, Error> {
        self.transition(request_id, acting_user, RequestStatus::Rejected)
    }

    fn transition(
        &self,
        request_id: Uuid,
        acting_user: Uuid,
        target: RequestStatus,
    ) -> Result<FriendRequest, Error> {
        let row = self
            .db
            .request_by_id(&request_id.to_string())?
            .ok_or(Error::NotFound("friend request"))?;
        let mut request = row.into_request()?;

        if request.receiver_id != acting_user {
            return Err(Error::Forbidden(
                "only the receiver can answer a friend request",
            ));
        }
        if request.status != RequestStatus::Sent {
            return Err(Error::InvalidOperation(format!(
                "request already {}",
                request.status
            )));
        }

        // Conditional write: the WHERE status='sent' clause makes this a
        // compare-and-swap, so two concurrent transitions cannot both win.
        let changed = self
            .db
            .update_status_if_sent(&request.id.to_string(), target.as_str())?;
        if changed == 0 {
            return Err(Error::InvalidOperation("request already answered".into()));
        }

        info!(request_id = %request.id, status = %target, "friend request answered");

        request.status = target;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query;
    use crate::rate_limit::RateLimitConfig;

    fn test_lifecycle(max_sends: u32) -> (tempfile::TempDir, Arc<Database>, Lifecycle) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open(&dir.path().join("amity.db")).unwrap());
        let limiter = RateLimiter::new(RateLimitConfig {
            window_secs: 60,
            max_per_window: max_sends,
        });
        let lifecycle = Lifecycle::new(db.clone(), limiter);
        (dir, db, lifecycle)
    }

    fn register(db: &Database, username: &str, email: &str) -> Uuid {
        identity::create_user(db, username, email, "$argon2id$stub")
            .unwrap()
            .id
    }

    #[test]
    fn resend_while_outstanding_conflicts() {
        let (_dir, db, lifecycle) = test_lifecycle(100);
        let a = register(&db, "alice", "alice@example.com");
        register(&db, "bob", "bob@example.com");

        lifecycle.send(a, "bob@example.com").unwrap();
        let err = lifecycle.send(a, "bob@example.com").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
    }

    #[test]
    fn self_request_is_invalid() {
        let (_dir, db, lifecycle) = test_lifecycle(100);
        let a = register(&db, "alice", "alice@example.com");

        let err = lifecycle.send(a, "Alice@Example.com").unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)), "got {err:?}");
    }

    #[test]
    fn unknown_receiver_is_not_found() {
        let (_dir, db, lifecycle) = test_lifecycle(100);
        let a = register(&db, "alice", "alice@example.com");

        let err = lifecycle.send(a, "nobody@example.com").unwrap_err();
        assert!(matches!(err, Error::NotFound("user")), "got {err:?}");
    }

    #[test]
    fn accept_creates_friendship_and_clears_pending() {
        let (_dir, db, lifecycle) = test_lifecycle(100);
        let a = register(&db, "alice", "alice@example.com");
        let b = register(&db, "bob", "bob@example.com");

        let request = lifecycle.send(a, "bob@example.com").unwrap();
        assert_eq!(request.sender_username, "alice");
        assert_eq!(request.receiver_username, "bob");

        let pending = query::list_pending(&db, b).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, request.id);

        let accepted = lifecycle.accept(request.id, b).unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);

        let a_friends = query::list_friends(&db, a).unwrap();
        let b_friends = query::list_friends(&db, b).unwrap();
        assert_eq!(a_friends.len(), 1);
        assert_eq!(a_friends[0].id, b);
        assert_eq!(b_friends.len(), 1);
        assert_eq!(b_friends[0].id, a);

        assert!(query::list_pending(&db, b).unwrap().is_empty());
    }

    #[test]
    fn reject_leaves_no_friendship() {
        let (_dir, db, lifecycle) = test_lifecycle(100);
        let a = register(&db, "alice", "alice@example.com");
        let b = register(&db, "bob", "bob@example.com");

        let request = lifecycle.send(a, "bob@example.com").unwrap();
        let rejected = lifecycle.reject(request.id, b).unwrap();
        assert_eq!(rejected.status, RequestStatus::Rejected);

        assert!(query::list_friends(&db, a).unwrap().is_empty());
        assert!(query::list_friends(&db, b).unwrap().is_empty());
        assert!(query::list_pending(&db, b).unwrap().is_empty());
    }

    #[test]
    fn only_receiver_may_answer() {
        let (_dir, db, lifecycle) = test_lifecycle(100);
        let a = register(&db, "alice", "alice@example.com");
        register(&db, "bob", "bob@example.com");
        let c = register(&db, "carol", "carol@example.com");

        let request = lifecycle.send(a, "bob@example.com").unwrap();

        // Neither the sender nor a third party can answer.
        assert!(matches!(
            lifecycle.accept(request.id, a).unwrap_err(),
            Error::Forbidden(_)
        ));
        assert!(matches!(
            lifecycle.reject(request.id, c).unwrap_err(),
            Error::Forbidden(_)
        ));
    }

    #[test]
    fn terminal_requests_stay_terminal() {
        let (_dir, db, lifecycle) = test_lifecycle(100);
        let a = register(&db, "alice", "alice@example.com");
        let b = register(&db, "bob", "bob@example.com");

        let request = lifecycle.send(a, "bob@example.com").unwrap();
        lifecycle.accept(request.id, b).unwrap();

        assert!(matches!(
            lifecycle.accept(request.id, b).unwrap_err(),
            Error::InvalidOperation(_)
        ));
        assert!(matches!(
            lifecycle.reject(request.id, b).unwrap_err(),
            Error::InvalidOperation(_)
        ));
    }

    #[test]
    fn unknown_request_is_not_found() {
        let (_dir, db, lifecycle) = test_lifecycle(100);
        let b = register(&db, "bob", "bob@example.com");

        let err = lifecycle.accept(Uuid::new_v4(), b).unwrap_err();
        assert!(matches!(err, Error::NotFound("friend request")), "got {err:?}");
    }

    #[test]
    fn reverse_direction_requests_may_coexist() {
        let (_dir, db, lifecycle) = test_lifecycle(100);
        let a = register(&db, "alice", "alice@example.com");
        let b = register(&db, "bob", "bob@example.com");

        lifecycle.send(a, "bob@example.com").unwrap();
        let reverse = lifecycle.send(b, "alice@example.com").unwrap();

        // Accepting either one establishes the friendship.
        lifecycle.accept(reverse.id, a).unwrap();
        assert_eq!(query::list_friends(&db, a).unwrap().len(), 1);
        assert_eq!(query::list_friends(&db, b).unwrap().len(), 1);
    }

    #[test]
    fn sends_are_rate_limited() {
        let (_dir, db, lifecycle) = test_lifecycle(1);
        let a = register(&db, "alice", "alice@example.com");
        register(&db, "bob", "bob@example.com");
        register(&db, "carol", "carol@example.com");

        lifecycle.send(a, "bob@example.com").unwrap();
        let err = lifecycle.send(a, "carol@example.com").unwrap_err();
        assert!(matches!(err, Error::RateLimited { .. }), "got {err:?}");
    }

    #[test]
    fn rate_limit_rejection_mutates_nothing() {
        let (_dir, db, lifecycle) = test_lifecycle(1);
        let a = register(&db, "alice", "alice@example.com");
        register(&db, "bob", "bob@example.com");
        let c = register(&db, "carol", "carol@example.com");

        lifecycle.send(a, "bob@example.com").unwrap();
        lifecycle.send(a, "carol@example.com").unwrap_err();

        assert!(query::list_pending(&db, c).unwrap().is_empty());
    }

    #[test]
    fn concurrent_sends_have_exactly_one_winner() {
        let (_dir, db, lifecycle) = test_lifecycle(100);
        let a = register(&db, "alice", "alice@example.com");
        let b = register(&db, "bob", "bob@example.com");

        let lifecycle = Arc::new(lifecycle);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lifecycle = lifecycle.clone();
                std::thread::spawn(move || lifecycle.send(a, "bob@example.com"))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let won = results.iter().filter(|r| r.is_ok()).count();
        let conflicted = results
            .iter()
            .filter(|r| matches!(r, Err(Error::Conflict(_))))
            .count();

        assert_eq!(won, 1);
        assert_eq!(conflicted, 7);
        assert_eq!(query::list_pending(&db, b).unwrap().len(), 1);
    }

    #[test]
    fn concurrent_transitions_have_exactly_one_winner() {
        let (_dir, db, lifecycle) = test_lifecycle(100);
        let a = register(&db, "alice", "alice@example.com");
        let b = register(&db, "bob", "bob@example.com");

        let request = lifecycle.send(a, "bob@example.com").unwrap();

        let lifecycle = Arc::new(lifecycle);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let lifecycle = lifecycle.clone();
                let id = request.id;
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        lifecycle.accept(id, b)
                    } else {
                        lifecycle.reject(id, b)
                    }
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let won = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(won, 1);

        // Whatever won, the request ended up terminal and stayed there.
        let row = db.request_by_id(&request.id.to_string()).unwrap().unwrap();
        assert_ne!(row.status, "sent");
    }
}
