use rusqlite::Connection;

use crate::Database;
use crate::error::DbError;
use crate::models::{FriendRequestRow, FriendRequestViewRow, UserRow};

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        created_at: &str,
    ) -> Result<(), DbError> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, username, email, password_hash, created_at),
            )
            .map_err(DbError::on_write)?;
            Ok(())
        })
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<UserRow>, DbError> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn user_by_id(&self, id: &str) -> Result<Option<UserRow>, DbError> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Paged user search. `name_contains` is a case-insensitive substring
    /// match, `email_exact` a case-insensitive exact match; both optional,
    /// combined with AND. Ordered by id so pages are stable across calls.
    pub fn search_users(
        &self,
        name_contains: Option<&str>,
        email_exact: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<UserRow>, DbError> {
        let name_pattern = name_contains
            .map(|s| escape_like(&s.to_lowercase()))
            .unwrap_or_default();
        let email = email_exact.map(str::to_lowercase).unwrap_or_default();

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, password, created_at
                 FROM users
                 WHERE (?1 = '' OR lower(username) LIKE '%' || ?1 || '%' ESCAPE '\\')
                   AND (?2 = '' OR lower(email) = ?2)
                 ORDER BY id
                 LIMIT ?3 OFFSET ?4",
            )?;

            let rows = stmt
                .query_map(
                    rusqlite::params![name_pattern, email, limit, offset],
                    user_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Friend requests --

    pub fn insert_request(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
        status: &str,
        created_at: &str,
    ) -> Result<(), DbError> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO friend_requests (id, sender_id, receiver_id, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, sender_id, receiver_id, status, created_at),
            )
            .map_err(DbError::on_write)?;
            Ok(())
        })
    }

    pub fn request_by_id(&self, id: &str) -> Result<Option<FriendRequestRow>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, receiver_id, status, created_at
                 FROM friend_requests WHERE id = ?1",
            )?;

            let row = stmt
                .query_row([id], |row| {
                    Ok(FriendRequestRow {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        receiver_id: row.get(2)?,
                        status: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    /// Compare-and-swap status transition: only applies while the request
    /// is still outstanding. Returns the number of rows changed — zero
    /// means the request was already transitioned (or never existed).
    pub fn update_status_if_sent(&self, id: &str, new_status: &str) -> Result<usize, DbError> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE friend_requests SET status = ?2 WHERE id = ?1 AND status = 'sent'",
                (id, new_status),
            )?;
            Ok(changed)
        })
    }

    pub fn exists_sent_between(&self, sender_id: &str, receiver_id: &str) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            let exists: i64 = conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM friend_requests
                     WHERE sender_id = ?1 AND receiver_id = ?2 AND status = 'sent'
                 )",
                (sender_id, receiver_id),
                |row| row.get(0),
            )?;
            Ok(exists != 0)
        })
    }

    /// Requests addressed to `receiver_id` in the given status, oldest
    /// first, with both usernames joined in.
    pub fn requests_for_receiver(
        &self,
        receiver_id: &str,
        status: &str,
    ) -> Result<Vec<FriendRequestViewRow>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT fr.id, fr.sender_id, su.username, fr.receiver_id, ru.username,
                        fr.status, fr.created_at
                 FROM friend_requests fr
                 JOIN users su ON su.id = fr.sender_id
                 JOIN users ru ON ru.id = fr.receiver_id
                 WHERE fr.receiver_id = ?1 AND fr.status = ?2
                 ORDER BY fr.created_at, fr.id",
            )?;

            let rows = stmt
                .query_map([receiver_id, status], |row| {
                    Ok(FriendRequestViewRow {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        sender_username: row.get(2)?,
                        receiver_id: row.get(3)?,
                        receiver_username: row.get(4)?,
                        status: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Users connected to `user_id` by an accepted request in either
    /// direction. The IN-subquery deduplicates; self never appears because
    /// requests never have sender == receiver.
    pub fn friends_of(&self, user_id: &str) -> Result<Vec<UserRow>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.email, u.password, u.created_at
                 FROM users u
                 WHERE u.id IN (
                     SELECT CASE WHEN fr.sender_id = ?1
                                 THEN fr.receiver_id
                                 ELSE fr.sender_id END
                     FROM friend_requests fr
                     WHERE fr.status = 'accepted'
                       AND (fr.sender_id = ?1 OR fr.receiver_id = ?1)
                 )
                 ORDER BY u.id",
            )?;

            let rows = stmt
                .query_map([user_id], user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>, DbError> {
    let sql = format!(
        "SELECT id, username, email, password, created_at FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt.query_row([value], user_from_row).optional()?;

    Ok(row)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Escape LIKE wildcards in a user-supplied pattern (`ESCAPE '\'`).
fn escape_like(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, DbError>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, DbError> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
