//! Identity operations: signup, lookup, and search over the user store.
//!
//! Validation and email normalization happen here, before any store
//! mutation, so the DB layer only ever sees well-formed, normalized input.

use chrono::Utc;
use uuid::Uuid;

use amity_db::{Database, DbError};
use amity_types::models::User;

use crate::error::Error;

pub const MAX_SEARCH_LIMIT: u32 = 100;

/// Canonical form of an email address: trimmed and lower-cased. Uniqueness
/// and all lookups operate on this form, never on the raw input.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_username(username: &str) -> Result<(), Error> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err(Error::Validation(
            "username must be 3-32 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), Error> {
    let malformed = || Error::Validation("malformed email address".into());

    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(malformed());
    }
    let (local, domain) = email.split_once('@').ok_or_else(malformed)?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(malformed());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), Error> {
    if password.len() < 8 {
        return Err(Error::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

/// Create a user. The credential arrives pre-hashed (PHC string); this
/// function never sees a plaintext password. A colliding normalized email
/// or username surfaces as `DuplicateIdentity` naming the field.
pub fn create_user(
    db: &Database,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, Error> {
    validate_username(username)?;
    let email = normalize_email(email);
    validate_email(&email)?;

    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email,
        created_at: Utc::now(),
    };

    db.create_user(
        &user.id.to_string(),
        &user.username,
        &user.email,
        password_hash,
        &user.created_at.to_rfc3339(),
    )
    .map_err(|e| match e {
        DbError::Unique(constraint) if constraint.contains("email") => {
            Error::DuplicateIdentity("email")
        }
        DbError::Unique(_) => Error::DuplicateIdentity("username"),
        other => other.into(),
    })?;

    Ok(user)
}

pub fn find_by_email(db: &Database, email: &str) -> Result<User, Error> {
    let row = db
        .user_by_email(&normalize_email(email))?
        .ok_or(Error::NotFound("user"))?;
    Ok(row.into_user()?)
}

pub fn find_by_id(db: &Database, id: Uuid) -> Result<User, Error> {
    let row = db
        .user_by_id(&id.to_string())?
        .ok_or(Error::NotFound("user"))?;
    Ok(row.into_user()?)
}

/// Credential hash for login verification. Kept separate from `User` so
/// the hash never rides along on a serializable type.
pub fn credential_by_email(db: &Database, email: &str) -> Result<Option<(User, String)>, Error> {
    let Some(row) = db.user_by_email(&normalize_email(email))? else {
        return Ok(None);
    };
    let hash = row.password.clone();
    Ok(Some((row.into_user()?, hash)))
}

/// Paged search: case-insensitive substring on username, case-insensitive
/// exact match on email, AND semantics, both optional.
pub fn search(
    db: &Database,
    name_contains: Option<&str>,
    email_exact: Option<&str>,
    limit: u32,
    offset: u32,
) -> Result<Vec<User>, Error> {
    let limit = limit.min(MAX_SEARCH_LIMIT);
    let email = email_exact.map(normalize_email);

    let rows = db.search_users(name_contains, email.as_deref(), limit, offset)?;
    rows.into_iter()
        .map(|r| r.into_user().map_err(Error::from))
        .collect()
}
