use thiserror::Error;

/// Errors surfaced by the storage layer.
///
/// `Unique` is split out from the generic SQLite error so callers can map
/// constraint hits to domain errors (duplicate identity, duplicate
/// outstanding request) without string-matching at the call site.
#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE constraint rejected the write. Payload is the constraint
    /// description as reported by SQLite (e.g. "users.email").
    #[error("unique constraint violated: {0}")]
    Unique(String),

    /// A stored row failed to parse back into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl DbError {
    /// Error mapping for write paths: promotes UNIQUE-constraint failures
    /// to `DbError::Unique`, passes everything else through.
    pub(crate) fn on_write(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ffi_err, msg) = &e {
            if ffi_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || ffi_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            {
                // Message looks like "UNIQUE constraint failed: users.email";
                // keep the part naming the constraint.
                let detail = msg.as_deref().unwrap_or("");
                let constraint = detail.rsplit(':').next().unwrap_or(detail).trim();
                return Self::Unique(constraint.to_string());
            }
        }
        Self::Sqlite(e)
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Unique(_))
    }
}
