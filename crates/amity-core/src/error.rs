use amity_db::DbError;
use thiserror::Error;

/// Domain error taxonomy. Every variant is recoverable by the caller and
/// maps to a distinct HTTP status in amity-api.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Username or email collision on signup. Payload names the field.
    #[error("{0} already taken")]
    DuplicateIdentity(&'static str),

    /// Self-request, or a transition attempted on a terminal request.
    #[error("{0}")]
    InvalidOperation(String),

    /// An outstanding request already exists in this direction, including
    /// the case where a concurrent send won the race.
    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("invalid or missing credentials")]
    Unauthenticated,

    /// Malformed input, rejected before any store mutation.
    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}
