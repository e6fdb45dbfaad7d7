pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod query;
pub mod rate_limit;

pub use error::Error;
pub use lifecycle::Lifecycle;
pub use rate_limit::{RateLimitConfig, RateLimiter};
