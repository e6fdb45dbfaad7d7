//! Per-user fixed-window rate limiting for outbound friend requests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_per_window: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_per_window: 3,
        }
    }
}

struct Window {
    started: Instant,
    count: u32,
}

/// Counts sends per user over a fixed window. The increment and the check
/// happen under a single lock acquisition, so concurrent callers for the
/// same user cannot both slip under the cap.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<Uuid, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, user_id: Uuid) -> Result<(), Error> {
        self.check_at(user_id, Instant::now())
    }

    fn check_at(&self, user_id: Uuid, now: Instant) -> Result<(), Error> {
        // A poisoned map is still a valid counter table; keep using it.
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let window = windows.entry(user_id).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.duration_since(window.started).as_secs();
        if elapsed >= self.config.window_secs {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.config.max_per_window {
            return Err(Error::RateLimited {
                retry_after_secs: self.config.window_secs.saturating_sub(elapsed),
            });
        }

        window.count += 1;
        Ok(())
    }
}
