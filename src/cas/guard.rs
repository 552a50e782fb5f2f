//! Per-session failed-login limiter.
//!
//! The guard is a pure state transition. The [`Status`] it advances is owned by
//! the browser session (see `handlers::login`), never by the ticket store.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Attempts tolerated inside one window before the session locks.
pub const MAX_ATTEMPTS: u32 = 3;

pub const DEFAULT_WINDOW_SECONDS: i64 = 30;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "lock")]
    pub locked: bool,
    #[serde(rename = "lastseen")]
    pub last_seen: i64,
    pub count: u32,
    pub user: String,
    pub confirm: bool,
}

impl Status {
    /// Reset the counter after a successful authentication.
    #[must_use]
    pub fn authenticated(mut self, user: &str) -> Self {
        user.clone_into(&mut self.user);
        self.count = 0;
        self.confirm = false;
        self
    }
}

/// Advance the limiter by one login attempt at `now` (unix seconds).
///
/// A locked session unlocks once `window` seconds pass without attempts. An
/// unlocked session counts attempts; the count restarts when the previous
/// attempt is older than `window`, and exceeding [`MAX_ATTEMPTS`] locks it.
#[must_use]
pub fn advance(status: Status, now: i64, window: i64) -> Status {
    let elapsed = now.saturating_sub(status.last_seen);
    let mut next = status;

    if next.locked {
        if elapsed > window {
            next.locked = false;
            next.count = 1;
        }
    } else {
        next.count = if elapsed > window {
            1
        } else {
            next.count.saturating_add(1)
        };
        if next.count > MAX_ATTEMPTS {
            next.locked = true;
            next.count = 0;
        }
    }

    next.last_seen = now;
    next
}

/// Current time in unix seconds.
#[must_use]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}
