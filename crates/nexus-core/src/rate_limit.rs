//! Throttles for login attempts and comment spam.
//!
//! Both are driven by explicit timestamps from the engine clock rather than
//! reading the wall clock, so virtual time applies to them too.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use nexus_shared::constants::{COMMENT_SPAM_WINDOW_MS, LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW_MS};

/// Fixed-length window counting login attempts.
///
/// The window rolls over on the first attempt made more than `window` after
/// it opened. Once `max_attempts` are counted, further attempts are refused
/// without being counted.
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    count: u32,
    window_start: Option<DateTime<Utc>>,
    window: Duration,
    max_attempts: u32,
}

impl LoginThrottle {
    pub fn new(window: Duration, max_attempts: u32) -> Self {
        Self {
            count: 0,
            window_start: None,
            window,
            max_attempts,
        }
    }

    /// Count one attempt, or return how long until the window rolls over.
    pub fn try_acquire(&mut self, now: DateTime<Utc>) -> Result<(), StdDuration> {
        let start = match self.window_start {
            Some(start) if now - start <= self.window => start,
            _ => {
                self.count = 0;
                self.window_start = Some(now);
                now
            }
        };

        if self.count >= self.max_attempts {
            let remaining = (start + self.window) - now;
            return Err(remaining.to_std().unwrap_or_default());
        }

        self.count += 1;
        Ok(())
    }

}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(Duration::milliseconds(LOGIN_WINDOW_MS), LOGIN_MAX_ATTEMPTS)
    }
}

/// Minimum spacing between two comments by the same author, across all
/// posts.
#[derive(Debug, Clone)]
pub struct CommentThrottle {
    last_comment: HashMap<String, DateTime<Utc>>,
    spacing: Duration,
}

impl CommentThrottle {
    pub fn new(spacing: Duration) -> Self {
        Self {
            last_comment: HashMap::new(),
            spacing,
        }
    }

    /// `Err(remaining)` while `author_id` is still inside its spam window.
    pub fn check(&self, author_id: &str, now: DateTime<Utc>) -> Result<(), StdDuration> {
        let Some(last) = self.last_comment.get(author_id) else {
            return Ok(());
        };

        let elapsed = now - *last;
        if elapsed < self.spacing {
            let remaining = self.spacing - elapsed;
            return Err(remaining.to_std().unwrap_or_default());
        }
        Ok(())
    }

    pub fn record(&mut self, author_id: &str, now: DateTime<Utc>) {
        self.last_comment.insert(author_id.to_string(), now);
    }
}

impl Default for CommentThrottle {
    fn default() -> Self {
        Self::new(Duration::milliseconds(COMMENT_SPAM_WINDOW_MS))
    }
}
