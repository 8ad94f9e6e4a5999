use std::time::Duration;

use nexus_store::StoreError;
use thiserror::Error;

/// Typed rejections returned by engine commands.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("You must be signed in to do that")]
    Unauthenticated,

    #[error("Too many attempts, retry in {}s", retry_after_secs(.retry_after))]
    RateLimited { retry_after: Duration },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Message not delivered: one of you has blocked the other")]
    Blocked,

    #[error("Comments are disabled on announcements")]
    CommentsDisabled,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(#[from] StoreError),

    #[error("Engine is shutting down")]
    ShuttingDown,
}

impl EngineError {
    /// Remaining wait for throttled operations, in whole seconds.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            EngineError::RateLimited { retry_after } => Some(retry_after_secs(retry_after)),
            _ => None,
        }
    }
}

/// Whole seconds rounded from milliseconds, always upward so a pending
/// wait never reads as zero.
pub(crate) fn retry_after_secs(d: &Duration) -> u64 {
    let ms = d.as_millis() as u64;
    ms.div_ceil(1_000)
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_rounds_up() {
        let e = EngineError::RateLimited {
            retry_after: Duration::from_millis(6_000),
        };
        assert_eq!(e.retry_after_secs(), Some(6));

        let e = EngineError::RateLimited {
            retry_after: Duration::from_millis(6_001),
        };
        assert_eq!(e.retry_after_secs(), Some(7));
        assert_eq!(e.to_string(), "Too many attempts, retry in 7s");
    }

    #[test]
    fn other_errors_carry_no_wait() {
        assert_eq!(EngineError::Blocked.retry_after_secs(), None);
    }
}
