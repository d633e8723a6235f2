//! Rate limiting of accepted submissions

use crate::config::RateLimitConfig;
use crate::error::{StoreError, SubmitError, SubmitResult};
use crate::store::KeyValueStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Enforces a minimum interval between accepted submissions.
///
/// The only state is the last accepted submission time, kept in the injected
/// store so it is shared by every guard on that store and survives restarts.
pub struct SubmissionThrottle {
    config: RateLimitConfig,
    store: Arc<dyn KeyValueStore>,
}

impl SubmissionThrottle {
    pub fn new(config: RateLimitConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self { config, store }
    }

    /// Last accepted submission time in epoch milliseconds.
    ///
    /// Like `parseInt`, only the leading integer is read, so `"100000.0"`
    /// is 100000. A value with no leading integer counts as no submission.
    pub async fn last_submission_at(&self) -> Result<Option<i64>, StoreError> {
        let raw = self.store.get(&self.config.storage_key).await?;
        Ok(raw.and_then(|value| {
            let parsed = parse_leading_int(&value);
            if parsed.is_none() {
                warn!(
                    key = %self.config.storage_key,
                    "Ignoring unparseable submission timestamp"
                );
            }
            parsed
        }))
    }

    /// Check if a submission at `now_ms` is allowed
    pub async fn check(&self, now_ms: i64) -> SubmitResult<()> {
        if !self.config.enabled {
            return Ok(());
        }
        let status = self.status(now_ms).await?;
        match status.retry_after {
            Some(wait) if !status.allowed => Err(SubmitError::RateLimited {
                retry_after_ms: wait.as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }

    /// Remember an accepted submission at `now_ms`
    pub async fn record(&self, now_ms: i64) -> Result<(), StoreError> {
        self.store
            .set(&self.config.storage_key, &now_ms.to_string())
            .await
    }

    /// Current limit status
    pub async fn status(&self, now_ms: i64) -> Result<RateLimitStatus, StoreError> {
        let last = self.last_submission_at().await?;
        if !self.config.enabled {
            return Ok(RateLimitStatus {
                allowed: true,
                last_submission_at: last,
                retry_after: None,
            });
        }

        let interval = i64::try_from(self.config.min_interval_ms).unwrap_or(i64::MAX);

        let retry_after = last.and_then(|last| {
            let elapsed = now_ms.saturating_sub(last);
            if elapsed < interval {
                // A timestamp from the future blocks until the clock passes it
                let wait = last.saturating_add(interval).saturating_sub(now_ms);
                Some(Duration::from_millis(wait as u64))
            } else {
                None
            }
        });

        Ok(RateLimitStatus {
            allowed: retry_after.is_none(),
            last_submission_at: last,
            retry_after,
        })
    }
}

/// Leading optionally-signed decimal integer, saturating on overflow
fn parse_leading_int(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (negative, rest) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let mut n: i64 = 0;
    for b in rest[..digits].bytes() {
        let d = i64::from(b - b'0');
        n = n.saturating_mul(10);
        n = if negative {
            n.saturating_sub(d)
        } else {
            n.saturating_add(d)
        };
    }
    Some(n)
}

/// Rate limit status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Whether a submission would be allowed now
    pub allowed: bool,
    /// Last accepted submission, epoch milliseconds
    pub last_submission_at: Option<i64>,
    /// Time until a submission is allowed again
    pub retry_after: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn throttle(store: Arc<MemoryStore>) -> SubmissionThrottle {
        SubmissionThrottle::new(RateLimitConfig::default(), store)
    }

    #[tokio::test]
    async fn test_first_submission_allowed() {
        let limiter = throttle(Arc::new(MemoryStore::new()));
        assert!(limiter.check(1_000).await.is_ok());
        assert_eq!(limiter.last_submission_at().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_within_interval_rejected() {
        let limiter = throttle(Arc::new(MemoryStore::new()));
        limiter.record(100_000).await.unwrap();

        match limiter.check(110_000).await {
            Err(SubmitError::RateLimited { retry_after_ms }) => {
                assert_eq!(retry_after_ms, 20_000)
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
        assert!(limiter.check(129_999).await.is_err());
        assert!(limiter.check(130_000).await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled() {
        let store = Arc::new(MemoryStore::new());
        let config = RateLimitConfig {
            enabled: false,
            ..Default::default()
        };
        let limiter = SubmissionThrottle::new(config, store);
        limiter.record(100_000).await.unwrap();

        // Should always allow when disabled
        assert!(limiter.check(100_001).await.is_ok());

        // The stored time is still reported
        let status = limiter.status(100_001).await.unwrap();
        assert!(status.allowed);
        assert_eq!(status.last_submission_at, Some(100_000));
        assert_eq!(status.retry_after, None);
    }

    #[tokio::test]
    async fn test_numeric_prefix_is_read() {
        let store = Arc::new(MemoryStore::new());
        store.set("lastContactSubmission", "100000.0").await.unwrap();
        let limiter = throttle(store);

        assert_eq!(limiter.last_submission_at().await.unwrap(), Some(100_000));
        assert!(limiter.check(110_000).await.is_err());
        assert!(limiter.check(130_000).await.is_ok());
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("  42abc"), Some(42));
        assert_eq!(parse_leading_int("-7.5"), Some(-7));
        assert_eq!(parse_leading_int("+3"), Some(3));
        assert_eq!(parse_leading_int("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[tokio::test]
    async fn test_huge_interval_still_blocks() {
        let config = RateLimitConfig {
            min_interval_ms: u64::MAX,
            ..Default::default()
        };
        let limiter = SubmissionThrottle::new(config, Arc::new(MemoryStore::new()));
        limiter.record(0).await.unwrap();

        assert!(limiter.check(1_000).await.is_err());
        assert!(limiter.check(i64::MAX - 1).await.is_err());
    }

    #[tokio::test]
    async fn test_garbage_timestamp_ignored() {
        let store = Arc::new(MemoryStore::new());
        store.set("lastContactSubmission", "yesterday").await.unwrap();
        let limiter = throttle(store);

        assert!(limiter.check(5).await.is_ok());
    }

    #[tokio::test]
    async fn test_future_timestamp_blocks() {
        let limiter = throttle(Arc::new(MemoryStore::new()));
        limiter.record(200_000).await.unwrap();

        let status = limiter.status(100_000).await.unwrap();
        assert!(!status.allowed);
        assert_eq!(status.retry_after, Some(Duration::from_millis(130_000)));
    }

    #[tokio::test]
    async fn test_shared_store_shares_limit() {
        let store = Arc::new(MemoryStore::new());
        let first = throttle(store.clone());
        let second = throttle(store);

        first.record(50_000).await.unwrap();
        assert!(second.check(60_000).await.is_err());
    }
}
