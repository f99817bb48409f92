//! Rate-limit retry with exponential backoff keyed off `x-rate-limit-reset`.

use std::future::Future;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::warn;

use crate::error::{OktaError, TransportError};

/// HTTP status Okta answers with once a rate-limit bucket is exhausted.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Response header carrying the bucket reset time, in Unix seconds.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Attempts made by [`handle_rate_limit`], first call included.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// First backoff step when the reset header is missing or already elapsed.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1_000);

/// What the retry loop needs to know about a failure.
pub trait RateLimitSignal {
    /// HTTP status of the failed response, if there was one.
    fn status_code(&self) -> Option<u16>;

    /// Raw `x-rate-limit-reset` header value, if present.
    fn rate_limit_reset(&self) -> Option<&str>;
}

impl RateLimitSignal for TransportError {
    fn status_code(&self) -> Option<u16> {
        TransportError::status_code(self)
    }

    fn rate_limit_reset(&self) -> Option<&str> {
        self.response()?.header(RATE_LIMIT_RESET_HEADER)
    }
}

impl RateLimitSignal for OktaError {
    fn status_code(&self) -> Option<u16> {
        OktaError::status_code(self)
    }

    fn rate_limit_reset(&self) -> Option<&str> {
        self.cause()?.rate_limit_reset()
    }
}

/// Retry policy for HTTP 429 responses.
///
/// `max_retries` bounds the total number of attempts, so the default of 3 means
/// one call plus at most two retries. Any non-429 failure is returned on first
/// occurrence. After the last attempt the 429 failure itself is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRetry {
    /// Total attempts, first call included. Zero still makes one attempt.
    pub max_retries: u32,
    /// Backoff used for the first retry; doubles after every wait.
    pub initial_delay: Duration,
}

impl Default for RateLimitRetry {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RateLimitRetry {
    /// Creates a policy.
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Attempt budget, first call included
    /// * `initial_delay` - Lower bound of the first wait
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Runs `operation`, retrying on 429 until it succeeds or attempts run out.
    ///
    /// Each wait is the longer of the time left until `x-rate-limit-reset` and
    /// the current backoff step.
    ///
    /// # Arguments
    ///
    /// * `operation` - Closure producing a fresh future per attempt
    ///
    /// # Returns
    ///
    /// The first success, the first non-429 failure, or the last 429 failure.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        E: RateLimitSignal,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempts_made: u32 = 0;
        let mut current_delay = self.initial_delay;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let attempts_left = attempts_made.saturating_add(1) < self.max_retries;
            if error.status_code() != Some(TOO_MANY_REQUESTS) || !attempts_left {
                return Err(error);
            }

            let wait = match error.rate_limit_reset().and_then(reset_delay) {
                Some(until_reset) => until_reset.max(current_delay),
                None => current_delay,
            };
            attempts_made += 1;
            warn!(
                attempt = attempts_made,
                max_retries = self.max_retries,
                wait_ms = wait.as_millis() as u64,
                "rate limited by Okta; backing off"
            );

            tokio::time::sleep(wait).await;
            current_delay = wait.saturating_mul(2);
        }
    }
}

/// Retries `operation` with the default policy (3 attempts, 1 s initial delay).
pub async fn handle_rate_limit<T, E, F, Fut>(operation: F) -> Result<T, E>
where
    E: RateLimitSignal,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    RateLimitRetry::default().run(operation).await
}

/// Time left until the Unix-seconds `reset` value, or `None` when the header is
/// unparseable. A reset in the past yields a zero delay.
fn reset_delay(reset: &str) -> Option<Duration> {
    let reset_seconds: i64 = reset.trim().parse().ok()?;
    let reset_ms = i128::from(reset_seconds) * 1_000;
    let now_ms = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let remaining = u64::try_from((reset_ms - now_ms).max(0)).unwrap_or(u64::MAX);
    Some(Duration::from_millis(remaining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::error::ErrorResponse;
    use crate::http_client::HttpError;

    fn rate_limited(reset: Option<i64>) -> TransportError {
        let mut headers = BTreeMap::new();
        if let Some(reset) = reset {
            headers.insert(String::from(RATE_LIMIT_RESET_HEADER), reset.to_string());
        }
        TransportError::Status(ErrorResponse {
            status_code: TOO_MANY_REQUESTS,
            headers,
            body: String::from(r#"{"errorCode":"E0000047","errorSummary":"API call exceeded rate limit due to too many requests."}"#),
        })
    }

    fn server_error() -> TransportError {
        TransportError::Status(ErrorResponse {
            status_code: 500,
            headers: BTreeMap::new(),
            body: String::from("Internal Server Error"),
        })
    }

    fn now_seconds() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_is_returned_without_delay() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<&str, TransportError> = handle_rate_limit(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok("done") }
        })
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn single_429_is_retried_after_reset_wait() {
        let calls = AtomicU32::new(0);
        let reset = now_seconds() + 2;
        let policy = RateLimitRetry::new(3, Duration::from_millis(100));
        let started = tokio::time::Instant::now();

        let result = policy
            .run(|| {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(rate_limited(Some(reset)))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // reset is at least one full second away, well above the 100 ms backoff
        assert!(started.elapsed() >= Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_is_used_when_reset_header_is_missing() {
        let calls = AtomicU32::new(0);
        let policy = RateLimitRetry::new(3, Duration::from_millis(250));
        let started = tokio::time::Instant::now();

        let result = policy
            .run(|| {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(rate_limited(None))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 250 ms, then doubled to 500 ms
        assert!(started.elapsed() >= Duration::from_millis(750));
        assert!(started.elapsed() < Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_429_stops_after_max_attempts_with_original_error() {
        let calls = AtomicU32::new(0);
        let reset = now_seconds() + 1;
        let policy = RateLimitRetry::new(3, Duration::from_millis(100));

        let result: Result<(), TransportError> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(rate_limited(Some(reset))) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result, Err(rate_limited(Some(reset))));
    }

    #[tokio::test(start_paused = true)]
    async fn non_429_failure_propagates_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<(), TransportError> = handle_rate_limit(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(server_error()) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result, Err(server_error()));
    }

    #[tokio::test(start_paused = true)]
    async fn connection_failure_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), TransportError> = handle_rate_limit(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::Connection(HttpError::new("refused"))) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn normalized_okta_errors_still_carry_the_429_signal() {
        let calls = AtomicU32::new(0);
        let policy = RateLimitRetry::new(2, Duration::from_millis(10));

        let result: Result<(), OktaError> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(OktaError::from(rate_limited(None))) }
            })
            .await;

        let error = result.expect_err("must stay rate limited");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(error.status_code(), Some(TOO_MANY_REQUESTS));
        assert_eq!(error.message(), "API call exceeded rate limit");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_max_retries_still_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let policy = RateLimitRetry::new(0, Duration::from_millis(10));

        let result: Result<(), TransportError> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited(None)) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }

    #[test]
    fn reset_in_the_past_yields_zero_delay() {
        let past = (now_seconds() - 30).to_string();

        assert_eq!(reset_delay(&past), Some(Duration::ZERO));
    }

    #[test]
    fn unparseable_reset_is_ignored() {
        assert_eq!(reset_delay("soon"), None);
        assert_eq!(reset_delay(""), None);
    }

    #[test]
    fn default_policy_matches_okta_guidance() {
        let policy = RateLimitRetry::default();

        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(1_000));
    }
}
