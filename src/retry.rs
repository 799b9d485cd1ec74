//! Transport-level retry policy.
//!
//! The policy decides whether a failed attempt is worth repeating and how long
//! to wait first. It is independent of the single 401 refresh-and-resend done
//! by the client: a resend after a refresh gets its own fresh retry budget.
//!
//! Delay before retry `n` (0-based) is `base_delay * 2^n`, capped at
//! `max_delay`. A `Retry-After` header on a retryable response replaces the
//! computed delay (still capped).

use reqwest::Method;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::Duration;

/// Statuses retried by default: rate limiting and transient gateway/server failures.
pub const DEFAULT_RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Reusable retry configuration shared by every request a client sends.
///
/// # Example
///
/// ```
/// use contract_sdk::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(5)
///     .with_base_delay(Duration::from_millis(200))
///     .with_max_delay(Duration::from_secs(5));
///
/// assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(200));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(800));
/// assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    /// Creates a policy allowing `max_retries` retries with the default backoff.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0)
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Replaces the set of HTTP statuses that trigger a retry.
    #[must_use]
    pub fn with_retry_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retry_statuses = statuses.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    #[must_use]
    pub fn retry_statuses(&self) -> &[u16] {
        &self.retry_statuses
    }

    /// Backoff before retry number `attempt` (0 for the first retry).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    #[must_use]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Starts tracking the attempts of one logical request.
    pub(crate) fn start(&self) -> RetryState<'_> {
        RetryState {
            policy: self,
            retries: 0,
        }
    }
}

/// Attempt counter for a single logical request.
#[derive(Debug)]
pub(crate) struct RetryState<'a> {
    policy: &'a RetryPolicy,
    retries: u32,
}

impl RetryState<'_> {
    /// Number of retries already consumed.
    pub(crate) fn retries(&self) -> u32 {
        self.retries
    }

    /// Consumes one retry and returns the delay to wait, or `None` when the
    /// budget is exhausted.
    pub(crate) fn next_delay(&mut self, retry_after: Option<Duration>) -> Option<Duration> {
        if self.retries >= self.policy.max_retries {
            return None;
        }
        let delay = match retry_after {
            Some(hint) => hint.min(self.policy.max_delay),
            None => self.policy.delay_for_attempt(self.retries),
        };
        self.retries += 1;
        Some(delay)
    }
}

/// Methods whose requests may be repeated after the server may have seen them.
pub(crate) fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::PUT | Method::DELETE | Method::HEAD | Method::OPTIONS
    )
}

/// Reads a `Retry-After` header given in whole seconds.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
