//! Rate limit information from GitHub API responses.
//!
//! GitHub includes `X-RateLimit-*` headers in API responses. When a request is
//! refused because the quota is exhausted, the reset timestamp lets callers
//! tell the user when a retry can succeed.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use http::HeaderMap;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Rate limit information extracted from GitHub API response headers.
///
/// # Example
///
/// ```
/// use nooknote::github::rate_limit::RateLimitInfo;
///
/// let info = RateLimitInfo::new(Some(5000), Some(4999), 1700000000);
/// assert!(!info.is_exhausted());
/// assert_eq!(info.remaining(), Some(4999));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Maximum requests allowed in the current window, when reported.
    limit: Option<u32>,
    /// Remaining requests in the current window, when reported.
    remaining: Option<u32>,
    /// Unix timestamp when the rate limit resets.
    reset_at: u64,
}

impl RateLimitInfo {
    /// Creates a new rate limit info instance.
    #[must_use]
    pub const fn new(limit: Option<u32>, remaining: Option<u32>, reset_at: u64) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
        }
    }

    /// Reads rate limit headers from a response.
    ///
    /// Returns `None` unless a parseable `X-RateLimit-Reset` header is present;
    /// the limit and remaining counts are optional.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let reset_at = header_number::<u64>(headers, RESET_HEADER)?;
        Some(Self::new(
            header_number(headers, LIMIT_HEADER),
            header_number(headers, REMAINING_HEADER),
            reset_at,
        ))
    }

    /// Returns the maximum requests allowed in the current window.
    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Returns the remaining requests in the current window.
    #[must_use]
    pub const fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    /// Returns the Unix timestamp when the rate limit resets.
    #[must_use]
    pub const fn reset_at(&self) -> u64 {
        self.reset_at
    }

    /// Returns the reset instant as a UTC timestamp.
    #[must_use]
    pub fn reset_time(&self) -> Option<DateTime<Utc>> {
        let seconds = i64::try_from(self.reset_at).ok()?;
        DateTime::from_timestamp(seconds, 0)
    }

    /// Returns true if the rate limit has been exhausted.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Calculates seconds until the rate limit resets.
    ///
    /// Returns 0 if the reset time has already passed or if the system time
    /// cannot be determined.
    #[must_use]
    pub fn seconds_until_reset(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or(0);

        self.reset_at.saturating_sub(now)
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.trim().parse().ok())
}
