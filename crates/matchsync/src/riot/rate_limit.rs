use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Published upstream limits and the ceilings derived from them.
pub mod rate_limits {
    /// Development keys allow 20 requests/second (and 100 per 2 minutes);
    /// the detail fetcher paces itself at the per-second ceiling.
    pub const RIOT_DEFAULT_RPS: u32 = 20;
    /// Default number of detail requests in flight at once.
    pub const DEFAULT_DETAIL_CONCURRENCY: usize = 20;
    /// Default number of IDs dispatched per detail batch.
    pub const DEFAULT_DETAIL_BATCH_SIZE: usize = 20;
}

/// Throughput ceiling for upstream requests, backed by the governor crate.
///
/// The limiter is an explicit value handed to the detail fetcher, so each
/// caller decides which requests share a budget. Clones share the same budget.
///
/// # Example
///
/// ```ignore
/// use matchsync::riot::ApiRateLimiter;
///
/// let limiter = ApiRateLimiter::new(20);
/// limiter.wait().await;
/// client.fetch_match(id).await;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
    requests_per_second: u32,
}

impl ApiRateLimiter {
    /// Create a limiter allowing `requests_per_second` (0 is treated as 1).
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
            requests_per_second: rps.get(),
        }
    }

    /// The effective ceiling in requests per second.
    #[inline]
    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second
    }

    /// Wait (asynchronously) until another request is allowed.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

impl std::fmt::Debug for ApiRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRateLimiter")
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}
