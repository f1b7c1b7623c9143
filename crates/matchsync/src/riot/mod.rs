//! Riot match-v5 upstream: client, pagination, and paced detail fetching.

pub mod client;
pub mod details;
pub mod outcome;
pub mod pagination;
pub mod rate_limit;
pub mod types;

pub use client::{DEFAULT_REGION_HOST, DEFAULT_TIMEOUT, MAX_IDS_PER_PAGE, RiotClient};
pub use details::{DetailFetch, fetch_details};
pub use outcome::{FetchOutcome, NO_STATUS, UpstreamError, parse_retry_after};
pub use pagination::{IdCollection, collect_match_ids};
pub use rate_limit::{ApiRateLimiter, rate_limits};
pub use types::{FetchedMatch, MatchDetail};
