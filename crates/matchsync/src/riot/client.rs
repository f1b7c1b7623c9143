//! Riot match-v5 API client.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use serde::de::DeserializeOwned;
use url::Url;

use super::outcome::{FetchOutcome, UpstreamError, parse_retry_after};
use super::types::MatchDetail;
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpError, HttpRequest, HttpTransport};

/// Default regional routing host for match-v5.
pub const DEFAULT_REGION_HOST: &str = "https://americas.api.riotgames.com";

/// Default timeout for a single upstream call.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(8);

/// Largest page the match ID endpoint serves.
pub const MAX_IDS_PER_PAGE: u32 = 100;

/// Header carrying the API key.
const AUTH_HEADER: &str = "X-Riot-Token";

/// Riot API client.
///
/// Every call is a single `GET`, bounded by the client timeout and classified
/// into a [`FetchOutcome`]. Nothing is retried here: a 429 comes back as
/// [`FetchOutcome::RateLimited`] and the caller picks the policy.
#[derive(Clone)]
pub struct RiotClient {
    transport: Arc<dyn HttpTransport>,
    base: Url,
    api_key: String,
    timeout: StdDuration,
}

impl RiotClient {
    /// Create a client backed by a pooled reqwest transport.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = RiotClient::new(DEFAULT_REGION_HOST, &api_key, DEFAULT_TIMEOUT)?;
    /// let ids = client.fetch_match_ids(puuid, 0, 20).await;
    /// ```
    pub fn new(host: &str, api_key: &str, timeout: StdDuration) -> Result<Self, HttpError> {
        let transport = ReqwestTransport::with_timeout(timeout)?;
        Self::new_with_transport(host, api_key, timeout, Arc::new(transport))
    }

    pub fn new_with_transport(
        host: &str,
        api_key: &str,
        timeout: StdDuration,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, HttpError> {
        let base = Url::parse(host.trim_end_matches('/'))
            .map_err(|e| HttpError::InvalidUrl(format!("{host}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(HttpError::InvalidUrl(host.to_string()));
        }

        Ok(Self {
            transport,
            base,
            api_key: api_key.to_string(),
            timeout,
        })
    }

    /// Get the host URL.
    pub fn host(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> StdDuration {
        self.timeout
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        url.into()
    }

    /// URL of one page of a player's match IDs, newest first.
    pub fn match_ids_url(&self, player_id: &str, start: usize, count: u32) -> String {
        self.endpoint(
            &["lol", "match", "v5", "matches", "by-puuid", player_id, "ids"],
            &[("start", start.to_string()), ("count", count.to_string())],
        )
    }

    /// URL of a single match detail.
    pub fn match_url(&self, match_id: &str) -> String {
        self.endpoint(&["lol", "match", "v5", "matches", match_id], &[])
    }

    /// Fetch up to `count` match IDs starting at `start` (0 = newest).
    pub async fn fetch_match_ids(
        &self,
        player_id: &str,
        start: usize,
        count: u32,
    ) -> FetchOutcome<Vec<String>> {
        let count = count.min(MAX_IDS_PER_PAGE);
        self.get_json(self.match_ids_url(player_id, start, count))
            .await
    }

    /// Fetch the full detail record of one match.
    pub async fn fetch_match(&self, match_id: &str) -> FetchOutcome<MatchDetail> {
        self.get_json(self.match_url(match_id)).await
    }

    /// Issue one authenticated GET and classify the response.
    pub async fn get_json<T: DeserializeOwned>(&self, url: String) -> FetchOutcome<T> {
        let request = HttpRequest::get(url.clone())
            .with_header(AUTH_HEADER, self.api_key.as_str())
            .with_header("Accept", "application/json");

        tracing::trace!(url = %url, "Upstream GET");

        let response = match tokio::time::timeout(self.timeout, self.transport.send(request)).await
        {
            Err(_) | Ok(Err(HttpError::Timeout(_))) => {
                tracing::debug!(url = %url, timeout = ?self.timeout, "Upstream request timed out");
                return FetchOutcome::Error(UpstreamError::Timeout { url });
            }
            Ok(Err(e)) => {
                return FetchOutcome::Error(UpstreamError::Transport {
                    message: e.to_string(),
                });
            }
            Ok(Ok(response)) => response,
        };

        match response.status {
            429 => {
                let retry_after_secs = parse_retry_after(response.header("retry-after"));
                tracing::debug!(url = %url, retry_after_secs, "Upstream rate limited");
                FetchOutcome::RateLimited { retry_after_secs }
            }
            _ if response.is_success() => match serde_json::from_slice(&response.body) {
                Ok(data) => FetchOutcome::Success(data),
                Err(e) => FetchOutcome::Error(UpstreamError::Malformed {
                    message: format!("{url}: {e}"),
                }),
            },
            status => FetchOutcome::Error(UpstreamError::Status {
                status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            }),
        }
    }
}

impl std::fmt::Debug for RiotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiotClient")
            .field("host", &self.host())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::http::{HttpResponse, MockTransport, header_get};

    const HOST: &str = "https://riot.test";

    fn client(transport: &MockTransport) -> RiotClient {
        RiotClient::new_with_transport(HOST, "key-123", DEFAULT_TIMEOUT, Arc::new(transport.clone()))
            .expect("client should build")
    }

    #[test]
    fn builds_match_v5_urls() {
        let transport = MockTransport::new();
        let client = client(&transport);
        assert_eq!(
            client.match_ids_url("abc-DEF", 100, 50),
            "https://riot.test/lol/match/v5/matches/by-puuid/abc-DEF/ids?start=100&count=50"
        );
        assert_eq!(
            client.match_url("NA1_42"),
            "https://riot.test/lol/match/v5/matches/NA1_42"
        );
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        let transport = MockTransport::new();
        let client = client(&transport);
        let url = client.match_url("a/b c");
        assert!(url.ends_with("/matches/a%2Fb%20c"), "{url}");
    }

    #[test]
    fn rejects_unparseable_host() {
        let err = RiotClient::new_with_transport(
            "not a host",
            "k",
            DEFAULT_TIMEOUT,
            Arc::new(MockTransport::new()),
        )
        .expect_err("invalid host should fail");
        assert!(matches!(err, HttpError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn success_decodes_body_and_sends_auth_header() {
        let transport = MockTransport::new();
        let client = client(&transport);
        let url = client.match_ids_url("p1", 0, 2);
        transport.push_json(&url, &serde_json::json!(["M2", "M1"]));

        let outcome = client.fetch_match_ids("p1", 0, 2).await;
        assert_eq!(
            outcome,
            FetchOutcome::Success(vec!["M2".to_string(), "M1".to_string()])
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(header_get(&requests[0].headers, "x-riot-token"), Some("key-123"));
    }

    #[tokio::test]
    async fn page_size_is_clamped_to_upstream_maximum() {
        let transport = MockTransport::new();
        let client = client(&transport);
        transport.push_json(client.match_ids_url("p1", 0, 100), &serde_json::json!([]));

        let outcome = client.fetch_match_ids("p1", 0, 500).await;
        assert_eq!(outcome, FetchOutcome::Success(Vec::new()));
    }

    #[tokio::test]
    async fn status_429_is_rate_limited_with_retry_after() {
        let transport = MockTransport::new();
        let client = client(&transport);
        transport.push_rate_limited(client.match_url("M1"), Some("17"));
        transport.push_rate_limited(client.match_url("M1"), Some("soon"));

        assert_eq!(
            client.fetch_match("M1").await,
            FetchOutcome::RateLimited {
                retry_after_secs: 17
            }
        );
        assert_eq!(
            client.fetch_match("M1").await,
            FetchOutcome::RateLimited {
                retry_after_secs: 0
            }
        );
        // Never retried internally.
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn non_success_status_carries_status_and_body() {
        let transport = MockTransport::new();
        let client = client(&transport);
        transport.push_status(client.match_url("M1"), 404, "{\"status\":\"not found\"}");

        match client.fetch_match("M1").await {
            FetchOutcome::Error(UpstreamError::Status { status, body }) => {
                assert_eq!(status, 404);
                assert!(body.contains("not found"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_success_body_is_malformed() {
        let transport = MockTransport::new();
        let client = client(&transport);
        transport.push_status(client.match_ids_url("p1", 0, 1), 200, "<html>");

        match client.fetch_match_ids("p1", 0, 1).await {
            FetchOutcome::Error(err @ UpstreamError::Malformed { .. }) => {
                assert_eq!(err.status_code(), 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_is_an_error_not_success() {
        let transport = MockTransport::new();
        let client = client(&transport);

        match client.fetch_match("unregistered").await {
            FetchOutcome::Error(UpstreamError::Transport { message }) => {
                assert!(message.contains("unregistered"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    struct StalledTransport;

    #[async_trait]
    impl HttpTransport for StalledTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, HttpError> {
            tokio::time::sleep(StdDuration::from_secs(3600)).await;
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: b"[]".to_vec(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_request_times_out_as_error() {
        let client = RiotClient::new_with_transport(
            HOST,
            "k",
            StdDuration::from_secs(8),
            Arc::new(StalledTransport),
        )
        .expect("client");

        match client.fetch_match_ids("p1", 0, 1).await {
            FetchOutcome::Error(err) => {
                assert!(err.is_timeout());
                assert_eq!(err.status_code(), 0);
            }
            other => panic!("timeout must not be success: {other:?}"),
        }
    }
}
