//! Offset pagination over a player's match ID list.

use super::client::{MAX_IDS_PER_PAGE, RiotClient};
use super::outcome::{FetchOutcome, UpstreamError};

/// Match IDs collected newest-first, plus why collection stopped early.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdCollection {
    /// IDs newest-first, never longer than the requested cap.
    pub ids: Vec<String>,
    /// A page was rate-limited; `ids` holds what was collected before it.
    pub rate_limited: bool,
    /// The stop watermark was seen; it and everything older are excluded.
    pub watermark_found: bool,
}

/// Collect up to `cap` match IDs for `player_id`, newest first.
///
/// Pages of `min(100, cap - collected)` are requested at an offset equal to
/// the number of IDs collected so far. Collection stops when:
/// - `cap` IDs are collected
/// - a page comes back empty or shorter than requested (end of history)
/// - a page is rate-limited (the result is partial)
/// - `stop_at` appears in a page (it and older IDs are excluded)
///
/// Any other upstream failure aborts and is returned as the error.
pub async fn collect_match_ids(
    client: &RiotClient,
    player_id: &str,
    cap: usize,
    stop_at: Option<&str>,
) -> Result<IdCollection, UpstreamError> {
    let mut collection = IdCollection::default();

    while collection.ids.len() < cap {
        let remaining = cap - collection.ids.len();
        let requested = remaining.min(MAX_IDS_PER_PAGE as usize) as u32;
        let offset = collection.ids.len();

        let page = match client.fetch_match_ids(player_id, offset, requested).await {
            FetchOutcome::Success(page) => page,
            FetchOutcome::RateLimited { retry_after_secs } => {
                tracing::info!(
                    player_id,
                    offset,
                    retry_after_secs,
                    collected = collection.ids.len(),
                    "Match ID pagination rate limited, keeping partial list"
                );
                collection.rate_limited = true;
                break;
            }
            FetchOutcome::Error(e) => return Err(e),
        };

        tracing::debug!(player_id, offset, received = page.len(), "Fetched match ID page");

        let received = page.len();
        if received == 0 {
            break;
        }

        if let Some(mark) = stop_at
            && let Some(pos) = page.iter().position(|id| id == mark)
        {
            collection.ids.extend(page.into_iter().take(pos));
            collection.watermark_found = true;
            break;
        }

        collection.ids.extend(page);
        // Upstream may ignore `count`; never exceed the cap.
        collection.ids.truncate(cap);

        if received < requested as usize {
            break;
        }
    }

    Ok(collection)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::http::MockTransport;
    use crate::riot::client::DEFAULT_TIMEOUT;

    fn setup() -> (MockTransport, RiotClient) {
        let transport = MockTransport::new();
        let client = RiotClient::new_with_transport(
            "https://riot.test",
            "k",
            DEFAULT_TIMEOUT,
            Arc::new(transport.clone()),
        )
        .expect("client");
        (transport, client)
    }

    fn ids(prefix: &str, range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("{prefix}{i}")).collect()
    }

    #[tokio::test]
    async fn pages_by_offset_until_cap() {
        let (transport, client) = setup();
        transport.push_json(client.match_ids_url("p", 0, 100), &json!(ids("M", 0..100)));
        transport.push_json(client.match_ids_url("p", 100, 50), &json!(ids("M", 100..150)));

        let out = collect_match_ids(&client, "p", 150, None).await.expect("collect");
        assert_eq!(out.ids.len(), 150);
        assert_eq!(out.ids[0], "M0");
        assert_eq!(out.ids[149], "M149");
        assert!(!out.rate_limited);
        assert!(!out.watermark_found);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn short_page_ends_history() {
        let (transport, client) = setup();
        transport.push_json(client.match_ids_url("p", 0, 100), &json!(ids("M", 0..7)));

        let out = collect_match_ids(&client, "p", 300, None).await.expect("collect");
        assert_eq!(out.ids, ids("M", 0..7));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn empty_page_ends_history() {
        let (transport, client) = setup();
        transport.push_json(client.match_ids_url("p", 0, 100), &json!(ids("M", 0..100)));
        transport.push_json(client.match_ids_url("p", 100, 100), &json!([]));

        let out = collect_match_ids(&client, "p", 300, None).await.expect("collect");
        assert_eq!(out.ids.len(), 100);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn stops_before_watermark() {
        let (transport, client) = setup();
        transport.push_json(
            client.match_ids_url("p", 0, 100),
            &json!(["N1", "N2", "X", "P1", "P2"]),
        );

        let out = collect_match_ids(&client, "p", 300, Some("X"))
            .await
            .expect("collect");
        assert_eq!(out.ids, vec!["N1".to_string(), "N2".to_string()]);
        assert!(out.watermark_found);
    }

    #[tokio::test]
    async fn watermark_at_head_yields_nothing() {
        let (transport, client) = setup();
        transport.push_json(client.match_ids_url("p", 0, 100), &json!(["X", "P1"]));

        let out = collect_match_ids(&client, "p", 300, Some("X"))
            .await
            .expect("collect");
        assert!(out.ids.is_empty());
        assert!(out.watermark_found);
    }

    #[tokio::test]
    async fn rate_limited_page_returns_partial() {
        let (transport, client) = setup();
        transport.push_json(client.match_ids_url("p", 0, 100), &json!(ids("M", 0..100)));
        transport.push_rate_limited(client.match_ids_url("p", 100, 100), Some("2"));

        let out = collect_match_ids(&client, "p", 250, None).await.expect("collect");
        assert_eq!(out.ids.len(), 100);
        assert!(out.rate_limited);
    }

    #[tokio::test]
    async fn error_aborts() {
        let (transport, client) = setup();
        transport.push_json(client.match_ids_url("p", 0, 100), &json!(ids("M", 0..100)));
        transport.push_status(client.match_ids_url("p", 100, 100), 503, "unavailable");

        let err = collect_match_ids(&client, "p", 300, None)
            .await
            .expect_err("should abort");
        assert_eq!(err.status_code(), 503);
    }

    #[tokio::test]
    async fn zero_cap_makes_no_requests() {
        let (transport, client) = setup();
        let out = collect_match_ids(&client, "p", 0, None).await.expect("collect");
        assert!(out.ids.is_empty());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn oversized_page_is_truncated_to_cap() {
        let (transport, client) = setup();
        transport.push_json(client.match_ids_url("p", 0, 3), &json!(ids("M", 0..5)));

        let out = collect_match_ids(&client, "p", 3, None).await.expect("collect");
        assert_eq!(out.ids, ids("M", 0..3));
    }
}
