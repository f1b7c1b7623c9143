//! Bounded concurrent fetching of match details.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;

use super::client::RiotClient;
use super::outcome::FetchOutcome;
use super::rate_limit::ApiRateLimiter;
use super::types::FetchedMatch;
use crate::sync::{ProgressCallback, SyncProgress, emit};

/// Result of a detail fetch run.
#[derive(Debug, Clone, Default)]
pub struct DetailFetch {
    /// Successfully fetched matches, in input order.
    pub matches: Vec<FetchedMatch>,
    /// A request was rate-limited and the run stopped early.
    pub rate_limited: bool,
    /// Matches dropped because their request failed.
    pub failed: usize,
}

/// Fetch details for `ids` in batches, at most `concurrency` in flight.
///
/// Every request first waits on `limiter`. The first 429 sets a shared stop
/// flag: tasks that have not dispatched yet skip their request, requests
/// already in flight finish, and no further batch starts. Failed requests are
/// logged and dropped.
pub async fn fetch_details(
    client: &RiotClient,
    ids: &[String],
    limiter: &ApiRateLimiter,
    concurrency: usize,
    batch_size: usize,
    on_progress: Option<&ProgressCallback>,
) -> DetailFetch {
    let mut result = DetailFetch::default();

    if ids.is_empty() {
        return result;
    }

    let batch_size = batch_size.max(1);
    let concurrency = concurrency.clamp(1, batch_size.min(ids.len()));
    let stop = Arc::new(AtomicBool::new(false));

    emit(
        on_progress,
        SyncProgress::FetchingDetails {
            count: ids.len(),
            concurrency,
            batch_size,
        },
    );

    for batch in ids.chunks(batch_size) {
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut handles = Vec::with_capacity(batch.len());

        for id in batch {
            let id = id.clone();
            let client = client.clone();
            let limiter = limiter.clone();
            let semaphore = Arc::clone(&semaphore);
            let stop = Arc::clone(&stop);

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return (id, None);
                };
                if stop.load(Ordering::Acquire) {
                    return (id, None);
                }
                limiter.wait().await;
                if stop.load(Ordering::Acquire) {
                    return (id, None);
                }

                let outcome = client.fetch_match(&id).await;
                if outcome.is_rate_limited() {
                    stop.store(true, Ordering::Release);
                }
                (id, Some(outcome))
            }));
        }

        for handle in handles {
            match handle.await {
                Ok((id, Some(FetchOutcome::Success(detail)))) => {
                    emit(
                        on_progress,
                        SyncProgress::FetchedDetail {
                            match_id: id.clone(),
                        },
                    );
                    result.matches.push(FetchedMatch {
                        match_id: id,
                        detail,
                    });
                }
                Ok((id, Some(FetchOutcome::RateLimited { retry_after_secs }))) => {
                    tracing::info!(match_id = %id, retry_after_secs, "Match detail rate limited");
                    if !result.rate_limited {
                        emit(on_progress, SyncProgress::RateLimited { retry_after_secs });
                    }
                    result.rate_limited = true;
                }
                Ok((id, Some(FetchOutcome::Error(e)))) => {
                    tracing::warn!(
                        match_id = %id,
                        status = e.status_code(),
                        error = %e,
                        "Dropping match after failed detail fetch"
                    );
                    emit(
                        on_progress,
                        SyncProgress::DetailError {
                            match_id: id,
                            error: e.to_string(),
                        },
                    );
                    result.failed += 1;
                }
                Ok((_, None)) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Detail fetch task failed");
                    result.failed += 1;
                }
            }
        }

        if stop.load(Ordering::Acquire) {
            result.rate_limited = true;
            break;
        }
    }

    emit(
        on_progress,
        SyncProgress::DetailsComplete {
            fetched: result.matches.len(),
            requested: ids.len(),
            rate_limited: result.rate_limited,
        },
    );

    result
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::http::MockTransport;
    use crate::riot::client::DEFAULT_TIMEOUT;

    fn setup() -> (MockTransport, RiotClient, ApiRateLimiter) {
        let transport = MockTransport::new();
        let client = RiotClient::new_with_transport(
            "https://riot.test",
            "k",
            DEFAULT_TIMEOUT,
            Arc::new(transport.clone()),
        )
        .expect("client");
        (transport, client, ApiRateLimiter::new(10_000))
    }

    fn detail(id: &str) -> serde_json::Value {
        json!({ "metadata": { "matchId": id }, "info": { "gameDuration": 1200 } })
    }

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("M{i}")).collect()
    }

    #[tokio::test]
    async fn preserves_input_order_across_batches() {
        let (transport, client, limiter) = setup();
        let ids = ids(5);
        for id in &ids {
            transport.push_json(client.match_url(id), &detail(id));
        }

        let out = fetch_details(&client, &ids, &limiter, 4, 2, None).await;
        let got: Vec<_> = out.matches.iter().map(|m| m.match_id.clone()).collect();
        assert_eq!(got, ids);
        assert!(!out.rate_limited);
        assert_eq!(out.failed, 0);
        assert_eq!(transport.request_count(), 5);
    }

    #[tokio::test]
    async fn errors_are_dropped_not_fatal() {
        let (transport, client, limiter) = setup();
        let ids = ids(3);
        transport.push_json(client.match_url("M0"), &detail("M0"));
        transport.push_status(client.match_url("M1"), 500, "boom");
        transport.push_json(client.match_url("M2"), &detail("M2"));

        let out = fetch_details(&client, &ids, &limiter, 3, 20, None).await;
        let got: Vec<_> = out.matches.iter().map(|m| m.match_id.as_str()).collect();
        assert_eq!(got, vec!["M0", "M2"]);
        assert_eq!(out.failed, 1);
        assert!(!out.rate_limited);
    }

    #[tokio::test]
    async fn rate_limit_stops_later_batches() {
        let (transport, client, limiter) = setup();
        let ids = ids(6);
        transport.push_json(client.match_url("M0"), &detail("M0"));
        transport.push_rate_limited(client.match_url("M1"), Some("10"));
        for id in &ids[2..] {
            transport.push_json(client.match_url(id), &detail(id));
        }

        let out = fetch_details(&client, &ids, &limiter, 2, 2, None).await;
        assert!(out.rate_limited);
        assert!(out.matches.iter().all(|m| m.match_id != "M1"));
        assert!(transport.request_count() <= 2);
        let requested: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
        for id in &ids[2..] {
            assert!(!requested.contains(&client.match_url(id)), "{id} was requested");
        }
    }

    #[tokio::test]
    async fn emits_progress_events() {
        let (transport, client, limiter) = setup();
        let ids = ids(2);
        for id in &ids {
            transport.push_json(client.match_url(id), &detail(id));
        }

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            sink.lock().expect("lock").push(event);
        });

        let out = fetch_details(&client, &ids, &limiter, 2, 2, Some(&callback)).await;
        assert_eq!(out.matches.len(), 2);

        let events = events.lock().expect("lock");
        assert!(matches!(
            events.first(),
            Some(SyncProgress::FetchingDetails { count: 2, .. })
        ));
        assert!(matches!(
            events.last(),
            Some(SyncProgress::DetailsComplete {
                fetched: 2,
                requested: 2,
                rate_limited: false
            })
        ));
    }

    #[tokio::test]
    async fn empty_input_makes_no_requests() {
        let (transport, client, limiter) = setup();
        let out = fetch_details(&client, &[], &limiter, 20, 20, None).await;
        assert!(out.matches.is_empty());
        assert_eq!(transport.request_count(), 0);
    }
}
