use std::cell::RefCell;
use std::time::Duration;

use chrono::Utc;
use dadddeck_api::error::{RATE_LIMIT_EXCEEDED, UNAUTHORIZED};
use dadddeck_api::{
    run_with_retry, ApiError, CardFilters, Config, DadDeckClient, Page, Paginator, RateLimitInfo,
    RetryPolicy,
};
use httpmock::Method::GET;
use httpmock::MockServer;
use serde_json::json;
use tokio::time::Instant;

fn rate_limited(reset_in_secs: Option<i64>) -> ApiError {
    let rl = RateLimitInfo {
        limit: 100,
        remaining: 0,
        reset_at: reset_in_secs.map(|s| Utc::now() + chrono::Duration::seconds(s)),
        tier: "free".into(),
    };
    ApiError::new(RATE_LIMIT_EXCEEDED, "Too many requests")
        .with_status(429)
        .with_rate_limit(Some(rl))
}

fn gaps(stamps: &[Instant]) -> Vec<Duration> {
    stamps.windows(2).map(|w| w[1] - w[0]).collect()
}

#[tokio::test(start_paused = true)]
async fn always_rate_limited_hits_max_retries() {
    let stamps = RefCell::new(Vec::new());
    let out: Result<(), _> = run_with_retry(
        || {
            stamps.borrow_mut().push(Instant::now());
            // reset already passed, so the backoff alone decides the wait
            async { Err(rate_limited(Some(-5))) }
        },
        3,
        Duration::from_millis(1000),
        2.0,
    )
    .await;

    let err = out.unwrap_err();
    assert_eq!(err.code, "MAX_RETRIES");
    assert_eq!(err.last_error.as_ref().unwrap().code, RATE_LIMIT_EXCEEDED);
    assert_eq!(err.http_status, Some(429));

    let stamps = stamps.into_inner();
    assert_eq!(stamps.len(), 3);
    let g = gaps(&stamps);
    assert!(g[0] >= Duration::from_millis(1000), "first wait {:?}", g[0]);
    assert!(g[1] >= Duration::from_millis(2000), "second wait {:?}", g[1]);
}

#[tokio::test(start_paused = true)]
async fn server_reset_hint_outweighs_backoff() {
    let stamps = RefCell::new(Vec::new());
    let out: Result<(), _> = RetryPolicy::default()
        .with_max_retries(2)
        .run(|| {
            stamps.borrow_mut().push(Instant::now());
            async { Err(rate_limited(None)) }
        })
        .await;

    assert!(out.unwrap_err().is_max_retries());
    let g = gaps(&stamps.into_inner());
    assert_eq!(g.len(), 1);
    assert!(g[0] >= Duration::from_millis(60_000));
}

#[tokio::test(start_paused = true)]
async fn auth_error_raises_immediately() {
    let start = Instant::now();
    let calls = RefCell::new(0);
    let out: Result<(), _> = RetryPolicy::default()
        .run(|| {
            *calls.borrow_mut() += 1;
            async { Err(ApiError::new(UNAUTHORIZED, "Invalid API key").with_status(401)) }
        })
        .await;

    let err = out.unwrap_err();
    assert!(err.is_auth_error());
    assert!(err.last_error.is_none());
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(Instant::now() - start, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn success_returns_without_waiting() {
    let start = Instant::now();
    let out = RetryPolicy::default().run(|| async { Ok::<_, ApiError>(7) }).await;
    assert_eq!(out.unwrap(), 7);
    assert_eq!(Instant::now() - start, Duration::ZERO);
}

#[tokio::test]
async fn collect_all_walks_pages_in_order() {
    let calls = RefCell::new(Vec::new());
    let filters = CardFilters {
        rarity: Some("rare".into()),
        ..Default::default()
    };
    let items = Paginator::default()
        .collect_all(
            |page, page_size, f: &CardFilters| {
                calls.borrow_mut().push((page, page_size, f.clone()));
                let n = if page < 3 { 100 } else { 17 };
                async move {
                    Ok(Page {
                        items: (0..n).map(|i| (page, i)).collect(),
                        has_next: page < 3,
                    })
                }
            },
            &filters,
        )
        .await
        .unwrap();

    assert_eq!(items.len(), 217);
    assert_eq!(items[0], (1, 0));
    assert_eq!(items[100], (2, 0));
    assert_eq!(items[216], (3, 16));
    let calls = calls.into_inner();
    let pages: Vec<u32> = calls.iter().map(|c| c.0).collect();
    assert_eq!(pages, vec![1, 2, 3]);
    assert!(calls.iter().all(|c| c.1 == 100 && c.2 == filters));
}

fn client_for(server: &MockServer) -> DadDeckClient {
    DadDeckClient::new(Config::new("k").with_base_url(server.base_url())).unwrap()
}

#[tokio::test]
async fn rate_limited_endpoint_is_retried_over_http() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/leaderboard");
            then.status(429)
                .header("X-RateLimit-Limit", "60")
                .header("X-RateLimit-Remaining", "0")
                .header("X-RateLimit-Reset", "0")
                .json_body(json!({
                    "error": {"code": "RATE_LIMIT_EXCEEDED", "message": "Too many requests"},
                    "meta": {"requestId": "req_rl"}
                }));
        })
        .await;

    let client = client_for(&server);
    let policy = RetryPolicy::default().with_initial_delay(Duration::from_millis(10));
    let err = policy
        .run(|| client.get_leaderboard(10, 0))
        .await
        .unwrap_err();

    m.assert_hits_async(3).await;
    assert!(err.is_max_retries());
    assert_eq!(err.request_id.as_deref(), Some("req_rl"));
    let last = err.last_error.unwrap();
    assert!(last.is_rate_limit_error());
    assert_eq!(last.rate_limit.unwrap().limit, 60);
}

#[tokio::test]
async fn validation_error_is_not_retried_over_http() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/leaderboard");
            then.status(400).json_body(json!({
                "error": {"code": "VALIDATION_ERROR", "message": "offset must be >= 0"}
            }));
        })
        .await;

    let client = client_for(&server);
    let err = RetryPolicy::default()
        .run(|| client.get_leaderboard(10, 0))
        .await
        .unwrap_err();
    m.assert_hits_async(1).await;
    assert_eq!(err.code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn get_all_cards_over_http() {
    let server = MockServer::start_async().await;
    let mut mocks = Vec::new();
    for (page, n, has_next) in [("1", 100, true), ("2", 100, true), ("3", 17, false)] {
        let cards: Vec<_> = (0..n).map(|i| json!({"id": format!("p{}_{}", page, i)})).collect();
        let m = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/cards")
                    .query_param("page", page)
                    .query_param("pageSize", "100")
                    .query_param("rarity", "rare");
                then.status(200).json_body(json!({
                    "data": {"cards": cards, "pagination": {"hasNext": has_next}},
                    "error": null,
                    "meta": {}
                }));
            })
            .await;
        mocks.push(m);
    }

    let filters = CardFilters {
        rarity: Some("rare".into()),
        ..Default::default()
    };
    let cards = client_for(&server)
        .get_all_cards(&filters, Paginator::default())
        .await
        .unwrap();

    for m in &mocks {
        m.assert_async().await;
    }
    assert_eq!(cards.len(), 217);
    assert_eq!(cards[0]["id"], json!("p1_0"));
    assert_eq!(cards[216]["id"], json!("p3_16"));
}
