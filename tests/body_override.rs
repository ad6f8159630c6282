//! End-to-end tests for body overrides through the proxy.

use std::sync::atomic::Ordering;

use reqwest::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};

mod common;

const RESPONSE_ONLY: &str =
    r#"{"body.Modifier": {"scope": ["response"], "contentType": "text/plain", "body": "aGVsbG8="}}"#;

const REQUEST_AND_RESPONSE: &str =
    r#"{"body.Modifier": {"scope": ["request", "response"], "contentType": "text/plain", "body": "aGVsbG8="}}"#;

#[tokio::test]
async fn test_response_scope_rewrites_upstream_response() {
    let (backend, hits) = common::start_mock_backend().await;
    let proxy = common::start_proxy(Some(backend), RESPONSE_ONLY).await;

    let res = common::client()
        .get(format!("http://{}/resource", proxy.addr))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()[CONTENT_TYPE], "text/plain");
    assert_eq!(res.headers()[CONTENT_LENGTH], "5");
    assert!(res.headers().get(CONTENT_ENCODING).is_none());
    assert_eq!(res.headers()["x-upstream"], "mock");
    assert_eq!(res.text().await.unwrap(), "hello");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_response_scope_rewrites_chunked_upstream_response() {
    let (backend, hits) = common::start_chunked_backend().await;
    let proxy = common::start_proxy(Some(backend), RESPONSE_ONLY).await;

    let res = common::client()
        .get(format!("http://{}/stream", proxy.addr))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers().get("transfer-encoding").is_none());
    assert!(res.headers().get(CONTENT_ENCODING).is_none());
    assert_eq!(res.headers()[CONTENT_LENGTH], "5");
    assert_eq!(res.headers()[CONTENT_TYPE], "text/plain");
    assert_eq!(res.text().await.unwrap(), "hello");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_request_scope_skips_round_trip() {
    let (backend, hits) = common::start_mock_backend().await;
    let proxy = common::start_proxy(Some(backend), REQUEST_AND_RESPONSE).await;
    let client = common::client();

    for _ in 0..3 {
        let res = client
            .post(format!("http://{}/submit", proxy.addr))
            .body("ignored")
            .send()
            .await
            .expect("Proxy unreachable");

        assert_eq!(res.status(), 200);
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(res.headers()[CONTENT_LENGTH], "5");
        assert!(res.headers().get("x-upstream").is_none());
        assert_eq!(res.text().await.unwrap(), "hello");
    }

    assert_eq!(hits.load(Ordering::SeqCst), 0, "upstream must not be contacted");
}

#[tokio::test]
async fn test_skipped_round_trip_needs_no_upstream() {
    // Forward mode with a target that does not exist.
    let proxy = common::start_proxy(None, REQUEST_AND_RESPONSE).await;

    let res = common::client()
        .get(format!("http://{}/", proxy.addr))
        .header("host", "upstream.invalid")
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "hello");
}

#[tokio::test]
async fn test_empty_chain_passes_through() {
    let (backend, hits) = common::start_mock_backend().await;
    let proxy = common::start_proxy(Some(backend), "[]").await;

    let res = common::client()
        .get(format!("http://{}/", proxy.addr))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(res.headers()[CONTENT_ENCODING], "gzip");
    assert_eq!(res.text().await.unwrap(), common::UPSTREAM_BODY);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let upstream = common::closed_addr().await;
    let proxy = common::start_proxy(Some(upstream), RESPONSE_ONLY).await;

    let res = common::client()
        .get(format!("http://{}/", proxy.addr))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 502);
    assert!(res.headers().get("x-request-id").is_some());
}
