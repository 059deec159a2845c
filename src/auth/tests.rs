//! Tests for session storage and token refresh

use super::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// SessionStore
// ============================================================================

#[tokio::test]
async fn test_session_store_starts_empty() {
    let store = SessionStore::new();
    assert!(store.access_token().await.is_none());
    assert!(!store.is_authenticated().await);
}

#[tokio::test]
async fn test_session_store_set_and_clear() {
    let store = SessionStore::new();

    store.set_access_token("abc123").await;
    assert_eq!(store.access_token().await.as_deref(), Some("abc123"));
    assert!(store.is_authenticated().await);

    store.clear().await;
    assert!(store.access_token().await.is_none());
    assert!(!store.is_authenticated().await);
}

#[tokio::test]
async fn test_session_store_stamps_issue_time() {
    let before = chrono::Utc::now();
    let store = SessionStore::with_token("abc123");
    let token = store.token().await.unwrap();

    assert_eq!(token.token, "abc123");
    assert!(token.issued_at >= before);
    assert!(token.issued_at <= chrono::Utc::now());
}

#[tokio::test]
async fn test_session_store_clones_share_the_slot() {
    let store = SessionStore::new();
    let clone = store.clone();

    clone.set_access_token("shared").await;
    assert_eq!(store.access_token().await.as_deref(), Some("shared"));

    store.clear().await;
    assert!(clone.access_token().await.is_none());
}

// ============================================================================
// RefreshGate
// ============================================================================

#[tokio::test]
async fn test_gate_first_caller_leads() {
    let gate = RefreshGate::default();
    assert!(matches!(gate.begin().await, RefreshTicket::Leader));
}

#[tokio::test]
async fn test_gate_second_caller_follows_and_shares_success() {
    let gate = RefreshGate::default();

    let leader = gate.begin().await;
    assert!(matches!(leader, RefreshTicket::Leader));

    let follower = gate.begin().await;
    let RefreshTicket::Follower(rx) = follower else {
        panic!("second caller should wait on the in-flight refresh");
    };

    gate.complete(Ok("fresh-token".to_string())).await;
    assert_eq!(rx.await.unwrap().unwrap(), "fresh-token");
}

#[tokio::test]
async fn test_gate_failure_rejects_all_waiters_uniformly() {
    let gate = RefreshGate::default();
    let _leader = gate.begin().await;

    let mut receivers = Vec::new();
    for _ in 0..3 {
        match gate.begin().await {
            RefreshTicket::Follower(rx) => receivers.push(rx),
            RefreshTicket::Leader => panic!("only one leader per refresh"),
        }
    }

    gate.complete(Err(RefreshFailure {
        message: "grant revoked".to_string(),
    }))
    .await;

    for rx in receivers {
        let outcome = rx.await.unwrap();
        assert_eq!(outcome.unwrap_err().message, "grant revoked");
    }
}

#[tokio::test]
async fn test_gate_resets_after_completion() {
    let gate = RefreshGate::default();

    let _leader = gate.begin().await;
    gate.complete(Ok("token-1".to_string())).await;

    // A later 401 starts a fresh cycle with a new leader.
    assert!(matches!(gate.begin().await, RefreshTicket::Leader));
}

#[tokio::test]
async fn test_gate_completion_with_no_waiters_is_harmless() {
    let gate = RefreshGate::default();
    let _leader = gate.begin().await;
    gate.complete(Ok("token".to_string())).await;
}

// ============================================================================
// TokenRefresher
// ============================================================================

#[tokio::test]
async fn test_refresher_persists_new_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"accessToken": "fresh-token", "expiresIn": 900}
        })))
        .mount(&mock_server)
        .await;

    let session = SessionStore::with_token("stale-token");
    let refresher = TokenRefresher::new(
        reqwest::Client::new(),
        format!("{}/auth/refresh", mock_server.uri()),
        session.clone(),
    );

    let token = refresher.refresh().await.unwrap();
    assert_eq!(token, "fresh-token");
    assert_eq!(session.access_token().await.as_deref(), Some("fresh-token"));
}

#[tokio::test]
async fn test_refresher_failure_keeps_session_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_string("refresh cookie expired"))
        .mount(&mock_server)
        .await;

    let session = SessionStore::with_token("stale-token");
    let refresher = TokenRefresher::new(
        reqwest::Client::new(),
        format!("{}/auth/refresh", mock_server.uri()),
        session.clone(),
    );

    let err = refresher.refresh().await.unwrap_err();
    assert!(matches!(err, crate::error::Error::TokenRefresh { .. }));
    assert!(err.to_string().contains("401"));

    // Clearing the session on terminal failure is the client's job, not the
    // refresher's.
    assert_eq!(session.access_token().await.as_deref(), Some("stale-token"));
}

#[tokio::test]
async fn test_refresher_rejects_malformed_grant() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "wrong-shape"})))
        .mount(&mock_server)
        .await;

    let session = SessionStore::new();
    let refresher = TokenRefresher::new(
        reqwest::Client::new(),
        format!("{}/auth/refresh", mock_server.uri()),
        session.clone(),
    );

    assert!(refresher.refresh().await.is_err());
    assert!(session.access_token().await.is_none());
}
