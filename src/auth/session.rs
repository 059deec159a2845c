//! Client-side session state
//!
//! One mutable token slot, read by every outbound request and written only
//! by the refresh operation or at login/logout. The slot lives behind an
//! `Arc<RwLock>`, so clones of the store share the same session.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::warn;

/// A bearer access token together with the moment it was stored
#[derive(Debug, Clone)]
pub struct SessionToken {
    /// The raw access token string
    pub token: String,
    /// When the token was written into the store
    pub issued_at: DateTime<Utc>,
}

/// Shared session store
///
/// Cloning is cheap and every clone observes the same token slot, which is
/// how the client, the refresher, and test doubles stay in sync.
#[derive(Clone, Default)]
pub struct SessionStore {
    slot: Arc<RwLock<Option<SessionToken>>>,
}

impl SessionStore {
    /// Create an empty (unauthenticated) store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with a token, as after a completed sign-in
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(SessionToken {
                token: token.into(),
                issued_at: Utc::now(),
            }))),
        }
    }

    /// The current access token, if any
    pub async fn access_token(&self) -> Option<String> {
        self.slot.read().await.as_ref().map(|t| t.token.clone())
    }

    /// The current token with its metadata, if any
    pub async fn token(&self) -> Option<SessionToken> {
        self.slot.read().await.clone()
    }

    /// Store a new access token, stamping it with the current time
    pub async fn set_access_token(&self, token: impl Into<String>) {
        let mut slot = self.slot.write().await;
        *slot = Some(SessionToken {
            token: token.into(),
            issued_at: Utc::now(),
        });
    }

    /// Tear the session down
    pub async fn clear(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
    }

    /// Whether a token is currently present
    pub async fn is_authenticated(&self) -> bool {
        self.slot.read().await.is_some()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

/// Hook fired when the session is torn down for good
///
/// The client calls `session_expired` exactly once per terminal
/// authentication failure, after clearing the store. Hosts navigate to
/// their sign-in route here.
#[async_trait]
pub trait SessionObserver: Send + Sync {
    /// The session is gone; a new sign-in is required
    async fn session_expired(&self);
}

/// Default observer: records the teardown in the log and nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

#[async_trait]
impl SessionObserver for NullObserver {
    async fn session_expired(&self) {
        warn!("session expired, sign-in required");
    }
}
