//! Token refresh: single-flight gate and the refresh call itself
//!
//! Concurrent 401s right after a token expires must not fan out into
//! parallel refresh calls; each could invalidate the others' grants.
//! Exactly one caller becomes the leader and performs the refresh, everyone
//! else parks a waiter on the gate and shares the leader's outcome.

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{oneshot, Mutex};
use tracing::{info, warn};

use super::session::SessionStore;
use crate::error::{Error, Result};

/// Why a refresh came up empty, in a form waiters can share
#[derive(Debug, Clone)]
pub struct RefreshFailure {
    /// Rendered description of the underlying error
    pub message: String,
}

impl From<&Error> for RefreshFailure {
    fn from(err: &Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

impl From<RefreshFailure> for Error {
    fn from(failure: RefreshFailure) -> Self {
        Error::TokenRefresh {
            message: failure.message,
        }
    }
}

pub(crate) type RefreshOutcome = std::result::Result<String, RefreshFailure>;

/// What a caller holding a 401 gets back from the gate
pub(crate) enum RefreshTicket {
    /// No refresh underway; the holder must refresh and then `complete`
    Leader,
    /// A refresh is in flight; await the shared outcome
    Follower(oneshot::Receiver<RefreshOutcome>),
}

#[derive(Default)]
struct GateState {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Single-flight coordinator for token refreshes
#[derive(Default)]
pub(crate) struct RefreshGate {
    state: Mutex<GateState>,
}

impl RefreshGate {
    /// Join the current refresh, or become its leader
    pub(crate) async fn begin(&self) -> RefreshTicket {
        let mut state = self.state.lock().await;
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            RefreshTicket::Follower(rx)
        } else {
            state.in_flight = true;
            RefreshTicket::Leader
        }
    }

    /// Settle the refresh and wake every waiter with the same outcome
    ///
    /// Resets `in_flight` regardless of success or failure, so the next 401
    /// after this point starts a fresh cycle.
    pub(crate) async fn complete(&self, outcome: RefreshOutcome) {
        let mut state = self.state.lock().await;
        state.in_flight = false;
        let waiters = std::mem::take(&mut state.waiters);
        drop(state);

        for waiter in waiters {
            // A waiter may have been dropped along with its caller.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Performs the actual refresh call and persists the new token
///
/// The refresh goes out on a bare transport: no dispatch queue, no retry,
/// no bearer header. The refresh credential is a cookie held by the
/// transport's cookie store.
pub struct TokenRefresher {
    transport: Client,
    refresh_url: String,
    session: SessionStore,
}

impl TokenRefresher {
    /// Create a refresher posting to `refresh_url` on the given transport
    pub fn new(transport: Client, refresh_url: impl Into<String>, session: SessionStore) -> Self {
        Self {
            transport,
            refresh_url: refresh_url.into(),
            session,
        }
    }

    /// Obtain a new access token and store it in the session
    pub async fn refresh(&self) -> Result<String> {
        info!("refreshing access token");

        let response = self
            .transport
            .post(&self.refresh_url)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, "token refresh rejected");
            return Err(Error::TokenRefresh {
                message: format!("refresh request failed with status {status}: {body}"),
            });
        }

        let envelope: RefreshEnvelope = response.json().await.map_err(Error::Http)?;
        let token = envelope.data.access_token;

        self.session.set_access_token(token.clone()).await;
        Ok(token)
    }

    /// The URL this refresher posts to
    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }
}

impl std::fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("refresh_url", &self.refresh_url)
            .finish_non_exhaustive()
    }
}

/// Refresh endpoint envelope: `{"data": {"accessToken": ...}}`
#[derive(Debug, Deserialize)]
struct RefreshEnvelope {
    data: RefreshGrant,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshGrant {
    access_token: String,
}
