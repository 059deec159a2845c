// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Cadence HTTP
//!
//! A paced, self-authenticating HTTP client for REST admin APIs.
//!
//! ## Features
//!
//! - **Serialized Dispatch**: all requests flow through a single FIFO queue,
//!   one in flight at a time, with a fixed gap between calls
//! - **Rate-Limit Retry**: bounded exponential backoff on HTTP 429
//! - **Single-Flight Refresh**: one token refresh repairs every request
//!   caught by a session expiry; the originals are replayed transparently
//! - **Session Store**: one explicit token slot with accessor methods and a
//!   sign-in observer hook for session teardown
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cadence_http::{endpoints, Envelope, HttpClient, HttpClientConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = HttpClientConfig::builder()
//!         .base_url("https://api.example.com")
//!         .build();
//!     let client = HttpClient::with_config(config);
//!
//!     client.session().set_access_token("<token from sign-in>").await;
//!
//!     // 429s are retried and expired sessions repaired behind this call.
//!     let listings: Envelope = client.get_json(endpoints::LISTINGS).await?;
//!     println!("{}", listings.response_message);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! caller ──> HttpClient ──> SerialQueue ──> reqwest transport
//!                │                              │
//!                │<── 429: backoff, re-enqueue ─┤
//!                │<── 401: RefreshGate ─────────┤
//!                │         (leader refreshes via bare transport,
//!                │          followers wait, everyone replays)
//!                └──> SessionStore (token slot, observer hook)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// Session storage and token refresh
pub mod auth;

/// Serialized request dispatch
pub mod queue;

/// HTTP client with rate-limit retry and refresh-and-replay
pub mod http;

/// URL templates for the admin REST API
pub mod endpoints;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::{Envelope, Method};

pub use auth::{SessionObserver, SessionStore, SessionToken};
pub use http::{HttpClient, HttpClientConfig, RequestConfig};
pub use queue::SerialQueue;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
