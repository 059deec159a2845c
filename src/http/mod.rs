//! HTTP client module
//!
//! Provides the authenticated HTTP client: serialized dispatch, bearer
//! injection, rate-limit retry, and refresh-and-replay on session expiry.
//!
//! # Features
//!
//! - **Queue-Backed Dispatch**: every call re-enters the FIFO queue, retries
//!   included
//! - **Bearer Injection**: the session token is attached as the request
//!   leaves, so replays pick up a refreshed token automatically
//! - **429 Backoff**: bounded exponential retry
//! - **401 Repair**: single-flight refresh with request replay

mod client;

pub use client::{HttpClient, HttpClientConfig, RequestConfig};
