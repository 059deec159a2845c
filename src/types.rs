//! Common types used throughout cadence-http
//!
//! This module contains shared type definitions, type aliases,
//! and the wire envelope returned by the remote API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::PATCH => reqwest::Method::PATCH,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

// ============================================================================
// Response Envelope
// ============================================================================

/// Standard response envelope returned by the remote API on success.
///
/// Every endpoint wraps its payload the same way:
/// `{"responseStatus": 200, "responseMessage": "OK", "data": ...}`.
/// The client passes the envelope through unmodified; decoding into
/// `Envelope<T>` is the caller's choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T = JsonValue> {
    /// Numeric status reported by the API (distinct from the HTTP status)
    pub response_status: i64,
    /// Human-readable outcome message
    pub response_message: String,
    /// Endpoint-specific payload
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_conversion() {
        let get: reqwest::Method = Method::GET.into();
        assert_eq!(reqwest::Method::GET, get);
        let patch: reqwest::Method = Method::PATCH.into();
        assert_eq!(reqwest::Method::PATCH, patch);
    }

    #[test]
    fn test_method_default() {
        assert_eq!(Method::default(), Method::GET);
    }

    #[test]
    fn test_envelope_deserialize_camel_case() {
        let raw = r#"{
            "responseStatus": 200,
            "responseMessage": "OK",
            "data": {"items": [1, 2, 3]}
        }"#;

        let envelope: Envelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.response_status, 200);
        assert_eq!(envelope.response_message, "OK");
        assert_eq!(envelope.data["items"][2], 3);
    }

    #[test]
    fn test_envelope_typed_data() {
        #[derive(Debug, Deserialize)]
        struct User {
            id: u64,
            name: String,
        }

        let raw = r#"{
            "responseStatus": 200,
            "responseMessage": "OK",
            "data": [{"id": 1, "name": "Alice"}]
        }"#;

        let envelope: Envelope<Vec<User>> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data[0].id, 1);
        assert_eq!(envelope.data[0].name, "Alice");
    }
}
