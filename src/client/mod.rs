//! Varnish purge client

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::PurgeError;

#[cfg(test)]
pub mod mock;
pub mod varnish;

#[cfg(test)]
pub use mock::MockPurgeClient;
pub use varnish::VarnishClient;

/// Upper bound on a single purge round trip
pub const PURGE_TIMEOUT: Duration = Duration::from_secs(10);

/// A single purge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeRequest {
    /// `Host` header value identifying what to invalidate
    pub target_host: String,

    /// Headers sent with the request; always includes `Host`
    pub headers: BTreeMap<String, String>,

    /// `host[:port]` of the cache server, resolved at call time
    pub server_address: String,
}

impl PurgeRequest {
    /// Build a purge-all request for `host` against `server_address`
    pub fn for_host(host: &str, server_address: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Host".to_string(), host.to_string());

        Self {
            target_host: host.to_string(),
            headers,
            server_address: server_address.trim().to_string(),
        }
    }

    /// Target URL on the cache server
    pub fn url(&self) -> String {
        format!("http://{}/", self.server_address)
    }
}

/// Result of a purge attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeOutcome {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PurgeOutcome {
    pub fn succeeded(status: u16) -> Self {
        Self {
            success: true,
            http_status: Some(status),
            error_message: None,
        }
    }

    pub fn failed(err: &PurgeError, status: Option<u16>) -> Self {
        Self {
            success: false,
            http_status: status,
            error_message: Some(err.to_string()),
        }
    }
}

/// Sends purge requests to a cache server
#[async_trait]
pub trait PurgeApi: Send + Sync {
    /// Perform a purge. Never retries; failures are reported in the outcome.
    async fn purge(&self, request: &PurgeRequest) -> PurgeOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_for_host() {
        let request = PurgeRequest::for_host("example.com", " cache.local:6081 ");
        assert_eq!(request.url(), "http://cache.local:6081/");
        assert_eq!(request.headers.get("Host").map(String::as_str), Some("example.com"));
        assert_eq!(request.target_host, "example.com");
    }

    #[test]
    fn test_outcome_serializes_camel_case() {
        let outcome = PurgeOutcome::failed(&PurgeError::NonSuccessStatus(503), Some(503));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["httpStatus"], 503);
        assert_eq!(json["errorMessage"], "HTTP Status Code: 503");
    }

    #[test]
    fn test_success_outcome_omits_error() {
        let json = serde_json::to_value(PurgeOutcome::succeeded(200)).unwrap();
        assert!(json.get("errorMessage").is_none());
    }
}
