//! HTTP purge client for Varnish

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, StatusCode};

use super::{PURGE_TIMEOUT, PurgeApi, PurgeOutcome, PurgeRequest};
use crate::error::{PurgeError, Result};

/// Sends `PURGE` requests over plain HTTP
pub struct VarnishClient {
    http: HttpClient,
    method: Method,
}

impl VarnishClient {
    /// Create a client with the standard 10 second timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(PURGE_TIMEOUT)
    }

    /// Create a client with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        // The cache server is a trusted internal host; certificate checks do not apply
        let http = HttpClient::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(PurgeError::from)?;

        let method =
            Method::from_bytes(b"PURGE").map_err(|e| PurgeError::Transport(e.to_string()))?;

        Ok(Self { http, method })
    }
}

#[async_trait]
impl PurgeApi for VarnishClient {
    async fn purge(&self, request: &PurgeRequest) -> PurgeOutcome {
        if request.server_address.is_empty() {
            log::warn!("Purge for {} skipped: no server configured", request.target_host);
            return PurgeOutcome::failed(&PurgeError::NoServerConfigured, None);
        }

        let url = request.url();
        log::debug!("PURGE {} (Host: {})", url, request.target_host);

        let mut builder = self.http.request(self.method.clone(), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = PurgeError::from(e);
                log::warn!("Purge for {} failed: {}", request.target_host, err);
                return PurgeOutcome::failed(&err, None);
            }
        };

        let status = response.status();
        if status == StatusCode::OK {
            log::info!("Purged {} via {}", request.target_host, url);
            PurgeOutcome::succeeded(status.as_u16())
        } else {
            let err = PurgeError::NonSuccessStatus(status.as_u16());
            log::warn!("Purge for {} failed: {}", request.target_host, err);
            PurgeOutcome::failed(&err, Some(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(VarnishClient::new().is_ok());
    }

    #[tokio::test]
    async fn test_empty_server_fails_without_network() {
        let client = VarnishClient::new().unwrap();
        let request = PurgeRequest::for_host("example.com", "");

        let outcome = client.purge(&request).await;

        assert!(!outcome.success);
        assert_eq!(outcome.error_message.as_deref(), Some("no server configured"));
        assert_eq!(outcome.http_status, None);
    }

    #[tokio::test]
    async fn test_purge_success_on_200() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PURGE", "/")
            .match_header("host", "example.com")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let client = VarnishClient::new().unwrap();
        let request = PurgeRequest::for_host("example.com", &server.host_with_port());
        let outcome = client.purge(&request).await;

        mock.assert_async().await;
        assert!(outcome.success);
        assert_eq!(outcome.http_status, Some(200));
        assert_eq!(outcome.error_message, None);
    }

    #[tokio::test]
    async fn test_purge_non_200_is_failure() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PURGE", "/")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let client = VarnishClient::new().unwrap();
        let request = PurgeRequest::for_host("example.com", &server.host_with_port());
        let outcome = client.purge(&request).await;

        // exactly one round trip, no retry
        mock.assert_async().await;
        assert!(!outcome.success);
        assert_eq!(outcome.http_status, Some(503));
        assert!(outcome.error_message.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_purge_other_2xx_is_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PURGE", "/")
            .with_status(204)
            .create_async()
            .await;

        let client = VarnishClient::new().unwrap();
        let request = PurgeRequest::for_host("example.com", &server.host_with_port());
        let outcome = client.purge(&request).await;

        assert!(!outcome.success);
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("HTTP Status Code: 204")
        );
    }

    #[tokio::test]
    async fn test_purge_transport_failure() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = VarnishClient::with_timeout(Duration::from_secs(2)).unwrap();
        let request = PurgeRequest::for_host("example.com", &addr.to_string());
        let outcome = client.purge(&request).await;

        assert!(!outcome.success);
        assert_eq!(outcome.http_status, None);
        assert!(!outcome.error_message.unwrap().is_empty());
    }
}
