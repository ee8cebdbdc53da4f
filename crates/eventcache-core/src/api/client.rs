//! API client for the participant schedule REST API.
//!
//! This module provides the `ApiClient` struct for the three read-only
//! endpoints. Requests are never retried; every failure is returned to the
//! caller as-is.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::models::{ParticipantEvents, ParticipantsResponse, Signature};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the hosted schedule API
pub const DEFAULT_BASE_URL: &str = "https://ifxrn9gwff.execute-api.us-east-1.amazonaws.com/Prod";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const PARTICIPANTS_PATH: &str = "/participants";
const EVENTS_PATH: &str = "/events";
const LAST_UPDATE_PATH: &str = "/last-update";

/// API client for the schedule service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the hosted API
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client for another deployment (or a test server).
    /// A trailing slash on `base_url` is ignored.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            return Err(ApiError::InvalidResponse(format!(
                "Empty response ({}) from {}",
                status,
                response.url()
            ))
            .into());
        }
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    // ===== Data Fetching Methods =====

    /// Fetch the list of participant names
    pub async fn fetch_participants(&self) -> Result<Vec<String>> {
        let url = self.url(PARTICIPANTS_PATH);
        let response: ParticipantsResponse = self.get(&url).await?;
        debug!(count = response.names.len(), "Fetched participant list");
        Ok(response.names)
    }

    /// Fetch the events for one participant.
    ///
    /// The name is percent-encoded with `%20` for spaces; reqwest's
    /// `.query()` would form-encode a space as `+`, which the API does not
    /// decode back.
    pub async fn fetch_events(&self, name: &str) -> Result<ParticipantEvents> {
        let url = format!("{}?name={}", self.url(EVENTS_PATH), urlencoding::encode(name));
        let events: ParticipantEvents = self.get(&url).await?;
        debug!(name = %events.name, count = events.events.len(), "Fetched participant events");
        Ok(events)
    }

    /// Fetch the server's last-update mapping and reduce it to a signature
    pub async fn fetch_last_update(&self) -> Result<Signature> {
        let url = self.url(LAST_UPDATE_PATH);
        let body: Value = self.get(&url).await?;
        let signature = Signature::from_response(&body)?;
        debug!(%signature, "Fetched server signature");
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_base_url_trailing_slash() {
        let api = ApiClient::with_base_url("http://localhost:9/Prod/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:9/Prod");
        assert_eq!(api.url(EVENTS_PATH), "http://localhost:9/Prod/events");
    }

    #[tokio::test]
    async fn test_fetch_participants() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/participants")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"names": ["Alice", "bob"]}"#)
            .create_async()
            .await;

        let api = ApiClient::with_base_url(&server.url()).unwrap();
        let names = api.fetch_participants().await.unwrap();

        assert_eq!(names, vec!["Alice", "bob"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_events_encodes_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/events")
            .match_query(Matcher::UrlEncoded("name".into(), "Zoë & Co".into()))
            .with_status(200)
            .with_body(r#"{"name": "Zoë & Co", "events": [{"id": 1}]}"#)
            .create_async()
            .await;

        let api = ApiClient::with_base_url(&server.url()).unwrap();
        let events = api.fetch_events("Zoë & Co").await.unwrap();

        assert_eq!(events.name, "Zoë & Co");
        assert_eq!(events.events, vec![serde_json::json!({"id": 1})]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_events_sends_space_as_percent_20() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/events")
            .match_query(Matcher::Exact("name=John%20Smith".into()))
            .with_status(200)
            .with_body(r#"{"name": "John Smith", "events": []}"#)
            .create_async()
            .await;

        let api = ApiClient::with_base_url(&server.url()).unwrap();
        let events = api.fetch_events("John Smith").await.unwrap();

        assert_eq!(events.name, "John Smith");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_last_update_joins_values() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/last-update")
            .with_status(200)
            .with_body(r#"{"b": "2024-05-01", "a": 7}"#)
            .create_async()
            .await;

        let api = ApiClient::with_base_url(&server.url()).unwrap();
        let signature = api.fetch_last_update().await.unwrap();
        assert_eq!(signature.as_str(), "2024-05-01,7");
    }

    #[tokio::test]
    async fn test_unknown_participant_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/events")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body("Participant 'nobody not found.")
            .create_async()
            .await;

        let api = ApiClient::with_base_url(&server.url()).unwrap();
        let err = api.fetch_events("nobody").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_no_content_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/last-update")
            .with_status(204)
            .create_async()
            .await;

        let api = ApiClient::with_base_url(&server.url()).unwrap();
        let err = api.fetch_last_update().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/participants")
            .with_status(500)
            .with_body("KeyError('names')")
            .expect(1)
            .create_async()
            .await;

        let api = ApiClient::with_base_url(&server.url()).unwrap();
        let err = api.fetch_participants().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::ServerError(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_json_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/participants")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let api = ApiClient::with_base_url(&server.url()).unwrap();
        let err = api.fetch_participants().await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON response"));
    }
}
