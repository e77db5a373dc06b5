//! MusicBrainz HTTP client
//!
//! Handles communication with the MusicBrainz web service.
//! See: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! IMPORTANT: MusicBrainz requires a User-Agent header (set by the
//! transport) and rate limits to 1 req/sec.

use std::sync::Arc;

use super::dto;
use crate::http::{FetchError, Request, Transport};

/// Errors from a MusicBrainz lookup
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Release group not found")]
    NotFound,

    #[error("Rate limited by MusicBrainz")]
    RateLimited,

    #[error("API request failed: {0}")]
    Api(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// MusicBrainz API client
pub struct MusicBrainzClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl MusicBrainzClient {
    /// Create a new client
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: "https://musicbrainz.org/ws/2".to_string(),
        }
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// Look up a release group including its releases
    pub fn release_group(
        &self,
        release_group_id: &str,
    ) -> Result<dto::ReleaseGroupResponse, LookupError> {
        let request = Request::get(format!("{}/release-group/{}", self.base_url, release_group_id))
            .query("inc", "releases")
            .query("fmt", "json");

        let response = self.transport.get(&request)?;

        match response.status() {
            404 => return Err(LookupError::NotFound),
            429 | 503 => return Err(LookupError::RateLimited),
            _ => {}
        }

        if !response.is_success() {
            let status = response.status();
            // Try to parse error response
            if let Ok(error) = response.json::<dto::ApiError>() {
                return Err(LookupError::Api(error.error));
            }
            return Err(FetchError::Status(status).into());
        }

        Ok(response.json::<dto::ReleaseGroupResponse>()?)
    }

    /// IDs of every release in a release group, in API order
    pub fn release_ids(&self, release_group_id: &str) -> Result<Vec<String>, LookupError> {
        let group = self.release_group(release_group_id)?;
        Ok(group.releases.into_iter().map(|r| r.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockTransport;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = MusicBrainzClient::new(Arc::new(MockTransport::new()));
        assert_eq!(client.base_url, "https://musicbrainz.org/ws/2");
    }

    #[test]
    fn test_release_ids() {
        let transport = Arc::new(MockTransport::new().route_json(
            "http://mb/release-group/rg-1",
            json!({"id": "rg-1", "title": "Dummy", "releases": [{"id": "a"}, {"id": "b"}]}),
        ));
        let client = MusicBrainzClient::with_base_url(transport.clone(), "http://mb");

        assert_eq!(client.release_ids("rg-1").unwrap(), vec!["a", "b"]);
        assert_eq!(
            transport.requests(),
            vec!["http://mb/release-group/rg-1?inc=releases&fmt=json"]
        );
    }

    #[test]
    fn test_not_found() {
        let transport = Arc::new(MockTransport::new().route(
            "http://mb/",
            404,
            "application/json",
            r#"{"error": "Not Found"}"#,
        ));
        let client = MusicBrainzClient::with_base_url(transport, "http://mb");
        assert!(matches!(client.release_ids("nope"), Err(LookupError::NotFound)));
    }

    #[test]
    fn test_api_error_body() {
        let transport = Arc::new(MockTransport::new().route(
            "http://mb/",
            400,
            "application/json",
            r#"{"error": "Invalid mbid."}"#,
        ));
        let client = MusicBrainzClient::with_base_url(transport, "http://mb");
        match client.release_group("bad") {
            Err(LookupError::Api(message)) => assert_eq!(message, "Invalid mbid."),
            other => panic!("unexpected result: {:?}", other.map(|g| g.id)),
        }
    }

    #[test]
    fn test_rate_limited() {
        let transport = Arc::new(MockTransport::new().route("http://mb/", 503, "text/html", "slow down"));
        let client = MusicBrainzClient::with_base_url(transport, "http://mb");
        assert!(matches!(client.release_ids("x"), Err(LookupError::RateLimited)));
    }
}
