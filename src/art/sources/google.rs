//! Google Custom Search image source
//!
//! Searches for `"{artist},{album}"` and yields every image link returned.
//! Requires an API key and a search engine ID (`cx`).
//!
//! API: https://developers.google.com/custom-search/v1/overview

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::art::{ArtSource, Candidate, MatchCriterion, MatchKind, SourceKind};
use crate::http::{Request, Transport};
use crate::model::Album;

const SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Search response body. Either `items` or `error` is present.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    error: Option<SearchError>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

#[derive(Debug, Deserialize)]
struct SearchError {
    #[serde(default)]
    errors: Vec<SearchErrorDetail>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchErrorDetail {
    reason: String,
}

/// Google image search source
pub struct GoogleSource {
    transport: Arc<dyn Transport>,
    base_url: String,
    key: String,
    engine: String,
}

impl GoogleSource {
    pub fn new(transport: Arc<dyn Transport>, key: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: SEARCH_URL.to_string(),
            key: key.into(),
            engine: engine.into(),
        }
    }

    /// Create a source for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::new(transport, "test-key", "test-cx")
        }
    }

    fn search(&self, album: &Album) -> Vec<Candidate> {
        if album.artist.is_empty() || album.title.is_empty() {
            return Vec::new();
        }

        let request = Request::get(&self.base_url)
            .query("key", &self.key)
            .query("cx", &self.engine)
            .query("q", format!("{},{}", album.artist, album.title))
            .query("searchType", "image");

        let data: SearchResponse = match self.transport.get(&request).and_then(|r| r.json()) {
            Ok(data) => data,
            Err(e) => {
                debug!("google: error loading response: {}", e);
                return Vec::new();
            }
        };

        if let Some(error) = data.error {
            let reason = error
                .errors
                .first()
                .map(|e| e.reason.as_str())
                .or(error.message.as_deref())
                .unwrap_or("unknown");
            debug!("google fetchart error: {}", reason);
            return Vec::new();
        }

        data.items
            .into_iter()
            .map(|item| Candidate::remote(SourceKind::Google, item.link, MatchKind::Exact))
            .collect()
    }
}

impl ArtSource for GoogleSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Google
    }

    fn criterion(&self) -> MatchCriterion {
        MatchCriterion::Default
    }

    fn candidates<'a>(&'a self, album: &'a Album) -> Box<dyn Iterator<Item = Candidate> + 'a> {
        Box::new(std::iter::once_with(move || self.search(album)).flatten())
    }
}
