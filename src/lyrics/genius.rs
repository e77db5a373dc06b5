//! Genius lyrics backend
//!
//! Genius does not serve lyrics through its API, so this is search-then-scrape:
//! the API search finds the song page URL, and the page HTML is scraped.
//!
//! API: https://docs.genius.com/#search-h2

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::LyricsBackend;
use super::extract::extract_lyrics;
use crate::http::{Request, Transport};
use crate::text::{slugify, strip_annotations};

// Search response DTOs. Only the fields we read are declared.

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    result: SongResult,
}

#[derive(Debug, Deserialize)]
struct SongResult {
    url: String,
    primary_artist: PrimaryArtist,
}

#[derive(Debug, Deserialize)]
struct PrimaryArtist {
    name: String,
}

/// Clean up an artist/title pair before searching.
///
/// Annotations like `(Live)` or `[Remix]` are dropped from the title and
/// featured artists are cut from the artist. Only the artist is trimmed.
pub fn search_terms(artist: &str, title: &str) -> (String, String) {
    let title = strip_annotations(title);
    let artist = match artist.find("feat.") {
        Some(idx) => &artist[..idx],
        None => artist,
    };
    (artist.trim().to_string(), title)
}

/// Genius backend
pub struct Genius {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_key: String,
}

impl Genius {
    pub fn new(transport: Arc<dyn Transport>, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: "https://api.genius.com".to_string(),
            api_key: api_key.into(),
        }
    }

    /// Create a backend for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::new(transport, "test-token")
        }
    }

    fn search(&self, artist: &str, title: &str) -> Option<SearchResponse> {
        let request = Request::get(format!("{}/search", self.base_url))
            .query("q", format!("{} {}", title, artist.to_lowercase()))
            .header("Authorization", format!("Bearer {}", self.api_key));

        match self.transport.get(&request).and_then(|r| r.json()) {
            Ok(data) => Some(data),
            Err(e) => {
                debug!("genius: invalid search response: {}", e);
                None
            }
        }
    }

    fn get_page(&self, url: &str) -> Option<String> {
        let response = match self.transport.get(&Request::get(url)) {
            Ok(response) => response,
            Err(e) => {
                debug!("request failed: {}", e);
                return None;
            }
        };

        if response.status() != 200 {
            debug!("failed to fetch: {} ({})", url, response.status());
            return None;
        }

        match response.text() {
            Ok(html) => Some(html),
            Err(e) => {
                debug!("failed to read {}: {}", url, e);
                None
            }
        }
    }
}

impl LyricsBackend for Genius {
    fn name(&self) -> &'static str {
        "genius"
    }

    fn fetch(&self, artist: &str, title: &str) -> Option<String> {
        let (artist, title) = search_terms(artist, title);
        let data = self.search(&artist, &title)?;

        let wanted = slugify(&artist);
        let Some(hit) = data
            .response
            .hits
            .into_iter()
            .find(|hit| slugify(&hit.result.primary_artist.name) == wanted)
        else {
            debug!("No matching artist {}", artist);
            return None;
        };

        let html = self.get_page(&hit.result.url)?;
        extract_lyrics(&html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::INSTRUMENTAL;
    use crate::test_utils::MockTransport;
    use serde_json::json;

    fn hits(entries: &[(&str, &str)]) -> serde_json::Value {
        let hits: Vec<serde_json::Value> = entries
            .iter()
            .map(|(name, url)| json!({"type": "song", "result": {"url": url, "primary_artist": {"name": name}}}))
            .collect();
        json!({"meta": {"status": 200}, "response": {"hits": hits}})
    }

    #[test]
    fn test_search_terms() {
        assert_eq!(
            search_terms("Artist A feat. Artist B", "Song (Remix)"),
            ("Artist A".to_string(), "Song ".to_string())
        );
        assert_eq!(
            search_terms("Mark Ronson feat. Bruno Mars", "Uptown Funk (Live) [Remix]"),
            ("Mark Ronson".to_string(), "Uptown Funk  ".to_string())
        );
        assert_eq!(
            search_terms("Björk", "Jóga"),
            ("Björk".to_string(), "Jóga".to_string())
        );
    }

    #[test]
    fn test_fetch_matches_artist_by_slug() {
        let transport = Arc::new(
            MockTransport::new()
                .route_json(
                    "http://genius/search",
                    hits(&[
                        ("Cover Band", "http://genius/cover-band-song"),
                        ("Beyoncé", "http://genius/beyonce-halo-lyrics"),
                    ]),
                )
                .route_html(
                    "http://genius/beyonce-halo-lyrics",
                    r#"<div class="lyrics">Remember those walls I built</div>"#,
                ),
        );
        let genius = Genius::with_base_url(transport.clone(), "http://genius");

        let lyrics = genius.fetch("Beyonce", "Halo").unwrap();
        assert_eq!(lyrics, "Remember those walls I built");

        let recorded = transport.recorded();
        assert_eq!(recorded[0].query, vec![("q".to_string(), "Halo beyonce".to_string())]);
        assert!(recorded[0].headers.contains(&(
            "Authorization".to_string(),
            "Bearer test-token".to_string()
        )));
        assert_eq!(recorded[1].url, "http://genius/beyonce-halo-lyrics");
    }

    #[test]
    fn test_fetch_no_matching_artist() {
        let transport = Arc::new(MockTransport::new().route_json(
            "http://genius/search",
            hits(&[("Someone Else", "http://genius/other")]),
        ));
        let genius = Genius::with_base_url(transport.clone(), "http://genius");

        assert_eq!(genius.fetch("Portishead", "Roads"), None);
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_fetch_invalid_json() {
        let transport =
            Arc::new(MockTransport::new().route_html("http://genius/search", "<html>oops</html>"));
        let genius = Genius::with_base_url(transport, "http://genius");
        assert_eq!(genius.fetch("Portishead", "Roads"), None);
    }

    #[test]
    fn test_fetch_page_error() {
        let transport = Arc::new(
            MockTransport::new()
                .route_json("http://genius/search", hits(&[("Portishead", "http://genius/roads")]))
                .route("http://genius/roads", 500, "text/html", "server error"),
        );
        let genius = Genius::with_base_url(transport, "http://genius");
        assert_eq!(genius.fetch("Portishead", "Roads"), None);
    }

    #[test]
    fn test_fetch_instrumental() {
        let transport = Arc::new(
            MockTransport::new()
                .route_json("http://genius/search", hits(&[("Explosions in the Sky", "http://genius/song")]))
                .route_html(
                    "http://genius/song",
                    r#"<div class="LyricsPlaceholder__Message-uen8er-2">This song is an instrumental</div>"#,
                ),
        );
        let genius = Genius::with_base_url(transport, "http://genius");
        assert_eq!(
            genius.fetch("Explosions In The Sky", "Your Hand in Mine"),
            Some(INSTRUMENTAL.to_string())
        );
    }

    #[test]
    fn test_network_failure() {
        let genius = Genius::with_base_url(Arc::new(MockTransport::new()), "http://genius");
        assert_eq!(genius.fetch("A", "B"), None);
    }
}
