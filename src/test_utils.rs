//! Test utilities and fixtures for metadata-retriever tests.
//!
//! Provides a scripted [`MockTransport`] so sources and lyrics backends
//! can run against canned responses, plus image and entity fixtures.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{MockTransport, jpeg_bytes};
//!
//! let transport = MockTransport::new()
//!     .route("coverartarchive.org", 200, "image/jpeg", jpeg_bytes());
//! let response = transport.get(&Request::get("https://coverartarchive.org/x"));
//! ```

use std::io::Cursor;
use std::sync::Mutex;

use image::{ImageFormat, Rgb, RgbImage};

use crate::http::{FetchError, Request, Response, Transport};
use crate::model::{Album, Track};

/// A canned response served for every URL containing `pattern`.
#[derive(Debug, Clone)]
struct Route {
    pattern: String,
    status: u16,
    content_type: String,
    body: Vec<u8>,
}

/// Transport that answers from a fixed routing table.
///
/// Routes are matched in insertion order against the request's full URL
/// (query included) by substring. An unmatched request fails with
/// [`FetchError::Transport`], which is how tests simulate a dead host.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Vec<Route>,
    recorded: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with the given status and content type.
    pub fn route(
        mut self,
        pattern: impl Into<String>,
        status: u16,
        content_type: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.routes.push(Route {
            pattern: pattern.into(),
            status,
            content_type: content_type.into(),
            body: body.into(),
        });
        self
    }

    /// Serve a JSON document with status 200.
    pub fn route_json(self, pattern: impl Into<String>, value: serde_json::Value) -> Self {
        self.route(pattern, 200, "application/json", value.to_string())
    }

    /// Serve an HTML page with status 200.
    pub fn route_html(self, pattern: impl Into<String>, html: &str) -> Self {
        self.route(pattern, 200, "text/html; charset=utf-8", html)
    }

    /// Full URLs of every request made so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.recorded().iter().map(Request::full_url).collect()
    }

    /// Every request made so far, in order.
    pub fn recorded(&self) -> Vec<Request> {
        self.recorded.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Transport for MockTransport {
    fn get(&self, request: &Request) -> Result<Response, FetchError> {
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.push(request.clone());
        }

        let url = request.full_url();
        let route = self
            .routes
            .iter()
            .find(|r| url.contains(&r.pattern))
            .ok_or_else(|| FetchError::Transport(format!("no route for {}", url)))?;

        Ok(Response::new(
            route.status,
            vec![("Content-Type".to_string(), route.content_type.clone())],
            Box::new(Cursor::new(route.body.clone())),
        ))
    }
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, format)
        .expect("Failed to encode fixture image");
    bytes.into_inner()
}

/// A small valid JPEG.
pub fn jpeg_bytes() -> Vec<u8> {
    jpeg_bytes_sized(8, 8)
}

/// A valid JPEG with the given dimensions.
pub fn jpeg_bytes_sized(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

/// A small valid PNG.
pub fn png_bytes() -> Vec<u8> {
    png_bytes_sized(8, 8)
}

/// A valid PNG with the given dimensions.
pub fn png_bytes_sized(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// Creates a mock Album with MusicBrainz IDs and no directory.
///
/// Customize using struct update syntax:
///
/// ```ignore
/// let album = Album { path: Some(dir), ..mock_album() };
/// ```
pub fn mock_album() -> Album {
    Album {
        mb_albumid: Some("1b022e01-4da6-387b-8658-8678046e4cef".to_string()),
        mb_releasegroupid: Some("48140466-cff6-3222-bd55-63c27e43190d".to_string()),
        ..Album::new("Pink Floyd", "The Dark Side of the Moon")
    }
}

/// Creates a mock Track with no lyrics.
pub fn mock_track() -> Track {
    Track {
        album: "Rumours".to_string(),
        ..Track::new("Fleetwood Mac", "Dreams")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transport_routes_by_substring() {
        let transport = MockTransport::new().route_json("/search", serde_json::json!({"ok": true}));

        let response = transport
            .get(&Request::get("https://api.example.com/search").query("q", "x"))
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(
            transport.requests(),
            vec!["https://api.example.com/search?q=x".to_string()]
        );
    }

    #[test]
    fn test_mock_transport_unrouted_fails() {
        let transport = MockTransport::new();
        let result = transport.get(&Request::get("https://nowhere"));
        assert!(matches!(result, Err(FetchError::Transport(_))));
        assert_eq!(transport.recorded().len(), 1);
    }

    #[test]
    fn test_image_fixtures_decode() {
        let jpeg = image::load_from_memory(&jpeg_bytes_sized(12, 6)).unwrap();
        assert_eq!((jpeg.width(), jpeg.height()), (12, 6));
        assert_eq!(
            image::guess_format(&png_bytes()).unwrap(),
            ImageFormat::Png
        );
    }
}
