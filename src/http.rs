//! Blocking HTTP fetch adapter.
//!
//! Every provider talks to the network through the [`Transport`] trait so
//! that sources and lyrics backends can be exercised against scripted
//! responses in tests. The production implementation wraps
//! `reqwest::blocking::Client`.
//!
//! A request is a single attempt: no retries, no redirects beyond what the
//! underlying client does on its own. Callers decide whether a failure
//! means "try the next candidate".

use std::collections::HashMap;
use std::io::{self, Read};
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::HttpConfig;

/// Errors raised by the fetch adapter.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, DNS or TLS failure
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server answered with a non-success status
    #[error("HTTP {0}")]
    Status(u16),

    /// Body could not be decoded into the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("IO error while reading body: {0}")]
    Io(#[from] io::Error),
}

/// A GET request with query parameters and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The URL with all query parameters percent-encoded and appended.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, separator, query)
    }
}

/// Response with a streamable body.
pub struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl Response {
    /// Build a response. Header names are stored lower-cased.
    pub fn new(
        status: u16,
        headers: impl IntoIterator<Item = (String, String)>,
        body: Box<dyn Read + Send>,
    ) -> Self {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The server-declared `Content-Type`, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Iterate over the body in chunks of at most `size` bytes.
    pub fn chunks(&mut self, size: usize) -> Chunks<'_> {
        Chunks {
            body: &mut self.body,
            buf: vec![0; size.max(1)],
        }
    }

    /// Read the whole body as text. Invalid UTF-8 sequences are dropped.
    pub fn text(mut self) -> Result<String, FetchError> {
        let mut bytes = Vec::new();
        self.body.read_to_end(&mut bytes)?;
        Ok(crate::text::decode_utf8(&bytes))
    }

    /// Read the whole body and decode it as JSON.
    pub fn json<T: DeserializeOwned>(mut self) -> Result<T, FetchError> {
        let mut bytes = Vec::new();
        self.body.read_to_end(&mut bytes)?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

/// Chunked reader over a response body.
pub struct Chunks<'a> {
    body: &'a mut Box<dyn Read + Send>,
    buf: Vec<u8>,
}

impl Iterator for Chunks<'_> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.body.read(&mut self.buf) {
                Ok(0) => return None,
                Ok(n) => return Some(Ok(self.buf[..n].to_vec())),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Single-attempt blocking GET.
///
/// Implementations must report every failure as a [`FetchError`]; nothing
/// may panic past this boundary.
pub trait Transport: Send + Sync {
    fn get(&self, request: &Request) -> Result<Response, FetchError>;
}

/// Production transport backed by `reqwest::blocking`.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Create a transport with the configured user agent and timeout.
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .gzip(true)
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, request: &Request) -> Result<Response, FetchError> {
        let mut builder = self.client.get(request.full_url());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(e.to_string())
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Ok(Response::new(status, headers, Box::new(response)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn response(status: u16, content_type: &str, body: &[u8]) -> Response {
        Response::new(
            status,
            vec![("Content-Type".to_string(), content_type.to_string())],
            Box::new(Cursor::new(body.to_vec())),
        )
    }

    #[test]
    fn test_full_url_encodes_query() {
        let request = Request::get("https://example.com/search")
            .query("q", "Song Artist")
            .query("type", "a&b");
        assert_eq!(
            request.full_url(),
            "https://example.com/search?q=Song%20Artist&type=a%26b"
        );
    }

    #[test]
    fn test_full_url_without_query() {
        let request = Request::get("https://example.com/x?y=1");
        assert_eq!(request.full_url(), "https://example.com/x?y=1");
    }

    #[test]
    fn test_full_url_appends_to_existing_query() {
        let request = Request::get("https://example.com/x?y=1").query("z", "2");
        assert_eq!(request.full_url(), "https://example.com/x?y=1&z=2");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let resp = response(200, "image/png", b"");
        assert_eq!(resp.header("CONTENT-TYPE"), Some("image/png"));
        assert_eq!(resp.content_type(), Some("image/png"));
    }

    #[test]
    fn test_chunks_split_body() {
        let mut resp = response(200, "text/plain", b"abcdefghij");
        let chunks: Vec<Vec<u8>> = resp.chunks(4).map(|c| c.unwrap()).collect();
        assert_eq!(chunks, vec![b"abcd".to_vec(), b"efgh".to_vec(), b"ij".to_vec()]);
    }

    #[test]
    fn test_text_drops_invalid_utf8() {
        let resp = response(200, "text/html", b"caf\xffe");
        assert_eq!(resp.text().unwrap(), "cafe");
    }

    #[test]
    fn test_json_malformed_body() {
        let resp = response(200, "text/html", b"<html>not json</html>");
        let result: Result<serde_json::Value, _> = resp.json();
        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }
}
