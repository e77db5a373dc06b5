//! Wikipedia source, queried through DBpedia
//!
//! DBpedia's SPARQL endpoint maps an artist/album pair to the Wikipedia page
//! ID and the cover image filename. The Wikipedia API then resolves that
//! filename to an image URL.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::art::{ArtSource, Candidate, MatchCriterion, MatchKind, SourceKind};
use crate::http::{Request, Transport};
use crate::model::Album;

const DBPEDIA_URL: &str = "https://dbpedia.org/sparql";
const WIKIPEDIA_URL: &str = "https://en.wikipedia.org/w/api.php";

const SPARQL_QUERY: &str = r#"PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX dbpprop: <http://dbpedia.org/property/>
PREFIX owl: <http://dbpedia.org/ontology/>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX foaf: <http://xmlns.com/foaf/0.1/>
SELECT DISTINCT ?pageId ?coverFilename WHERE {
  ?subject owl:wikiPageID ?pageId .
  ?subject dbpprop:name ?name .
  ?subject rdfs:label ?label .
  { ?subject dbpprop:artist ?artist }
    UNION
  { ?subject owl:artist ?artist }
  { ?artist foaf:name "{artist}"@en }
    UNION
  { ?artist dbpprop:name "{artist}"@en }
  ?subject rdf:type <http://dbpedia.org/ontology/Album> .
  ?subject dbpprop:cover ?coverFilename .
  FILTER ( regex(?name, "{album}", "i") )
}
Limit 1"#;

// DBpedia SPARQL JSON results

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<Binding>,
}

#[derive(Debug, Deserialize)]
struct Binding {
    #[serde(rename = "coverFilename")]
    cover_filename: BoundValue,
    #[serde(rename = "pageId")]
    page_id: BoundValue,
}

#[derive(Debug, Deserialize)]
struct BoundValue {
    value: String,
}

// Wikipedia query API

#[derive(Debug, Deserialize)]
struct WikiResponse {
    query: WikiQuery,
}

#[derive(Debug, Deserialize)]
struct WikiQuery {
    #[serde(default)]
    pages: BTreeMap<String, WikiPage>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    #[serde(default)]
    images: Vec<WikiImage>,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct WikiImage {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: String,
}

/// Title-case each alphabetic run, the way DBpedia labels artist names.
///
/// Letters following a non-letter are upper-cased and every other letter is
/// lower-cased, so `"they're"` becomes `"They'Re"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

fn sparql_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Build the DBpedia query for an album.
pub fn sparql_query(artist: &str, album: &str) -> String {
    SPARQL_QUERY
        .replace("{artist}", &sparql_literal(&title_case(artist)))
        .replace("{album}", &sparql_literal(album))
}

/// If DBpedia truncated the filename (`"File:Foo .jpg"` style), return the
/// part before and after the `" ."`.
fn incomplete_filename(filename: &str) -> Option<(&str, &str)> {
    let (lpart, rpart) = filename.rsplit_once(" .")?;
    if rpart.contains('.') {
        None
    } else {
        Some((lpart, rpart))
    }
}

/// Wikipedia cover source
pub struct WikipediaSource {
    transport: Arc<dyn Transport>,
    dbpedia_url: String,
    wikipedia_url: String,
}

impl WikipediaSource {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            dbpedia_url: DBPEDIA_URL.to_string(),
            wikipedia_url: WIKIPEDIA_URL.to_string(),
        }
    }

    /// Create a source for testing with custom endpoints
    #[cfg(test)]
    pub fn with_base_urls(
        transport: Arc<dyn Transport>,
        dbpedia_url: impl Into<String>,
        wikipedia_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            dbpedia_url: dbpedia_url.into(),
            wikipedia_url: wikipedia_url.into(),
        }
    }

    fn fetch<T: DeserializeOwned>(&self, request: Request, what: &str) -> Option<T> {
        let request = request.header("Content-Type", "application/json");
        match self.transport.get(&request).and_then(|r| r.json()) {
            Ok(data) => Some(data),
            Err(e) => {
                debug!("wikipedia: error loading {} response: {}", what, e);
                None
            }
        }
    }

    fn wiki_request(&self) -> Request {
        Request::get(&self.wikipedia_url)
            .query("format", "json")
            .query("action", "query")
            .query("continue", "")
    }

    /// Look up the cover filename and page ID on DBpedia.
    fn lookup_dbpedia(&self, album: &Album) -> Option<(String, String)> {
        let request = Request::get(&self.dbpedia_url)
            .query("format", "application/sparql-results+json")
            .query("timeout", "2500")
            .query("query", sparql_query(&album.artist, &album.title));

        let data: SparqlResponse = self.fetch(request, "dbpedia")?;
        let Some(binding) = data.results.bindings.into_iter().next() else {
            debug!("wikipedia: album not found on dbpedia");
            return None;
        };

        Some((
            format!("File:{}", binding.cover_filename.value),
            binding.page_id.value,
        ))
    }

    /// Recover a truncated filename by scanning the page's images.
    fn complete_filename(&self, filename: String, page_id: &str) -> Option<String> {
        let Some((lpart, rpart)) = incomplete_filename(&filename) else {
            return Some(filename);
        };
        debug!("wikipedia: dbpedia provided incomplete cover_filename");

        let pattern = format!(r"^{}.*?\.{}", regex::escape(lpart), regex::escape(rpart));
        let matcher = match regex::Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                debug!("wikipedia: bad filename pattern: {}", e);
                return None;
            }
        };

        let request = self
            .wiki_request()
            .query("prop", "images")
            .query("pageids", page_id);
        let data: WikiResponse = self.fetch(request, "page images")?;

        let Some(page) = data.query.pages.get(page_id) else {
            debug!("wikipedia: failed to retrieve a cover_filename");
            return None;
        };

        // No match keeps the truncated name; the imageinfo lookup decides
        Some(
            page.images
                .iter()
                .find(|image| matcher.is_match(&image.title))
                .map(|image| image.title.clone())
                .unwrap_or(filename),
        )
    }

    /// Resolve a `File:` title to its image URL.
    fn image_url(&self, filename: &str) -> Option<String> {
        let request = self
            .wiki_request()
            .query("prop", "imageinfo")
            .query("iiprop", "url")
            .query("titles", filename);
        let data: WikiResponse = self.fetch(request, "imageinfo")?;

        let url = data
            .query
            .pages
            .into_values()
            .find_map(|page| page.imageinfo.into_iter().next().map(|info| info.url));
        if url.is_none() {
            debug!("wikipedia: error scraping imageinfo");
        }
        url
    }

    fn lookup(&self, album: &Album) -> Option<Candidate> {
        if album.artist.is_empty() || album.title.is_empty() {
            return None;
        }

        let (filename, page_id) = self.lookup_dbpedia(album)?;
        let filename = self.complete_filename(filename, &page_id)?;
        let url = self.image_url(&filename)?;

        Some(Candidate::remote(SourceKind::Wikipedia, url, MatchKind::Exact))
    }
}

impl ArtSource for WikipediaSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Wikipedia
    }

    fn criterion(&self) -> MatchCriterion {
        MatchCriterion::Default
    }

    fn candidates<'a>(&'a self, album: &'a Album) -> Box<dyn Iterator<Item = Candidate> + 'a> {
        Box::new(std::iter::once_with(move || self.lookup(album)).flatten())
    }
}
