//! Candidate retrieval: download, sniff, and store in a scoped temp file.
//!
//! A failed fetch is not an error from the caller's point of view; it just
//! leaves `candidate.path` unset so validation rejects it and the engine
//! moves on to the next candidate.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::mime::{self, ImageType, SNIFF_LEN};
use super::{Candidate, CandidatePath, Origin};
use crate::http::{Request, Transport};

/// Resize proxy used when `maxwidth` is configured.
const PROXY_URL: &str = "https://images.weserv.nl/";

/// Chunk size used when streaming downloads to disk.
const CHUNK_SIZE: usize = 1024;

/// Build a URL on the resize proxy that serves `url` at most `maxwidth` wide.
pub fn proxy_url(maxwidth: u32, url: &str) -> String {
    let target = url.strip_prefix("http://").unwrap_or(url);
    format!(
        "{}?url={}&w={}",
        PROXY_URL,
        urlencoding::encode(target),
        maxwidth
    )
}

/// Fetches candidate images.
#[derive(Clone)]
pub struct Downloader {
    transport: Arc<dyn Transport>,
    maxwidth: u32,
}

impl Downloader {
    pub fn new(transport: Arc<dyn Transport>, maxwidth: u32) -> Self {
        Self {
            transport,
            maxwidth,
        }
    }

    /// Fetch and sniff a candidate, filling in its path on success.
    pub fn get_image(&self, candidate: &mut Candidate) {
        match candidate.origin.clone() {
            Origin::Remote(url) => self.download(candidate, &url),
            Origin::Local(path) => inspect_local(candidate, &path),
        }
    }

    fn download(&self, candidate: &mut Candidate, url: &str) {
        let url = if self.maxwidth > 0 && candidate.resizable {
            proxy_url(self.maxwidth, url)
        } else {
            url.to_string()
        };

        debug!("downloading image: {}", url);
        let mut response = match self.transport.get(&Request::get(&url)) {
            Ok(response) => response,
            Err(e) => {
                debug!("error fetching art: {}", e);
                return;
            }
        };

        if !response.is_success() {
            debug!("error fetching art: HTTP {} for {}", response.status(), url);
            return;
        }

        let declared = response.content_type().map(str::to_string);
        let mut chunks = response.chunks(CHUNK_SIZE);

        let mut header = Vec::with_capacity(SNIFF_LEN);
        while header.len() < SNIFF_LEN {
            match chunks.next() {
                Some(Ok(chunk)) => header.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    debug!("error reading art download: {}", e);
                    return;
                }
                None => break,
            }
        }

        if header.is_empty() {
            debug!("server returned no data for {}", url);
            return;
        }

        let Some(classification) = mime::classify(&header, declared.as_deref()) else {
            debug!(
                "not a supported image: {}",
                declared.as_deref().unwrap_or("unknown content type")
            );
            return;
        };

        let image_type = classification.image_type;
        if classification.corrected {
            warn!(
                "Server specified {}, but returned a {} image. Correcting the extension to .{}",
                declared.as_deref().unwrap_or("no content type"),
                image_type.mime(),
                image_type.extension()
            );
        }

        let written = write_temp(image_type, &header, chunks.by_ref());
        let (file, bytes) = match written {
            Ok(result) => result,
            Err(e) => {
                debug!("error storing art download: {}", e);
                return;
            }
        };

        let temp_path = file.into_temp_path();
        debug!("downloaded art to: {}", temp_path.display());

        candidate.dimensions = read_dimensions(&temp_path);
        candidate.bytes = Some(bytes);
        candidate.image_type = Some(image_type);
        candidate.path = Some(CandidatePath::Temp(temp_path));
    }
}

/// Write the already-read header plus the rest of the stream to a temp file
/// carrying the right extension.
fn write_temp(
    image_type: ImageType,
    header: &[u8],
    rest: impl Iterator<Item = std::io::Result<Vec<u8>>>,
) -> std::io::Result<(NamedTempFile, u64)> {
    let mut file = tempfile::Builder::new()
        .prefix("metadata-retriever-")
        .suffix(&format!(".{}", image_type.extension()))
        .tempfile()?;

    file.write_all(header)?;
    let mut bytes = header.len() as u64;
    for chunk in rest {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        bytes += chunk.len() as u64;
    }
    file.flush()?;

    Ok((file, bytes))
}

/// Sniff a file that is already on disk.
fn inspect_local(candidate: &mut Candidate, path: &Path) {
    let mut header = Vec::with_capacity(SNIFF_LEN);
    let read = File::open(path).and_then(|f| f.take(SNIFF_LEN as u64).read_to_end(&mut header));
    if let Err(e) = read {
        debug!("could not read local art {}: {}", path.display(), e);
        return;
    }

    // A file name is not a declaration: local files must sniff as an image
    let Some(image_type) = mime::sniff(&header) else {
        debug!("not a supported image: {}", path.display());
        return;
    };

    let named = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ImageType::from_extension);
    if named != Some(image_type) {
        warn!(
            "{} is a {} image despite its extension",
            path.display(),
            image_type.mime()
        );
    }

    candidate.bytes = std::fs::metadata(path).ok().map(|m| m.len());
    candidate.dimensions = read_dimensions(path);
    candidate.image_type = Some(image_type);
    candidate.path = Some(CandidatePath::Local(path.to_path_buf()));
}

/// Pixel dimensions, if the image decoder can read the header.
fn read_dimensions(path: &Path) -> Option<(u32, u32)> {
    image::ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}
