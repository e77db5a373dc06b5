//! Detect cover art files already present in the album directory.
//!
//! Images whose filename contains one of the configured cover names as a
//! word (`cover.jpg`, `Folder.PNG`, `album-front.jpeg`) are yielded first,
//! ordered by the cover name's position in the list. Any other image follows
//! as a fuzzy match unless cautious mode is on.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::art::mime::ImageType;
use crate::art::{ArtSource, Candidate, MatchCriterion, MatchKind, SourceKind};
use crate::model::Album;

/// Local directory source
pub struct FilesystemSource {
    cover_names: Vec<String>,
    cautious: bool,
}

impl FilesystemSource {
    pub fn new(cover_names: &[String], cautious: bool) -> Self {
        Self {
            cover_names: cover_names.iter().map(|n| n.to_lowercase()).collect(),
            cautious,
        }
    }

    /// Priority of a file stem: the index of the first cover name it contains.
    fn cover_rank(&self, stem: &str) -> Option<usize> {
        let stem = stem.to_lowercase();
        let words: Vec<&str> = stem
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        self.cover_names
            .iter()
            .position(|name| words.contains(&name.as_str()))
    }

    fn scan(&self, dir: &Path) -> Vec<Candidate> {
        let images = match list_images(dir) {
            Ok(images) => images,
            Err(e) => {
                debug!("filesystem: cannot read {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut exact: Vec<(usize, PathBuf)> = Vec::new();
        let mut fuzzy: Vec<PathBuf> = Vec::new();
        for path in images {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            match self.cover_rank(stem) {
                Some(rank) => exact.push((rank, path)),
                None => fuzzy.push(path),
            }
        }
        // Stable: equal ranks keep filename order
        exact.sort_by_key(|(rank, _)| *rank);

        let mut candidates: Vec<Candidate> = exact
            .into_iter()
            .map(|(_, path)| Candidate::local(SourceKind::Filesystem, path, MatchKind::Exact))
            .collect();

        if !self.cautious {
            candidates.extend(
                fuzzy
                    .into_iter()
                    .map(|path| Candidate::local(SourceKind::Filesystem, path, MatchKind::Fuzzy)),
            );
        }

        debug!(
            "filesystem: {} image(s) usable in {}",
            candidates.len(),
            dir.display()
        );
        candidates
    }
}

/// Image files directly inside `dir`, sorted by filename.
fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|s| s.to_str())
                .and_then(ImageType::from_extension)
                .is_some()
        })
        .collect();
    images.sort();
    Ok(images)
}

impl ArtSource for FilesystemSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Filesystem
    }

    fn criterion(&self) -> MatchCriterion {
        MatchCriterion::Default
    }

    fn candidates<'a>(&'a self, album: &'a Album) -> Box<dyn Iterator<Item = Candidate> + 'a> {
        let Some(dir) = album.path.as_deref() else {
            return Box::new(std::iter::empty());
        };
        Box::new(std::iter::once_with(move || self.scan(dir)).flatten())
    }
}
