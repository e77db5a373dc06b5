//! Cover art lookup, download and selection.
//!
//! # Architecture
//!
//! - **Sources** (`sources/`) - Strategies that turn an [`Album`] into a lazy
//!   sequence of [`Candidate`]s (URLs or local files, no bytes yet)
//! - **Download** (`download.rs`) - Fetches a candidate, sniffs its type and
//!   stores it in a scoped temp file
//! - **Mime** (`mime.rs`) - Magic-number sniffing and the allowed image types
//! - **Engine** (`engine.rs`) - Tries sources in priority order and returns
//!   the first candidate that passes validation
//!
//! A candidate's temp file is deleted when the candidate is dropped, so a
//! rejected download never outlives the attempt that produced it. Only
//! [`Candidate::commit_to`] keeps the bytes.

pub mod download;
pub mod engine;
pub mod mime;
pub mod sources;

use std::fmt;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::error::{Error, Result};
use crate::model::Album;

pub use download::Downloader;
pub use engine::ArtFetcher;
pub use mime::ImageType;

/// The kinds of art source this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Filesystem,
    CoverArt,
    Google,
    Wikipedia,
}

impl SourceKind {
    /// Every source, in default priority order.
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Filesystem,
        SourceKind::CoverArt,
        SourceKind::Google,
        SourceKind::Wikipedia,
    ];

    /// Name used in config files and stored as `art_source`.
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Filesystem => "filesystem",
            SourceKind::CoverArt => "coverart",
            SourceKind::Google => "google",
            SourceKind::Wikipedia => "wikipedia",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SourceKind::Filesystem => "Filesystem",
            SourceKind::CoverArt => "Cover Art Archive",
            SourceKind::Google => "Google Images",
            SourceKind::Wikipedia => "Wikipedia (queried through DBpedia)",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Local sources read the filesystem and never touch the network.
    pub fn is_local(self) -> bool {
        matches!(self, SourceKind::Filesystem)
    }

    /// Matching criteria this source supports.
    pub fn criteria(self) -> &'static [MatchCriterion] {
        match self {
            SourceKind::CoverArt => &[MatchCriterion::Release, MatchCriterion::ReleaseGroup],
            _ => &[MatchCriterion::Default],
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a source correlates remote data with a local album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchCriterion {
    /// Text search on artist/album or a directory scan
    Default,
    /// Exact MusicBrainz release ID
    Release,
    /// Exact MusicBrainz release group ID
    ReleaseGroup,
}

impl MatchCriterion {
    pub fn name(self) -> &'static str {
        match self {
            MatchCriterion::Default => "default",
            MatchCriterion::Release => "release",
            MatchCriterion::ReleaseGroup => "releasegroup",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(MatchCriterion::Default),
            "release" => Some(MatchCriterion::Release),
            "releasegroup" => Some(MatchCriterion::ReleaseGroup),
            _ => None,
        }
    }
}

/// Declared confidence that a candidate belongs to the album.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// Validation state of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    #[default]
    Unchecked,
    Accepted,
    Rejected,
}

/// Where a candidate's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Remote(String),
    Local(PathBuf),
}

/// Location of a fetched candidate's bytes.
#[derive(Debug)]
pub enum CandidatePath {
    /// Downloaded; deleted on drop unless committed
    Temp(TempPath),
    /// Already on disk; never deleted
    Local(PathBuf),
}

impl CandidatePath {
    pub fn as_path(&self) -> &Path {
        match self {
            CandidatePath::Temp(temp) => &**temp,
            CandidatePath::Local(path) => path.as_path(),
        }
    }
}

/// A potential cover image for one album.
#[derive(Debug)]
pub struct Candidate {
    pub source: SourceKind,
    pub origin: Origin,
    pub match_kind: MatchKind,
    /// Route the download through the resize proxy when `maxwidth` is set
    pub resizable: bool,
    /// Set by a successful fetch
    pub path: Option<CandidatePath>,
    pub image_type: Option<ImageType>,
    /// Size of the fetched file in bytes
    pub bytes: Option<u64>,
    /// Pixel dimensions of the fetched file, when decodable
    pub dimensions: Option<(u32, u32)>,
    pub status: Validation,
}

/// Final acceptance policy applied after a fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationPolicy {
    /// Minimum width in pixels (0 = no constraint)
    pub minwidth: u32,
}

impl Candidate {
    fn new(source: SourceKind, origin: Origin, match_kind: MatchKind) -> Self {
        Self {
            source,
            origin,
            match_kind,
            resizable: true,
            path: None,
            image_type: None,
            bytes: None,
            dimensions: None,
            status: Validation::Unchecked,
        }
    }

    /// A candidate that still has to be downloaded.
    pub fn remote(source: SourceKind, url: impl Into<String>, match_kind: MatchKind) -> Self {
        Self::new(source, Origin::Remote(url.into()), match_kind)
    }

    /// A candidate already present on disk.
    pub fn local(source: SourceKind, path: impl Into<PathBuf>, match_kind: MatchKind) -> Self {
        Self::new(source, Origin::Local(path.into()), match_kind)
    }

    /// Skip the resize proxy for this candidate.
    pub fn without_resize(mut self) -> Self {
        self.resizable = false;
        self
    }

    pub fn url(&self) -> Option<&str> {
        match &self.origin {
            Origin::Remote(url) => Some(url.as_str()),
            Origin::Local(_) => None,
        }
    }

    /// Path of the fetched bytes, if the fetch succeeded.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref().map(CandidatePath::as_path)
    }

    /// Apply the final policy and record the result.
    pub fn validate(&mut self, policy: &ValidationPolicy) -> Validation {
        self.status = if self.path.is_none() || self.image_type.is_none() {
            Validation::Rejected
        } else if policy.minwidth > 0 {
            match self.dimensions {
                Some((width, _)) if width >= policy.minwidth => Validation::Accepted,
                _ => Validation::Rejected,
            }
        } else {
            Validation::Accepted
        };
        self.status
    }

    pub fn is_accepted(&self) -> bool {
        self.status == Validation::Accepted
    }

    /// Move (or copy, for local files) the accepted image to `dest`.
    ///
    /// Consumes the candidate; a temp download is renamed into place and
    /// falls back to a copy when `dest` lives on another filesystem.
    pub fn commit_to(self, dest: &Path) -> Result<PathBuf> {
        if !self.is_accepted() {
            return Err(Error::persist(dest, "candidate was not accepted"));
        }

        match self.path {
            Some(CandidatePath::Temp(temp)) => {
                if let Err(e) = temp.persist(dest) {
                    let temp = e.path;
                    std::fs::copy(&temp, dest)
                        .map_err(|err| Error::persist(dest, err.to_string()))?;
                }
                // Temp files are created owner-only
                make_world_readable(dest)?;
            }
            Some(CandidatePath::Local(src)) => {
                if src != dest {
                    std::fs::copy(&src, dest)
                        .map_err(|err| Error::persist(dest, err.to_string()))?;
                }
            }
            None => return Err(Error::persist(dest, "candidate has no file")),
        }

        Ok(dest.to_path_buf())
    }
}

#[cfg(unix)]
fn make_world_readable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
        .map_err(|e| Error::persist(path, e.to_string()))
}

#[cfg(not(unix))]
fn make_world_readable(_path: &Path) -> Result<()> {
    Ok(())
}

/// A strategy for locating cover art from one origin.
///
/// Configuration is bound at construction. `candidates` must be cheap to
/// call: any network work happens when the returned iterator is first
/// polled, so the engine pays nothing for sources it never reaches.
pub trait ArtSource {
    fn kind(&self) -> SourceKind;

    /// The criterion this instance was configured to match by.
    fn criterion(&self) -> MatchCriterion;

    /// Lazily produce candidates for `album`. Finite and not restartable.
    fn candidates<'a>(&'a self, album: &'a Album) -> Box<dyn Iterator<Item = Candidate> + 'a>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn accepted_local(path: &Path) -> Candidate {
        let mut candidate = Candidate::local(SourceKind::Filesystem, path, MatchKind::Exact);
        candidate.path = Some(CandidatePath::Local(path.to_path_buf()));
        candidate.image_type = Some(ImageType::Jpeg);
        candidate.validate(&ValidationPolicy::default());
        candidate
    }

    #[test]
    fn test_source_names_roundtrip() {
        for kind in SourceKind::ALL {
            assert_eq!(SourceKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(SourceKind::from_name("amazon"), None);
    }

    #[test]
    fn test_only_filesystem_is_local() {
        assert!(SourceKind::Filesystem.is_local());
        assert!(!SourceKind::CoverArt.is_local());
        assert!(!SourceKind::Google.is_local());
        assert!(!SourceKind::Wikipedia.is_local());
    }

    #[test]
    fn test_criteria() {
        assert!(SourceKind::CoverArt.criteria().contains(&MatchCriterion::Release));
        assert_eq!(SourceKind::Google.criteria(), &[MatchCriterion::Default]);
        assert_eq!(MatchCriterion::from_name("releasegroup"), Some(MatchCriterion::ReleaseGroup));
    }

    #[test]
    fn test_validate_without_path_rejects() {
        let mut candidate =
            Candidate::remote(SourceKind::Google, "http://x/y.jpg", MatchKind::Exact);
        assert_eq!(candidate.status, Validation::Unchecked);
        assert_eq!(candidate.validate(&ValidationPolicy::default()), Validation::Rejected);
        assert!(!candidate.is_accepted());
    }

    #[test]
    fn test_validate_minwidth() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cover.jpg");
        std::fs::write(&path, b"x").unwrap();

        let mut candidate = accepted_local(&path);
        candidate.dimensions = Some((300, 300));
        let policy = ValidationPolicy { minwidth: 500 };
        assert_eq!(candidate.validate(&policy), Validation::Rejected);

        candidate.dimensions = Some((600, 600));
        assert_eq!(candidate.validate(&policy), Validation::Accepted);

        candidate.dimensions = None;
        assert_eq!(candidate.validate(&policy), Validation::Rejected);
    }

    #[test]
    fn test_commit_local_copies() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("scan.jpg");
        std::fs::write(&src, b"jpeg data").unwrap();
        let dest = temp.path().join("cover.jpg");

        let committed = accepted_local(&src).commit_to(&dest).unwrap();
        assert_eq!(committed, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jpeg data");
        assert!(src.exists());
    }

    #[test]
    fn test_commit_temp_moves_file() {
        let temp = TempDir::new().unwrap();
        let file = tempfile::NamedTempFile::new_in(temp.path()).unwrap();
        std::fs::write(file.path(), b"png data").unwrap();
        let temp_path = file.into_temp_path();
        let original = temp_path.to_path_buf();

        let mut candidate =
            Candidate::remote(SourceKind::CoverArt, "http://x/front", MatchKind::Exact);
        candidate.path = Some(CandidatePath::Temp(temp_path));
        candidate.image_type = Some(ImageType::Png);
        candidate.validate(&ValidationPolicy::default());

        let dest = temp.path().join("cover.png");
        candidate.commit_to(&dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"png data");
        assert!(!original.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_committed_download_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let temp_path = tempfile::Builder::new()
            .tempfile_in(temp.path())
            .unwrap()
            .into_temp_path();
        std::fs::write(&temp_path, b"jpeg data").unwrap();
        assert_eq!(
            std::fs::metadata(&temp_path).unwrap().permissions().mode() & 0o777,
            0o600
        );

        let mut candidate =
            Candidate::remote(SourceKind::CoverArt, "http://x/front", MatchKind::Exact);
        candidate.path = Some(CandidatePath::Temp(temp_path));
        candidate.image_type = Some(ImageType::Jpeg);
        candidate.validate(&ValidationPolicy::default());

        let dest = candidate.commit_to(&temp.path().join("cover.jpg")).unwrap();
        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_commit_rejected_candidate_fails() {
        let temp = TempDir::new().unwrap();
        let candidate = Candidate::remote(SourceKind::Google, "http://x", MatchKind::Exact);
        let result = candidate.commit_to(&temp.path().join("cover.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn test_dropping_temp_candidate_deletes_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let temp_path = file.into_temp_path();
        let original = temp_path.to_path_buf();
        assert!(original.exists());

        let mut candidate =
            Candidate::remote(SourceKind::Google, "http://x/y.jpg", MatchKind::Exact);
        candidate.path = Some(CandidatePath::Temp(temp_path));
        drop(candidate);

        assert!(!original.exists());
    }
}
