//! Cover Art Archive source
//!
//! Builds front-cover URLs from MusicBrainz identifiers.
//! No API key required, but please respect their rate limits.
//!
//! API: https://coverartarchive.org

use crate::art::{ArtSource, Candidate, MatchCriterion, MatchKind, SourceKind};
use crate::model::Album;

/// Desired cover art size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverSize {
    /// 250px thumbnail
    Small,
    /// 500px thumbnail
    Medium,
    /// 1200px thumbnail
    Large,
    /// Original full-size image (default)
    #[default]
    Original,
}

impl CoverSize {
    /// Smallest archive thumbnail at least `maxwidth` wide.
    ///
    /// `0` means no limit and selects the original.
    pub fn for_maxwidth(maxwidth: u32) -> Self {
        match maxwidth {
            0 => CoverSize::Original,
            1..=250 => CoverSize::Small,
            251..=500 => CoverSize::Medium,
            501..=1200 => CoverSize::Large,
            _ => CoverSize::Original,
        }
    }

    /// Width of the archive thumbnail, `None` for the original.
    pub fn width(self) -> Option<u32> {
        match self {
            CoverSize::Small => Some(250),
            CoverSize::Medium => Some(500),
            CoverSize::Large => Some(1200),
            CoverSize::Original => None,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            CoverSize::Small => "-250",
            CoverSize::Medium => "-500",
            CoverSize::Large => "-1200",
            CoverSize::Original => "",
        }
    }
}

/// Cover Art Archive source
pub struct CoverArtSource {
    base_url: String,
    match_by: MatchCriterion,
    size: CoverSize,
    maxwidth: u32,
}

impl CoverArtSource {
    /// Create a source bound to one matching criterion
    pub fn new(match_by: MatchCriterion, maxwidth: u32) -> Self {
        Self {
            base_url: "https://coverartarchive.org".to_string(),
            match_by,
            size: CoverSize::for_maxwidth(maxwidth),
            maxwidth,
        }
    }

    /// Create a source for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>, match_by: MatchCriterion) -> Self {
        Self {
            base_url: base_url.into(),
            match_by,
            size: CoverSize::Original,
            maxwidth: 0,
        }
    }

    /// Front cover URL for a release
    pub fn release_front_url(&self, release_id: &str) -> String {
        format!(
            "{}/release/{}/front{}",
            self.base_url,
            release_id,
            self.size.suffix()
        )
    }

    /// Front cover URL for a release group
    pub fn release_group_front_url(&self, release_group_id: &str) -> String {
        format!(
            "{}/release-group/{}/front{}",
            self.base_url,
            release_group_id,
            self.size.suffix()
        )
    }

    /// Candidate for an archive URL, skipping the resize proxy when the
    /// thumbnail already has the configured width.
    pub(crate) fn candidate(&self, url: String) -> Candidate {
        let candidate = Candidate::remote(SourceKind::CoverArt, url, MatchKind::Exact);
        // The archive already serves a thumbnail of exactly this width
        if self.size.width() == Some(self.maxwidth) {
            candidate.without_resize()
        } else {
            candidate
        }
    }
}

fn present(id: &Option<String>) -> Option<&str> {
    id.as_deref().map(str::trim).filter(|id| !id.is_empty())
}

impl ArtSource for CoverArtSource {
    fn kind(&self) -> SourceKind {
        SourceKind::CoverArt
    }

    fn criterion(&self) -> MatchCriterion {
        self.match_by
    }

    fn candidates<'a>(&'a self, album: &'a Album) -> Box<dyn Iterator<Item = Candidate> + 'a> {
        let url = match self.match_by {
            MatchCriterion::Release => present(&album.mb_albumid).map(|id| self.release_front_url(id)),
            MatchCriterion::ReleaseGroup => {
                present(&album.mb_releasegroupid).map(|id| self.release_group_front_url(id))
            }
            MatchCriterion::Default => None,
        };

        Box::new(url.map(|url| self.candidate(url)).into_iter())
    }
}
