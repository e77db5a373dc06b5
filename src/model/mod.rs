//! Library entities handed to the fetch pipelines.
//!
//! The host library owns these records. The pipelines only read them,
//! except for the final write-back of the chosen result (`artpath`,
//! `art_source`, `lyrics`) performed by [`crate::service`].

use std::fmt;
use std::path::PathBuf;

/// An album in the music library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Album {
    /// Album artist
    pub artist: String,
    /// Album title
    pub title: String,
    /// Directory holding the album's files
    pub path: Option<PathBuf>,
    /// MusicBrainz release ID
    pub mb_albumid: Option<String>,
    /// MusicBrainz release group ID
    pub mb_releasegroupid: Option<String>,
    /// Path to the current cover art file
    pub artpath: Option<PathBuf>,
    /// Name of the source that supplied the cover art
    pub art_source: Option<String>,
}

impl Album {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Whether the album already points at an existing art file.
    pub fn has_art(&self) -> bool {
        self.artpath.as_ref().is_some_and(|p| p.is_file())
    }
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// A track (audio file) in the music library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    /// Track artist (may include "feat." credits)
    pub artist: String,
    /// Track title
    pub title: String,
    /// Album title
    pub album: String,
    /// Stored lyrics text
    pub lyrics: Option<String>,
}

impl Track {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Whether non-empty lyrics are already stored.
    pub fn has_lyrics(&self) -> bool {
        self.lyrics.as_deref().is_some_and(|l| !l.is_empty())
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}
