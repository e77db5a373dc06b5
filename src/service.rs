//! Metadata service - orchestrates cover art and lyrics lookups for batches
//!
//! This is the high-level API used by the CLI:
//! 1. Pick the first valid cover image for each album and store it in the
//!    album directory
//! 2. Optionally store the front cover of every release in the group
//! 3. Fetch, clean and store lyrics for each track
//!
//! No single album or track can abort a batch: each gets its own outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::art::sources::CoverArtSource;
use crate::art::{ArtFetcher, Candidate, MatchCriterion, SourceKind, Validation};
use crate::config::Config;
use crate::error::{Error, Result, ResultExt};
use crate::http::Transport;
use crate::lyrics::{Genius, INSTRUMENTAL, LyricsBackend};
use crate::model::{Album, Track};
use crate::musicbrainz::MusicBrainzClient;
use crate::text;

/// Result of fetching art for one album
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtOutcome {
    /// Album already points at an existing art file
    AlreadyPresent,
    /// Art was found and stored
    Found { path: PathBuf, source: SourceKind },
    /// Every source was exhausted
    NotFound,
    /// Art was found but could not be stored, or the album cannot hold art
    Failed(String),
}

/// Result of fetching lyrics for one track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsOutcome {
    AlreadyPresent,
    Found,
    /// Nothing found; the configured fallback was stored
    NotFound,
}

/// Service for fetching cover art and lyrics
pub struct MetadataService {
    config: Config,
    art: ArtFetcher,
    lyrics: Vec<Box<dyn LyricsBackend>>,
    musicbrainz: MusicBrainzClient,
}

impl MetadataService {
    /// Create a service with the sources and backends the config enables
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Self {
        let mut lyrics: Vec<Box<dyn LyricsBackend>> = Vec::new();
        match config.credentials.genius_api_key.as_deref() {
            Some(key) if !key.is_empty() => {
                lyrics.push(Box::new(Genius::new(Arc::clone(&transport), key)));
            }
            _ => debug!("No Genius API key configured, lyrics lookups are disabled"),
        }

        Self {
            art: ArtFetcher::from_config(&config, Arc::clone(&transport)),
            musicbrainz: MusicBrainzClient::new(transport),
            lyrics,
            config,
        }
    }

    /// Replace the lyrics backends
    pub fn with_lyrics_backends(mut self, backends: Vec<Box<dyn LyricsBackend>>) -> Self {
        self.lyrics = backends;
        self
    }

    // ========================================================================
    // Cover art
    // ========================================================================

    /// Fetch and store cover art for every album
    ///
    /// Albums that already have art are skipped unless `force` is set.
    pub fn fetch_art(&self, albums: &mut [Album], force: bool) -> Vec<ArtOutcome> {
        albums
            .iter_mut()
            .map(|album| {
                let outcome = self.fetch_album_art(album, force);
                match &outcome {
                    ArtOutcome::AlreadyPresent => info!("{}: already has cover art", album),
                    ArtOutcome::Found { source, .. } => {
                        info!("{}: found cover art ({})", album, source.display_name())
                    }
                    ArtOutcome::NotFound => info!("{}: cover art not found", album),
                    ArtOutcome::Failed(reason) => warn!("{}: {}", album, reason),
                }
                outcome
            })
            .collect()
    }

    fn fetch_album_art(&self, album: &mut Album, force: bool) -> ArtOutcome {
        if !force && album.has_art() {
            return ArtOutcome::AlreadyPresent;
        }
        if album.path.is_none() {
            return ArtOutcome::Failed(Error::Missing("album directory").to_string());
        }

        let Some(candidate) = self.art.art_for_album(album) else {
            return ArtOutcome::NotFound;
        };

        let source = candidate.source;
        match self.commit(album, candidate) {
            Ok(path) => ArtOutcome::Found { path, source },
            Err(e) => ArtOutcome::Failed(e.to_string()),
        }
    }

    /// Store an accepted candidate as the album's cover and record it.
    fn commit(&self, album: &mut Album, candidate: Candidate) -> Result<PathBuf> {
        let dir = album.path.clone().ok_or(Error::Missing("album directory"))?;
        let image_type = candidate.image_type.ok_or(Error::Missing("image type"))?;
        let stem = self
            .config
            .art
            .cover_names
            .first()
            .map(String::as_str)
            .unwrap_or("cover");

        let dest = dir.join(format!("{}.{}", stem, image_type.extension()));
        let source = candidate.source;
        let path = candidate
            .commit_to(&dest)
            .with_context(format!("Storing cover art for {}", album))?;

        album.artpath = Some(path.clone());
        if self.config.art.store_source {
            debug!("Storing art_source for {}", album);
            album.art_source = Some(source.name().to_string());
        }

        Ok(path)
    }

    /// Store the front cover of every release in the album's release group
    ///
    /// Files are named `cover1.jpg`, `cover2.png`, ... after the release's
    /// position in the group. Nothing is stored when the group holds a
    /// single release. Returns the files written.
    pub fn fetch_all_releases(&self, album: &Album) -> Vec<PathBuf> {
        let (Some(group_id), Some(dir)) = (album.mb_releasegroupid.as_deref(), album.path.as_deref())
        else {
            warn!("{}: release group ID and album directory are required", album);
            return Vec::new();
        };

        info!("Checking all releases for {}", album.title);

        let release_ids = match self.musicbrainz.release_ids(group_id) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("{}: MusicBrainz lookup failed: {}", album, e);
                return Vec::new();
            }
        };

        if release_ids.len() < 2 {
            info!("{}: release group has a single release", album);
            return Vec::new();
        }

        let archive = CoverArtSource::new(MatchCriterion::Release, self.config.art.maxwidth);
        let mut written = Vec::new();

        for (index, release_id) in release_ids.iter().enumerate() {
            let mut candidate = archive.candidate(archive.release_front_url(release_id));
            if self.art.check(&mut candidate) != Validation::Accepted {
                debug!("no usable front cover for release {}", release_id);
                continue;
            }

            let Some(image_type) = candidate.image_type else {
                continue;
            };
            let dest = dir.join(format!("cover{}.{}", index + 1, image_type.extension()));
            match candidate.commit_to(&dest) {
                Ok(path) => written.push(path),
                Err(e) => warn!("{}: {}", album, e),
            }
        }

        info!("{}: stored {} release cover(s)", album, written.len());
        written
    }

    // ========================================================================
    // Lyrics
    // ========================================================================

    /// Fetch and store lyrics for every track
    ///
    /// Tracks with lyrics are skipped unless `force` is set. A track with no
    /// lyrics found gets the configured fallback value.
    pub fn fetch_lyrics(&self, tracks: &mut [Track], force: bool) -> Vec<LyricsOutcome> {
        tracks
            .iter_mut()
            .map(|track| {
                if !force && track.has_lyrics() {
                    info!("lyrics already exist: {}", track);
                    return LyricsOutcome::AlreadyPresent;
                }

                match self.lookup_lyrics(track) {
                    Some(lyrics) => {
                        info!("fetched lyrics: {}", track);
                        track.lyrics = Some(lyrics);
                        LyricsOutcome::Found
                    }
                    None => {
                        info!("lyrics not found: {}", track);
                        track.lyrics = self.config.lyrics.fallback.clone();
                        LyricsOutcome::NotFound
                    }
                }
            })
            .collect()
    }

    fn lookup_lyrics(&self, track: &Track) -> Option<String> {
        self.lyrics.iter().find_map(|backend| {
            debug!("trying lyrics backend {} for {}", backend.name(), track);
            backend
                .fetch(&track.artist, &track.title)
                .map(|raw| self.clean_lyrics(&raw))
                .filter(|lyrics| !lyrics.is_empty())
        })
    }

    /// Normalize scraped lyrics for storage.
    pub fn clean_lyrics(&self, raw: &str) -> String {
        let lyrics = text::normalize(raw);
        let lyrics = lyrics.trim();
        if self.config.lyrics.strip_annotations && lyrics != INSTRUMENTAL {
            text::strip_annotations(lyrics).trim().to_string()
        } else {
            lyrics.to_string()
        }
    }

    /// Write a track's lyrics to `{dir}/{title}.txt`
    ///
    /// An existing file is left untouched. Returns the file path.
    pub fn write_lyrics_file(&self, track: &Track, dir: &Path) -> Result<PathBuf> {
        let lyrics = track
            .lyrics
            .as_deref()
            .filter(|l| !l.is_empty())
            .ok_or(Error::Missing("lyrics"))?;

        let filename = format!("{}.txt", track.title.replace(['/', '\\'], "_"));
        let path = dir.join(filename);
        if path.exists() {
            debug!("{} already exists, not overwriting", path.display());
            return Ok(path);
        }

        std::fs::create_dir_all(dir).with_context(format!("Creating {}", dir.display()))?;
        std::fs::write(&path, lyrics).with_context(format!("Writing {}", path.display()))?;
        info!("Wrote lyrics to {}", path.display());
        Ok(path)
    }
}
