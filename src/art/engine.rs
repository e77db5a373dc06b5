//! First-valid-wins cover art selection.
//!
//! Sources are consulted in order and each source's candidates are pulled
//! one at a time. The first candidate that downloads and validates is
//! returned and nothing after it is touched: later candidates are never
//! fetched and later sources never queried.

use std::sync::Arc;

use tracing::debug;

use super::download::Downloader;
use super::sources::{build_source, resolve_sources};
use super::{ArtSource, Candidate, MatchCriterion, SourceKind, Validation, ValidationPolicy};
use crate::config::Config;
use crate::http::Transport;
use crate::model::Album;

/// Ordered source list plus the downloader and acceptance policy.
pub struct ArtFetcher {
    sources: Vec<Box<dyn ArtSource>>,
    downloader: Downloader,
    policy: ValidationPolicy,
}

impl ArtFetcher {
    pub fn new(
        sources: Vec<Box<dyn ArtSource>>,
        downloader: Downloader,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            sources,
            downloader,
            policy,
        }
    }

    /// Build the fetcher described by the `[art]` config section.
    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> Self {
        let sources = resolve_sources(&config.art, &config.credentials)
            .into_iter()
            .filter_map(|(kind, criterion)| build_source(kind, criterion, config, &transport))
            .collect();

        Self::new(
            sources,
            Downloader::new(transport, config.art.maxwidth),
            ValidationPolicy {
                minwidth: config.art.minwidth,
            },
        )
    }

    /// The (source, criterion) pairs in the order they are tried.
    pub fn source_order(&self) -> Vec<(SourceKind, MatchCriterion)> {
        self.sources
            .iter()
            .map(|s| (s.kind(), s.criterion()))
            .collect()
    }

    /// Fetch and validate one candidate.
    pub fn check(&self, candidate: &mut Candidate) -> Validation {
        self.downloader.get_image(candidate);
        candidate.validate(&self.policy)
    }

    /// Find the first acceptable image for `album`.
    ///
    /// Returns `None` when every source is exhausted. Rejected candidates
    /// are dropped as soon as they fail, which removes their temp files.
    pub fn art_for_album(&self, album: &Album) -> Option<Candidate> {
        for source in &self.sources {
            debug!(
                "trying source {} ({}) for album {}",
                source.kind().display_name(),
                source.criterion().name(),
                album
            );

            for mut candidate in source.candidates(album) {
                if self.check(&mut candidate) == Validation::Accepted {
                    debug!(
                        "using {} image from {}",
                        source.kind(),
                        candidate
                            .path()
                            .map(|p| p.display().to_string())
                            .unwrap_or_default()
                    );
                    return Some(candidate);
                }
                debug!("candidate from {} rejected", source.kind());
            }
        }

        None
    }
}
