//! Art source implementations and the configured source order.

pub mod coverart;
pub mod filesystem;
pub mod google;
pub mod wikipedia;

use std::sync::Arc;

use tracing::warn;

use super::{ArtSource, MatchCriterion, SourceKind};
use crate::config::{ArtConfig, Config, Credentials};
use crate::http::Transport;

pub use coverart::CoverArtSource;
pub use filesystem::FilesystemSource;
pub use google::GoogleSource;
pub use wikipedia::WikipediaSource;

fn google_configured(credentials: &Credentials) -> bool {
    credentials
        .google_key
        .as_deref()
        .is_some_and(|k| !k.is_empty())
}

/// Every (source, criterion) pair usable with these credentials, in
/// default priority order.
pub fn available_pairs(credentials: &Credentials) -> Vec<(SourceKind, MatchCriterion)> {
    SourceKind::ALL
        .into_iter()
        .filter(|kind| *kind != SourceKind::Google || google_configured(credentials))
        .flat_map(|kind| kind.criteria().iter().map(move |c| (kind, *c)))
        .collect()
}

/// Resolve the configured `sources` list into an ordered, de-duplicated
/// list of (source, criterion) pairs.
///
/// Entries are `name`, `name:criterion`, or `*` for everything available.
/// A bare name expands to every criterion the source supports. Entries that
/// name an unknown or unavailable pair are skipped with a warning.
pub fn resolve_sources(art: &ArtConfig, credentials: &Credentials) -> Vec<(SourceKind, MatchCriterion)> {
    let available = available_pairs(credentials);
    let mut resolved: Vec<(SourceKind, MatchCriterion)> = Vec::new();

    for entry in &art.sources {
        let entry = entry.trim();
        let expanded: Vec<(SourceKind, MatchCriterion)> = if entry == "*" {
            available.clone()
        } else {
            let (name, criterion) = match entry.split_once(':') {
                Some((name, criterion)) => (name.trim(), Some(criterion.trim())),
                None => (entry, None),
            };

            let Some(kind) = SourceKind::from_name(name) else {
                warn!("Unknown art source '{}', ignoring", name);
                continue;
            };

            match criterion {
                None => available.iter().copied().filter(|(k, _)| *k == kind).collect(),
                Some(c) => match MatchCriterion::from_name(c) {
                    Some(c) => available
                        .iter()
                        .copied()
                        .filter(|pair| *pair == (kind, c))
                        .collect(),
                    None => {
                        warn!("Unknown match criterion '{}' for source '{}', ignoring", c, name);
                        continue;
                    }
                },
            }
        };

        if expanded.is_empty() {
            warn!("Art source '{}' is not available, ignoring", entry);
        }

        for pair in expanded {
            if !resolved.contains(&pair) {
                resolved.push(pair);
            }
        }
    }

    if art.remote_priority {
        // Stable: relative order within each group is kept
        let (remote, local): (Vec<_>, Vec<_>) =
            resolved.into_iter().partition(|(kind, _)| !kind.is_local());
        resolved = remote.into_iter().chain(local).collect();
    }

    resolved
}

/// Instantiate one source bound to one criterion.
///
/// Returns `None` when the source cannot run with this configuration.
pub fn build_source(
    kind: SourceKind,
    criterion: MatchCriterion,
    config: &Config,
    transport: &Arc<dyn Transport>,
) -> Option<Box<dyn ArtSource>> {
    let source: Box<dyn ArtSource> = match kind {
        SourceKind::Filesystem => Box::new(FilesystemSource::new(
            &config.art.cover_names,
            config.art.cautious,
        )),
        SourceKind::CoverArt => Box::new(CoverArtSource::new(criterion, config.art.maxwidth)),
        SourceKind::Google => {
            let key = config.credentials.google_key.clone()?;
            let engine = config.credentials.google_engine.clone().unwrap_or_default();
            Box::new(GoogleSource::new(Arc::clone(transport), key, engine))
        }
        SourceKind::Wikipedia => Box::new(WikipediaSource::new(Arc::clone(transport))),
    };
    Some(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockTransport;

    fn art(sources: &[&str]) -> ArtConfig {
        ArtConfig {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            ..ArtConfig::default()
        }
    }

    fn with_google() -> Credentials {
        Credentials {
            google_key: Some("key".to_string()),
            google_engine: Some("cx".to_string()),
            ..Credentials::default()
        }
    }

    #[test]
    fn test_default_order_without_google() {
        let resolved = resolve_sources(&ArtConfig::default(), &Credentials::default());
        assert_eq!(
            resolved,
            vec![
                (SourceKind::Filesystem, MatchCriterion::Default),
                (SourceKind::CoverArt, MatchCriterion::Release),
                (SourceKind::CoverArt, MatchCriterion::ReleaseGroup),
                (SourceKind::Wikipedia, MatchCriterion::Default),
            ]
        );
    }

    #[test]
    fn test_google_included_with_key() {
        let resolved = resolve_sources(&ArtConfig::default(), &with_google());
        assert!(resolved.contains(&(SourceKind::Google, MatchCriterion::Default)));
        assert_eq!(resolved.len(), 5);
    }

    #[test]
    fn test_explicit_criterion_and_dedupe() {
        let resolved = resolve_sources(
            &art(&["coverart:releasegroup", "coverart", "wikipedia"]),
            &Credentials::default(),
        );
        assert_eq!(
            resolved,
            vec![
                (SourceKind::CoverArt, MatchCriterion::ReleaseGroup),
                (SourceKind::CoverArt, MatchCriterion::Release),
                (SourceKind::Wikipedia, MatchCriterion::Default),
            ]
        );
    }

    #[test]
    fn test_unknown_entries_are_skipped() {
        let resolved = resolve_sources(
            &art(&["amazon", "google", "coverart:default", "wikipedia:bogus", "coverart:release"]),
            &Credentials::default(),
        );
        assert_eq!(resolved, vec![(SourceKind::CoverArt, MatchCriterion::Release)]);
    }

    #[test]
    fn test_wildcard_after_explicit() {
        let resolved = resolve_sources(&art(&["wikipedia", "*"]), &Credentials::default());
        assert_eq!(resolved[0], (SourceKind::Wikipedia, MatchCriterion::Default));
        assert_eq!(resolved[1], (SourceKind::Filesystem, MatchCriterion::Default));
        assert_eq!(resolved.len(), 4);
    }

    #[test]
    fn test_remote_priority_moves_local_last() {
        let config = ArtConfig {
            remote_priority: true,
            ..art(&["filesystem", "wikipedia", "coverart:release"])
        };
        let resolved = resolve_sources(&config, &Credentials::default());
        assert_eq!(
            resolved,
            vec![
                (SourceKind::Wikipedia, MatchCriterion::Default),
                (SourceKind::CoverArt, MatchCriterion::Release),
                (SourceKind::Filesystem, MatchCriterion::Default),
            ]
        );
    }

    #[test]
    fn test_build_source_binds_criterion() {
        let transport: Arc<dyn Transport> = Arc::new(MockTransport::new());
        let config = Config::default();

        let source =
            build_source(SourceKind::CoverArt, MatchCriterion::ReleaseGroup, &config, &transport)
                .unwrap();
        assert_eq!(source.kind(), SourceKind::CoverArt);
        assert_eq!(source.criterion(), MatchCriterion::ReleaseGroup);

        assert!(build_source(SourceKind::Google, MatchCriterion::Default, &config, &transport).is_none());
    }
}
