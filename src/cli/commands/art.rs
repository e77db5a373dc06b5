//! Cover art commands.

use std::path::Path;
use std::sync::Arc;

use crate::art::sources::resolve_sources;
use crate::art::ImageType;
use crate::config::Config;
use crate::http::Transport;
use crate::model::Album;
use crate::service::{ArtOutcome, MetadataService};

/// Find cover art for one album
#[allow(clippy::too_many_arguments)]
pub fn cmd_art(
    config: Config,
    transport: Arc<dyn Transport>,
    artist: &str,
    title: &str,
    dir: &Path,
    mbid: Option<&str>,
    release_group: Option<&str>,
    force: bool,
    all_releases: bool,
) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Album directory not found: {}", dir.display());
    }

    let mut album = Album {
        path: Some(dir.to_path_buf()),
        mb_albumid: mbid.map(str::to_string),
        mb_releasegroupid: release_group.map(str::to_string),
        artpath: existing_cover(&config, dir),
        ..Album::new(artist, title)
    };

    let service = MetadataService::new(config, transport);
    println!("Fetching cover art: {}", album);
    println!();

    let outcomes = service.fetch_art(std::slice::from_mut(&mut album), force);
    match outcomes.first() {
        Some(ArtOutcome::AlreadyPresent) => {
            println!("✓ Already has cover art (use --force to replace it)");
        }
        Some(ArtOutcome::Found { path, source }) => {
            println!("✓ Found cover art from {}", source.display_name());
            println!("  Saved to: {}", path.display());
        }
        Some(ArtOutcome::NotFound) | None => {
            println!("✗ Cover art not found");
        }
        Some(ArtOutcome::Failed(reason)) => {
            eprintln!("✗ Failed to store cover art: {}", reason);
        }
    }

    if all_releases {
        println!();
        if album.mb_releasegroupid.is_none() {
            eprintln!("Error: --all-releases needs --release-group");
        } else {
            let written = service.fetch_all_releases(&album);
            if written.is_empty() {
                println!("✗ No additional release covers stored");
            }
            for path in written {
                println!("✓ {}", path.display());
            }
        }
    }

    Ok(())
}

/// The album's current cover file, if one with the primary cover name exists.
fn existing_cover(config: &Config, dir: &Path) -> Option<std::path::PathBuf> {
    let stem = config.art.cover_names.first()?;
    [ImageType::Jpeg, ImageType::Png]
        .into_iter()
        .map(|t| dir.join(format!("{}.{}", stem, t.extension())))
        .find(|p| p.is_file())
}

/// Print the effective art source order
pub fn cmd_sources(config: &Config) -> anyhow::Result<()> {
    let sources = resolve_sources(&config.art, &config.credentials);

    if sources.is_empty() {
        println!("No art sources enabled.");
        return Ok(());
    }

    println!("Art sources, in order:");
    for (i, (kind, criterion)) in sources.iter().enumerate() {
        println!(
            "  {}. {} ({}, match by {})",
            i + 1,
            kind.display_name(),
            kind.name(),
            criterion.name()
        );
    }

    if config.credentials.google_key.is_none() {
        println!();
        println!("Google Images is disabled: set GOOGLE_API_KEY to enable it.");
    }

    Ok(())
}
