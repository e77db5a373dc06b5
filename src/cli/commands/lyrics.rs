//! Lyrics commands.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::http::Transport;
use crate::model::Track;
use crate::service::{LyricsOutcome, MetadataService};

/// Find lyrics for one song
pub fn cmd_lyrics(
    config: Config,
    transport: Arc<dyn Transport>,
    artist: &str,
    title: &str,
    album: Option<&str>,
    print: bool,
    write: Option<&PathBuf>,
) -> anyhow::Result<()> {
    if config.credentials.genius_api_key.is_none() {
        eprintln!("Error: Genius API key required.");
        eprintln!("Get one at: https://genius.com/api-clients");
        eprintln!("Then use: --genius-key YOUR_KEY or set GENIUS_API_KEY env var");
        anyhow::bail!("no lyrics backend configured");
    }

    let mut track = Track {
        album: album.unwrap_or_default().to_string(),
        ..Track::new(artist, title)
    };

    let service = MetadataService::new(config, transport);
    let outcomes = service.fetch_lyrics(std::slice::from_mut(&mut track), false);

    match outcomes.first() {
        Some(LyricsOutcome::Found) | Some(LyricsOutcome::AlreadyPresent) => {
            println!("✓ Fetched lyrics: {}", track);
        }
        Some(LyricsOutcome::NotFound) | None => {
            println!("✗ Lyrics not found: {}", track);
        }
    }

    if !track.has_lyrics() {
        return Ok(());
    }

    if print {
        println!();
        println!("{}", track);
        println!("{}", track.lyrics.as_deref().unwrap_or_default());
        println!();
    }

    if let Some(dir) = write {
        let path = service.write_lyrics_file(&track, dir)?;
        println!("✓ Lyrics written to {}", path.display());
    }

    Ok(())
}
