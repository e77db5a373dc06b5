//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `art`: Cover art lookup and the effective source order
//! - `lyrics`: Lyrics lookup, printing and export

mod art;
mod lyrics;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::{self, Config};
use crate::http::{ReqwestTransport, Transport};

pub use art::{cmd_art, cmd_sources};
pub use lyrics::cmd_lyrics;

/// Metadata Retriever CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Google Custom Search API key
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_key: Option<String>,

    /// Google Custom Search engine ID
    #[arg(long, global = true, env = "GOOGLE_ENGINE_ID")]
    pub google_engine: Option<String>,

    /// Genius API token
    #[arg(long, global = true, env = "GENIUS_API_KEY", hide_env_values = true)]
    pub genius_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Find cover art for an album and store it in the album directory
    Art {
        /// Album artist
        artist: String,
        /// Album title
        album: String,
        /// Album directory (default: current directory)
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
        /// MusicBrainz release ID
        #[arg(long)]
        mbid: Option<String>,
        /// MusicBrainz release group ID
        #[arg(long)]
        release_group: Option<String>,
        /// Re-download art when already present
        #[arg(short, long)]
        force: bool,
        /// Also store the front cover of every release in the group
        #[arg(short, long)]
        all_releases: bool,
    },
    /// Find lyrics for a song
    Lyrics {
        /// Track artist
        artist: String,
        /// Track title
        title: String,
        /// Album title
        #[arg(long)]
        album: Option<String>,
        /// Print lyrics to the console
        #[arg(short, long)]
        print: bool,
        /// Write lyrics to `{title}.txt` in this directory
        #[arg(short, long, value_name = "DIR")]
        write: Option<PathBuf>,
    },
    /// Show the order in which art sources are tried
    Sources,
    /// Show the config file location and effective settings
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

impl Cli {
    /// Load the config file and apply credentials given on the command line
    /// or through the environment.
    pub fn effective_config(&self) -> Config {
        let mut config = match &self.config {
            Some(path) => config::load_from(path),
            None => config::load(),
        };

        if let Some(key) = &self.google_key {
            config.credentials.google_key = Some(key.clone());
        }
        if let Some(engine) = &self.google_engine {
            config.credentials.google_engine = Some(engine.clone());
        }
        if let Some(key) = &self.genius_key {
            config.credentials.genius_api_key = Some(key.clone());
        }

        config
    }
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.effective_config();
    tracing::debug!("Effective config: {:?}", config);

    match &cli.command {
        Commands::Art {
            artist,
            album,
            dir,
            mbid,
            release_group,
            force,
            all_releases,
        } => {
            let transport = build_transport(&config)?;
            cmd_art(
                config,
                transport,
                artist,
                album,
                dir,
                mbid.as_deref(),
                release_group.as_deref(),
                *force,
                *all_releases,
            )
        }
        Commands::Lyrics {
            artist,
            title,
            album,
            print,
            write,
        } => {
            let transport = build_transport(&config)?;
            cmd_lyrics(
                config,
                transport,
                artist,
                title,
                album.as_deref(),
                *print,
                write.as_ref(),
            )
        }
        Commands::Sources => cmd_sources(&config),
        Commands::Config { init } => cmd_config(cli.config.as_deref(), &config, *init),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Print (and optionally create) the config file
fn cmd_config(custom: Option<&Path>, effective: &Config, init: bool) -> anyhow::Result<()> {
    let path = match custom {
        Some(path) => path.to_path_buf(),
        None => config::config_path().ok_or(config::ConfigError::NoConfigDir)?,
    };
    println!("Config file: {}", path.display());

    if init {
        if path.exists() {
            println!("✗ Config file already exists, leaving it untouched");
        } else {
            match custom {
                Some(path) => config::save_to(&Config::default(), path)?,
                None => config::save(&Config::default())?,
            }
            println!("✓ Wrote default config");
        }
    }

    let mut shown = effective.clone();
    for key in [
        &mut shown.credentials.google_key,
        &mut shown.credentials.genius_api_key,
    ] {
        if key.is_some() {
            *key = Some("REDACTED".to_string());
        }
    }
    println!();
    print!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

fn build_transport(config: &Config) -> anyhow::Result<Arc<dyn Transport>> {
    Ok(Arc::new(ReqwestTransport::new(&config.http)?))
}
