//! Metadata Retriever - cover art and lyrics for a music library.
//!
//! Finds album cover art across several sources (album directory, Cover Art
//! Archive, Google Images, Wikipedia) and song lyrics from Genius, validates
//! what comes back, and stores it next to the music.

pub mod art;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod lyrics;
pub mod model;
pub mod musicbrainz;
pub mod service;
#[cfg(test)]
pub mod test_utils;
pub mod text;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("metadata_retriever=info".parse()?))
        .init();

    cli::run_command(&args)
}
