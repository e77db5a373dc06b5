//! Command-line interface for metadata-retriever.
//!
//! This module provides CLI commands for fetching cover art and lyrics
//! and for inspecting the configured art source order.

mod commands;

pub use commands::{Cli, run_command};
