//! MusicBrainz API integration
//!
//! Lists the releases of a release group so that every edition's front
//! cover can be stored next to the album.
//!
//! API docs: https://musicbrainz.org/doc/MusicBrainz_API

pub mod dto;
mod client;

pub use client::{LookupError, MusicBrainzClient};
