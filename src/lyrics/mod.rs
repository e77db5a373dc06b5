//! Lyrics lookup.
//!
//! A [`LyricsBackend`] turns an artist/title pair into raw lyrics text.
//! Post-processing (normalization, annotation stripping, fallback values)
//! is applied by [`crate::service`], so backends return what the page says.

pub mod extract;
pub mod genius;

pub use genius::Genius;

/// Stored in place of lyrics for instrumental tracks.
pub const INSTRUMENTAL: &str = "[Instrumental]";

/// A lyrics provider.
///
/// `fetch` never fails loudly: every network or parsing problem is logged
/// and reported as "not found".
pub trait LyricsBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn fetch(&self, artist: &str, title: &str) -> Option<String>;
}
