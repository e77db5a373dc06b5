//! MusicBrainz API Data Transfer Objects
//!
//! These types match what the MusicBrainz API returns for
//! `/release-group/{id}?inc=releases`.
//! Only the fields we read are declared.
//!
//! API Reference: https://musicbrainz.org/doc/MusicBrainz_API

use serde::{Deserialize, Serialize};

/// Release group lookup response
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseGroupResponse {
    /// MusicBrainz release group ID
    pub id: String,
    /// Title
    pub title: String,
    /// Primary type (Album, Single, EP, etc.)
    pub primary_type: Option<String>,
    /// Releases in this group (only with `inc=releases`)
    #[serde(default)]
    pub releases: Vec<Release>,
}

/// Release (one edition of the album)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Release {
    /// MusicBrainz release ID
    pub id: String,
    /// Release title
    pub title: Option<String>,
    /// Release status (Official, Bootleg, etc.)
    pub status: Option<String>,
    /// Release date (YYYY, YYYY-MM, or YYYY-MM-DD)
    pub date: Option<String>,
    /// Country code
    pub country: Option<String>,
}

/// Error response from MusicBrainz API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: String,
    pub help: Option<String>,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// ============================================================================
