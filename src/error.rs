//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while the
//! CLI and `main` use `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum
//! - [`FetchError`]: Transport-level failures from the HTTP adapter
//!
//! Provider code never lets these escape a single candidate or lookup:
//! failures are logged and turned into "nothing found" so a batch keeps
//! going. [`Error`] is only surfaced where something is written back to
//! disk on behalf of the caller.

use std::path::PathBuf;

pub use crate::http::FetchError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote fetch error
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Committing a downloaded file to its final location failed
    #[error("Failed to store {path}: {message}")]
    Persist { path: PathBuf, message: String },

    /// Entity is missing a field required for the operation
    #[error("Missing {0}")]
    Missing(&'static str),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a persist error.
    pub fn persist(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Persist {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, FetchError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Fetch(e).context(ctx))
    }
}
