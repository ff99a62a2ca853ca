//! Error types for loading course material

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading material from disk
#[derive(Debug, Error)]
pub enum MaterialError {
    /// A required `index.md` had no front matter block
    #[error("Missing front matter in {path}")]
    MissingFrontMatter { path: PathBuf },

    /// Front matter could not be deserialised
    #[error("Invalid front matter in {path}: {source}")]
    InvalidFrontMatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A front matter block was opened but never closed
    #[error("Unterminated front matter block")]
    UnterminatedFrontMatter,
}
