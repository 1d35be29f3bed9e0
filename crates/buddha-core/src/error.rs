//! Error kinds per spec.md §7.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Rejectable: the view/window parameters passed to `set` violate an
    /// invariant. State is left unchanged.
    #[error("invalid view configuration: {0}")]
    Configuration(String),

    /// Screenshot write failed at the filesystem level. Not retried.
    #[error("failed to write screenshot to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Screenshot write failed in the encoder itself (not an I/O error).
    #[error("failed to encode frame as PNG: {0}")]
    Encode(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
