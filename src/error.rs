use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while updating an appcast.
///
/// Each variant corresponds to one stage of the update pipeline, so the
/// caller can tell whether the existing feed, the release artifact, or the
/// final write was at fault. Errors are classified where they originate and
/// propagated unchanged to the binary entry point.
#[derive(Debug, Error)]
pub enum AppcastError {
    /// The existing appcast file could not be read or is not a valid
    /// RSS/Sparkle document. No auto-repair is attempted.
    #[error("invalid appcast document at '{}': {reason}", path.display())]
    Document { path: PathBuf, reason: String },

    /// The release artifact could not be opened or read while computing
    /// its content hash.
    #[error("failed to hash artifact '{}': {source}", path.display())]
    Integrity {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The updated appcast could not be serialized or written back to disk.
    #[error("failed to write appcast: {0}")]
    Write(#[from] std::io::Error),
}
