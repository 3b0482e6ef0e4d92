use std::path::PathBuf;

/// Caller-supplied metadata for a single release.
///
/// Built once from the command line and treated as immutable for the
/// duration of one update run. The `file_size` is a string and is embedded
/// in the feed verbatim, never cross-checked against the artifact on disk:
/// release pipelines declare the size of the file they are about to upload,
/// which may not be the local copy being hashed.
#[derive(Debug, Clone)]
pub struct ReleaseInput {
    /// Application display name, used for channel headers on first creation.
    pub name: String,
    /// Release version string (e.g. "1.4.2").
    pub version: String,
    /// Path to the release artifact (DMG) to hash.
    pub artifact_path: PathBuf,
    /// Release notes in HTML; preserved unescaped in the feed.
    pub release_notes: String,
    /// Declared artifact size in bytes, embedded verbatim.
    pub file_size: String,
    /// Precomputed Sparkle EdDSA signature, embedded verbatim.
    pub signature: String,
}
