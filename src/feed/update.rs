use std::path::{Path, PathBuf};

use chrono::Local;

use super::document::{Enclosure, FeedDocument, Item};
use super::version;
use crate::error::AppcastError;
use crate::integrity;
use crate::release::ReleaseInput;

/// Media type Sparkle expects for disk-image artifacts.
const DMG_MIME_TYPE: &str = "application/x-apple-diskimage";

/// Drives one appcast update end to end: resolve the document, hash the
/// artifact, build the new item, sort, persist.
pub struct AppcastUpdater {
    appcast_path: PathBuf,
    base_url: String,
}

impl AppcastUpdater {
    /// Creates an updater targeting `appcast_path`. A trailing slash on
    /// `base_url` is trimmed before URLs are joined.
    pub fn new(appcast_path: impl Into<PathBuf>, base_url: &str) -> Self {
        let appcast_path = appcast_path.into();
        tracing::debug!(path = %appcast_path.display(), base_url, "initialized appcast updater");
        Self {
            appcast_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Adds `release` to the feed and writes the result back to disk.
    ///
    /// The document is resolved before the artifact is touched, so a
    /// malformed existing feed fails the run without any hashing. No stage
    /// is retried and nothing is rolled back; the on-disk file only changes
    /// if the final write completes.
    ///
    /// # Errors
    ///
    /// Any stage failure surfaces as the matching [`AppcastError`] kind:
    /// `Document` from resolution, `Integrity` from hashing, `Write` from
    /// serialization.
    pub fn add_release(&self, release: &ReleaseInput) -> Result<(), AppcastError> {
        let mut doc = FeedDocument::load_or_create(&self.appcast_path, &release.name)?;

        let hash = integrity::sha256_file(&release.artifact_path)?;
        doc.channel.items.push(self.build_item(release, &hash));
        version::sort_descending(&mut doc.channel.items);

        doc.write_to(&self.appcast_path)?;
        tracing::info!(version = %release.version, "added release to appcast");
        Ok(())
    }

    fn build_item(&self, release: &ReleaseInput, hash: &str) -> Item {
        Item {
            title: format!("Version {}", release.version),
            pub_date: pub_date_now(),
            enclosure: Some(Enclosure {
                url: format!(
                    "{}/{}",
                    self.base_url,
                    artifact_file_name(&release.artifact_path)
                ),
                // Embedded verbatim, never recomputed from the filesystem.
                length: release.file_size.clone(),
                mime_type: DMG_MIME_TYPE.to_string(),
                version: release.version.clone(),
                short_version: release.version.clone(),
                sha256: hash.to_string(),
                ed_signature: release.signature.clone(),
            }),
            sparkle_version: Some(release.version.clone()),
            sparkle_short_version: Some(release.version.clone()),
            description: release.release_notes.clone(),
        }
    }
}

/// RFC-822-style publication date for a new entry.
///
/// Local time with a fixed `+0000` suffix, no UTC conversion. Entries
/// already published carry the same format, so changing it would make the
/// feed inconsistent.
fn pub_date_now() -> String {
    format!("{} +0000", Local::now().format("%a, %d %b %Y %H:%M:%S"))
}

fn artifact_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
