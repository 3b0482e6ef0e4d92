//! Integration tests for the appcast update flow: create, append, re-sort,
//! persist.
//!
//! Each test runs against its own temp directory with a real artifact file,
//! exercising the public updater API end to end the way the CLI drives it.

use std::path::{Path, PathBuf};

use appcaster::{AppcastError, AppcastUpdater, FeedDocument, ReleaseInput};
use pretty_assertions::assert_eq;

fn write_artifact(dir: &Path, file_name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, content).unwrap();
    path
}

fn release(name: &str, version: &str, artifact: &Path) -> ReleaseInput {
    ReleaseInput {
        name: name.to_string(),
        version: version.to_string(),
        artifact_path: artifact.to_path_buf(),
        release_notes: format!("<h2>Version {version}</h2><p>Fixes &amp; features</p>"),
        file_size: "123456".to_string(),
        signature: format!("sig-{version}=="),
    }
}

// ============================================================================
// Fresh feed creation
// ============================================================================

#[test]
fn first_release_creates_feed_with_channel_headers() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    let artifact = write_artifact(dir.path(), "MyApp-1.0.dmg", b"dmg bytes");

    let updater = AppcastUpdater::new(&appcast, "https://example.com/downloads");
    updater
        .add_release(&release("MyApp", "1.0", &artifact))
        .unwrap();

    let doc = FeedDocument::load_or_create(&appcast, "unused").unwrap();
    assert_eq!(doc.channel.title, "MyApp Updates");
    assert_eq!(doc.channel.description, "Most recent updates to MyApp");
    assert_eq!(doc.channel.language, "en");
    assert_eq!(doc.channel.items.len(), 1);

    let item = &doc.channel.items[0];
    assert_eq!(item.title, "Version 1.0");
    assert!(item.pub_date.ends_with(" +0000"));

    let enc = item.enclosure.as_ref().unwrap();
    assert_eq!(enc.url, "https://example.com/downloads/MyApp-1.0.dmg");
    assert_eq!(enc.length, "123456");
    assert_eq!(enc.mime_type, "application/x-apple-diskimage");
    assert_eq!(enc.version, "1.0");
    assert_eq!(enc.short_version, "1.0");
    assert_eq!(enc.ed_signature, "sig-1.0==");
    // SHA-256 of b"dmg bytes"
    assert_eq!(
        enc.sha256,
        "cef1330f355ae293587f452d6dd2c1dcc461b33fb4b60180e7d43ee03064c872"
    );
}

#[test]
fn declared_size_is_trusted_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    // 9 bytes on disk, but the caller declares 123456
    let artifact = write_artifact(dir.path(), "MyApp-1.0.dmg", b"dmg bytes");

    let updater = AppcastUpdater::new(&appcast, "https://example.com/downloads");
    updater
        .add_release(&release("MyApp", "1.0", &artifact))
        .unwrap();

    let doc = FeedDocument::load_or_create(&appcast, "unused").unwrap();
    let enc = doc.channel.items[0].enclosure.as_ref().unwrap();
    assert_eq!(enc.length, "123456");
}

// ============================================================================
// Appending and ordering
// ============================================================================

#[test]
fn releases_are_sorted_descending_by_version() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    let updater = AppcastUpdater::new(&appcast, "https://example.com/dl");

    let a1 = write_artifact(dir.path(), "MyApp-1.0.dmg", b"one");
    let a2 = write_artifact(dir.path(), "MyApp-2.0.dmg", b"two");
    updater.add_release(&release("MyApp", "1.0", &a1)).unwrap();
    updater.add_release(&release("MyApp", "2.0", &a2)).unwrap();

    let doc = FeedDocument::load_or_create(&appcast, "unused").unwrap();
    assert_eq!(doc.channel.items.len(), 2);
    assert_eq!(doc.channel.items[0].title, "Version 2.0");
    assert_eq!(doc.channel.items[1].title, "Version 1.0");
}

#[test]
fn numeric_ordering_beats_lexicographic() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    let updater = AppcastUpdater::new(&appcast, "https://example.com/dl");

    for version in ["2.9", "2.10", "2.8.1"] {
        let artifact = write_artifact(dir.path(), &format!("MyApp-{version}.dmg"), b"x");
        updater
            .add_release(&release("MyApp", version, &artifact))
            .unwrap();
    }

    let doc = FeedDocument::load_or_create(&appcast, "unused").unwrap();
    let titles: Vec<&str> = doc.channel.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, ["Version 2.10", "Version 2.9", "Version 2.8.1"]);
}

#[test]
fn same_version_entries_keep_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    let updater = AppcastUpdater::new(&appcast, "https://example.com/dl");

    let first = write_artifact(dir.path(), "MyApp-first.dmg", b"first build");
    let second = write_artifact(dir.path(), "MyApp-second.dmg", b"second build");
    updater
        .add_release(&release("MyApp", "1.0", &first))
        .unwrap();
    updater
        .add_release(&release("MyApp", "1.0", &second))
        .unwrap();

    let doc = FeedDocument::load_or_create(&appcast, "unused").unwrap();
    assert_eq!(doc.channel.items.len(), 2);
    let urls: Vec<&str> = doc
        .channel
        .items
        .iter()
        .map(|i| i.enclosure.as_ref().unwrap().url.as_str())
        .collect();
    assert_eq!(
        urls,
        [
            "https://example.com/dl/MyApp-first.dmg",
            "https://example.com/dl/MyApp-second.dmg",
        ]
    );
}

#[test]
fn channel_headers_are_not_revised_on_later_updates() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    let updater = AppcastUpdater::new(&appcast, "https://example.com/dl");

    let a1 = write_artifact(dir.path(), "a.dmg", b"a");
    updater.add_release(&release("MyApp", "1.0", &a1)).unwrap();

    // Second update declares a different app name; headers must not change.
    let a2 = write_artifact(dir.path(), "b.dmg", b"b");
    updater
        .add_release(&release("RenamedApp", "2.0", &a2))
        .unwrap();

    let doc = FeedDocument::load_or_create(&appcast, "unused").unwrap();
    assert_eq!(doc.channel.title, "MyApp Updates");
}

#[test]
fn existing_entry_hashes_are_not_recomputed() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    let updater = AppcastUpdater::new(&appcast, "https://example.com/dl");

    let a1 = write_artifact(dir.path(), "MyApp-1.0.dmg", b"original");
    updater.add_release(&release("MyApp", "1.0", &a1)).unwrap();

    let doc = FeedDocument::load_or_create(&appcast, "unused").unwrap();
    let original_hash = doc.channel.items[0]
        .enclosure
        .as_ref()
        .unwrap()
        .sha256
        .clone();

    // Mutate the 1.0 artifact, then publish 2.0. The 1.0 hash must be
    // carried over from the document, not re-derived from disk.
    std::fs::write(&a1, b"tampered").unwrap();
    let a2 = write_artifact(dir.path(), "MyApp-2.0.dmg", b"new build");
    updater.add_release(&release("MyApp", "2.0", &a2)).unwrap();

    let doc = FeedDocument::load_or_create(&appcast, "unused").unwrap();
    let item_1_0 = doc
        .channel
        .items
        .iter()
        .find(|i| i.title == "Version 1.0")
        .unwrap();
    assert_eq!(item_1_0.enclosure.as_ref().unwrap().sha256, original_hash);
}

// ============================================================================
// Round-trip stability
// ============================================================================

#[test]
fn reload_and_rewrite_is_byte_stable() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    let updater = AppcastUpdater::new(&appcast, "https://example.com/dl");

    let artifact = write_artifact(dir.path(), "MyApp-1.0.dmg", b"bytes");
    updater
        .add_release(&release("MyApp", "1.0", &artifact))
        .unwrap();

    let first = std::fs::read_to_string(&appcast).unwrap();

    // Load and rewrite twice with no new entry; the file must not drift.
    for _ in 0..2 {
        let doc = FeedDocument::load_or_create(&appcast, "unused").unwrap();
        doc.write_to(&appcast).unwrap();
    }

    let last = std::fs::read_to_string(&appcast).unwrap();
    assert_eq!(first, last);
}

#[test]
fn html_notes_survive_round_trip_unescaped() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    let updater = AppcastUpdater::new(&appcast, "https://example.com/dl");

    let artifact = write_artifact(dir.path(), "MyApp-1.0.dmg", b"bytes");
    let mut input = release("MyApp", "1.0", &artifact);
    input.release_notes = "<ul><li>Faster & better</li></ul>".to_string();
    updater.add_release(&input).unwrap();

    let raw = std::fs::read_to_string(&appcast).unwrap();
    assert!(raw.contains("<![CDATA[<ul><li>Faster & better</li></ul>]]>"));

    let doc = FeedDocument::load_or_create(&appcast, "unused").unwrap();
    assert_eq!(
        doc.channel.items[0].description,
        "<ul><li>Faster & better</li></ul>"
    );
}

#[test]
fn notes_containing_cdata_terminator_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    let updater = AppcastUpdater::new(&appcast, "https://example.com/dl");

    let artifact = write_artifact(dir.path(), "MyApp-1.0.dmg", b"bytes");
    let mut input = release("MyApp", "1.0", &artifact);
    input.release_notes = "<p>code sample: a[b[0]]></p>".to_string();
    updater.add_release(&input).unwrap();

    // The written feed must stay loadable and return the notes intact.
    let doc = FeedDocument::load_or_create(&appcast, "unused").unwrap();
    assert_eq!(
        doc.channel.items[0].description,
        "<p>code sample: a[b[0]]></p>"
    );

    // And rewriting it must not drift.
    let first = std::fs::read_to_string(&appcast).unwrap();
    doc.write_to(&appcast).unwrap();
    let second = std::fs::read_to_string(&appcast).unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// Failure paths
// ============================================================================

#[test]
fn missing_artifact_is_integrity_error_and_nothing_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    let updater = AppcastUpdater::new(&appcast, "https://example.com/dl");

    let missing = dir.path().join("no-such.dmg");
    let err = updater
        .add_release(&release("MyApp", "1.0", &missing))
        .unwrap_err();

    assert!(matches!(err, AppcastError::Integrity { .. }), "{err}");
    assert!(!appcast.exists());
}

#[test]
fn malformed_existing_feed_fails_before_hashing() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    std::fs::write(&appcast, "<rss version=\"2.0\"><channel>").unwrap();

    let updater = AppcastUpdater::new(&appcast, "https://example.com/dl");

    // The artifact is also missing; getting a Document error (not Integrity)
    // proves resolution happens before the hashing stage.
    let missing = dir.path().join("no-such.dmg");
    let err = updater
        .add_release(&release("MyApp", "1.0", &missing))
        .unwrap_err();

    assert!(matches!(err, AppcastError::Document { .. }), "{err}");

    // The malformed file is left untouched.
    let content = std::fs::read_to_string(&appcast).unwrap();
    assert_eq!(content, "<rss version=\"2.0\"><channel>");
}

#[test]
fn non_rss_existing_file_is_document_error() {
    let dir = tempfile::tempdir().unwrap();
    let appcast = dir.path().join("appcast.xml");
    std::fs::write(&appcast, "<html><body>not a feed</body></html>").unwrap();

    let artifact = write_artifact(dir.path(), "MyApp-1.0.dmg", b"bytes");
    let updater = AppcastUpdater::new(&appcast, "https://example.com/dl");
    let err = updater
        .add_release(&release("MyApp", "1.0", &artifact))
        .unwrap_err();

    assert!(matches!(err, AppcastError::Document { .. }), "{err}");
}
