//! Maintains Sparkle appcast update feeds for macOS application releases.
//!
//! An appcast is an RSS 2.0 document that auto-update clients poll to
//! discover new releases. Given one release's metadata, this crate loads the
//! existing feed (or creates a fresh one), appends an entry carrying the
//! artifact's SHA-256 hash and EdDSA signature, re-sorts all entries by
//! descending version, and writes the document back atomically.
//!
//! The run is single-threaded and synchronous: resolve document, hash
//! artifact, build entry, sort, serialize. Any stage failure surfaces as a
//! classified [`AppcastError`] and leaves the on-disk feed untouched.

pub mod error;
pub mod feed;
pub mod integrity;
pub mod release;

pub use error::AppcastError;
pub use feed::{AppcastUpdater, FeedDocument};
pub use release::ReleaseInput;
