//! Appcast feed construction and persistence.
//!
//! The feed is an RSS 2.0 document with Sparkle's namespace carrying
//! per-release version, hash, and signature metadata. This module owns the
//! whole lifecycle of one update run:
//!
//! - [`document`] - the in-memory model and the load-or-create resolver
//! - [`version`] - version parsing and the descending stable sort
//! - `writer` - indented XML serialization and the atomic file replace
//! - [`update`] - the pipeline gluing the stages together
//!
//! # Example
//!
//! ```ignore
//! use appcaster::{AppcastUpdater, ReleaseInput};
//!
//! let updater = AppcastUpdater::new("appcast.xml", "https://example.com/downloads");
//! updater.add_release(&release)?;
//! ```

pub mod document;
pub mod update;
pub mod version;

mod writer;

pub use document::{Channel, Enclosure, FeedDocument, Item, SPARKLE_NS};
pub use update::AppcastUpdater;
pub use version::ParsedVersion;
