use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::AppcastError;

/// Sparkle XML namespace, bound to the `sparkle:` prefix on the root element.
pub const SPARKLE_NS: &str = "http://www.andymatuschak.org/xml-namespaces/sparkle";

/// One release's downloadable artifact reference.
///
/// Carries both the plain RSS enclosure attributes and the `sparkle:`
/// namespaced ones. The byte length appears under both `length` and
/// `sparkle:length` when serialized; a single field backs both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enclosure {
    /// Absolute download URL for the artifact.
    pub url: String,
    /// Declared byte length, stored verbatim as supplied by the caller.
    pub length: String,
    /// Media type of the artifact.
    pub mime_type: String,
    /// `sparkle:version` attribute.
    pub version: String,
    /// `sparkle:shortVersionString` attribute (duplicate of `version` for
    /// entries written by this tool).
    pub short_version: String,
    /// `sparkle:sha256` content hash of the artifact.
    pub sha256: String,
    /// `sparkle:edSignature` supplied by the caller.
    pub ed_signature: String,
}

/// One release entry (`<item>`) in the feed.
///
/// Immutable once appended; the sorting pass only changes sequence position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub pub_date: String,
    pub enclosure: Option<Enclosure>,
    /// `sparkle:version` child element. Redundant with the enclosure
    /// attribute, kept because older Sparkle consumers read the element form.
    pub sparkle_version: Option<String>,
    /// `sparkle:shortVersionString` child element, same story.
    pub sparkle_short_version: Option<String>,
    /// Release notes HTML, stored raw and emitted as CDATA.
    pub description: String,
}

/// The single `<channel>` of the feed. Header fields are set once when the
/// document is first created and never revised on later updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Channel {
    pub title: String,
    pub description: String,
    pub language: String,
    pub items: Vec<Item>,
}

/// An appcast document: `rss[version=2.0]` wrapping exactly one channel.
///
/// Loaded fresh from disk (or synthesized) at the start of a run and written
/// back in full. There are no partial updates and no coordination between
/// concurrent writers; two simultaneous runs against the same path are a
/// last-writer-wins race.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDocument {
    pub channel: Channel,
}

impl FeedDocument {
    /// Resolves the document at `path`: parses it if present, otherwise
    /// synthesizes a minimal skeleton titled for `app_name`.
    ///
    /// # Errors
    ///
    /// Returns [`AppcastError::Document`] when an existing file cannot be
    /// read or does not parse as an appcast. There is no auto-repair.
    pub fn load_or_create(path: &Path, app_name: &str) -> Result<Self, AppcastError> {
        let doc_err = |reason: String| AppcastError::Document {
            path: path.to_path_buf(),
            reason,
        };

        if path.exists() {
            tracing::info!(path = %path.display(), "loading existing appcast");
            let content = std::fs::read_to_string(path).map_err(|e| doc_err(e.to_string()))?;
            return from_xml(&content).map_err(doc_err);
        }

        tracing::info!(path = %path.display(), app = app_name, "creating new appcast");
        Ok(Self::skeleton(app_name))
    }

    /// Minimal valid document: one channel with headers and zero items.
    fn skeleton(app_name: &str) -> Self {
        FeedDocument {
            channel: Channel {
                title: format!("{app_name} Updates"),
                description: format!("Most recent updates to {app_name}"),
                language: "en".to_string(),
                items: Vec::new(),
            },
        }
    }
}

/// Parses a complete appcast document.
///
/// Only the elements this tool writes are recognized; unknown elements are
/// skipped. A missing `<rss>` root, a missing `<channel>`, more than one
/// channel, or any XML error is fatal.
fn from_xml(content: &str) -> Result<FeedDocument, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut saw_rss = false;
    let mut channel: Option<Channel> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"rss" => saw_rss = true,
                b"channel" if saw_rss => {
                    if channel.is_some() {
                        return Err("more than one <channel> element".to_string());
                    }
                    channel = Some(parse_channel(&mut reader)?);
                }
                other => {
                    if !saw_rss {
                        return Err(format!(
                            "root element is <{}>, expected <rss>",
                            String::from_utf8_lossy(other)
                        ));
                    }
                    skip_element(&mut reader, &e)?;
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {e}")),
            _ => {}
        }
        buf.clear();
    }

    if !saw_rss {
        return Err("missing <rss> root element".to_string());
    }
    let channel = channel.ok_or_else(|| "missing <channel> element".to_string())?;
    Ok(FeedDocument { channel })
}

fn parse_channel(reader: &mut Reader<&[u8]>) -> Result<Channel, String> {
    let mut channel = Channel::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"title" => channel.title = read_text(reader, b"title")?,
                b"description" => channel.description = read_text(reader, b"description")?,
                b"language" => channel.language = read_text(reader, b"language")?,
                b"item" => channel.items.push(parse_item(reader)?),
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::End(e)) if e.name().as_ref() == b"channel" => return Ok(channel),
            Ok(Event::Eof) => return Err("unexpected end of document inside <channel>".to_string()),
            Err(e) => return Err(format!("XML parse error: {e}")),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_item(reader: &mut Reader<&[u8]>) -> Result<Item, String> {
    let mut item = Item::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"title" => item.title = read_text(reader, b"title")?,
                b"pubDate" => item.pub_date = read_text(reader, b"pubDate")?,
                b"description" => item.description = read_text(reader, b"description")?,
                b"sparkle:version" => {
                    item.sparkle_version = Some(read_text(reader, b"sparkle:version")?);
                }
                b"sparkle:shortVersionString" => {
                    item.sparkle_short_version =
                        Some(read_text(reader, b"sparkle:shortVersionString")?);
                }
                b"enclosure" => {
                    item.enclosure = Some(parse_enclosure(&e, reader)?);
                    skip_element(reader, &e)?;
                }
                _ => skip_element(reader, &e)?,
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"enclosure" => {
                item.enclosure = Some(parse_enclosure(&e, reader)?);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"item" => return Ok(item),
            Ok(Event::Eof) => return Err("unexpected end of document inside <item>".to_string()),
            Err(e) => return Err(format!("XML parse error: {e}")),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_enclosure(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Enclosure, String> {
    let mut enc = Enclosure::default();
    let decoder = reader.decoder();

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| format!("malformed enclosure attribute: {e}"))?;
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(|e| format!("bad enclosure attribute value: {e}"))?
            .into_owned();
        match attr.key.as_ref() {
            b"url" => enc.url = value,
            b"length" => enc.length = value,
            b"type" => enc.mime_type = value,
            b"sparkle:version" => enc.version = value,
            b"sparkle:shortVersionString" => enc.short_version = value,
            b"sparkle:sha256" => enc.sha256 = value,
            b"sparkle:edSignature" => enc.ed_signature = value,
            // Duplicate of `length`; the plain attribute wins.
            b"sparkle:length" => {}
            _ => {}
        }
    }

    Ok(enc)
}

/// Reads the text content of the element whose start tag was just consumed,
/// up to the matching `end` tag. Text nodes are unescaped; CDATA is taken
/// verbatim.
fn read_text(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String, String> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(t)) => {
                text.push_str(&t.unescape().map_err(|e| format!("bad text content: {e}"))?);
            }
            Ok(Event::CData(c)) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Ok(Event::End(e)) if e.name().as_ref() == end => return Ok(text),
            Ok(Event::Eof) => {
                return Err(format!(
                    "unexpected end of document inside <{}>",
                    String::from_utf8_lossy(end)
                ));
            }
            Ok(Event::Start(e)) => {
                return Err(format!(
                    "unexpected <{}> inside <{}>",
                    String::from_utf8_lossy(e.name().as_ref()),
                    String::from_utf8_lossy(end)
                ));
            }
            Err(e) => return Err(format!("XML parse error: {e}")),
            _ => {}
        }
        buf.clear();
    }
}

/// Skips an unrecognized element and everything inside it.
fn skip_element(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<(), String> {
    let end = start.to_end().into_owned();
    let mut skip = Vec::new();
    reader
        .read_to_end_into(end.name(), &mut skip)
        .map_err(|e| format!("XML parse error: {e}"))?;
    Ok(())
}
