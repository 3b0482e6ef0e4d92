use std::io::{self, Cursor, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::document::{FeedDocument, Item, SPARKLE_NS};
use crate::error::AppcastError;

impl FeedDocument {
    /// Renders the document as an indented XML string with a declaration
    /// header. Release notes are emitted as CDATA so embedded HTML survives
    /// verbatim instead of being entity-escaped.
    pub fn to_xml(&self) -> Result<String, AppcastError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        emit(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        rss.push_attribute(("xmlns:sparkle", SPARKLE_NS));
        emit(&mut writer, Event::Start(rss))?;

        emit(&mut writer, Event::Start(BytesStart::new("channel")))?;
        text_element(&mut writer, "title", &self.channel.title)?;
        text_element(&mut writer, "description", &self.channel.description)?;
        text_element(&mut writer, "language", &self.channel.language)?;

        for item in &self.channel.items {
            write_item(&mut writer, item)?;
        }

        emit(&mut writer, Event::End(BytesEnd::new("channel")))?;
        emit(&mut writer, Event::End(BytesEnd::new("rss")))?;

        let bytes = writer.into_inner().into_inner();
        let xml =
            String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(xml)
    }

    /// Serializes the document and replaces the file at `path` atomically:
    /// write to a randomized temp file in the same directory, sync, rename.
    /// The destination is never left in a partial state.
    ///
    /// # Errors
    ///
    /// Returns [`AppcastError::Write`] on any filesystem failure; the temp
    /// file is removed on the way out.
    pub fn write_to(&self, path: &Path) -> Result<(), AppcastError> {
        let content = self.to_xml()?;

        // Randomized temp filename so a concurrent run cannot collide with
        // our in-flight write.
        let random_suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let temp_path = path.with_extension(format!("tmp.{random_suffix:016x}"));

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;

        file.write_all(content.as_bytes()).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            e
        })?;

        file.sync_all().map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            e
        })?;

        drop(file);

        std::fs::rename(&temp_path, path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            e
        })?;

        tracing::info!(path = %path.display(), "wrote appcast");
        Ok(())
    }
}

/// Writes one event, normalizing the writer's error into `io::Error`.
fn emit<W: io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> io::Result<()> {
    writer.write_event(event).map_err(io::Error::other)
}

fn write_item<W: io::Write>(writer: &mut Writer<W>, item: &Item) -> io::Result<()> {
    emit(writer, Event::Start(BytesStart::new("item")))?;

    text_element(writer, "title", &item.title)?;
    text_element(writer, "pubDate", &item.pub_date)?;

    if let Some(enc) = &item.enclosure {
        let mut e = BytesStart::new("enclosure");
        e.push_attribute(("url", enc.url.as_str()));
        e.push_attribute(("length", enc.length.as_str()));
        e.push_attribute(("type", enc.mime_type.as_str()));
        e.push_attribute(("sparkle:version", enc.version.as_str()));
        e.push_attribute(("sparkle:shortVersionString", enc.short_version.as_str()));
        e.push_attribute(("sparkle:sha256", enc.sha256.as_str()));
        e.push_attribute(("sparkle:edSignature", enc.ed_signature.as_str()));
        e.push_attribute(("sparkle:length", enc.length.as_str()));
        emit(writer, Event::Empty(e))?;
    }

    if let Some(version) = &item.sparkle_version {
        text_element(writer, "sparkle:version", version)?;
    }
    if let Some(short) = &item.sparkle_short_version {
        text_element(writer, "sparkle:shortVersionString", short)?;
    }

    emit(writer, Event::Start(BytesStart::new("description")))?;
    write_cdata(writer, &item.description)?;
    emit(writer, Event::End(BytesEnd::new("description")))?;

    emit(writer, Event::End(BytesEnd::new("item")))?;
    Ok(())
}

/// Writes text as CDATA. A literal `]]>` cannot appear inside a CDATA
/// section, so the text is split after each `]]` and emitted as consecutive
/// sections; the parser concatenates them back to the original on reload.
fn write_cdata<W: io::Write>(writer: &mut Writer<W>, text: &str) -> io::Result<()> {
    let mut rest = text;
    while let Some(idx) = rest.find("]]>") {
        let (head, tail) = rest.split_at(idx + 2);
        emit(writer, Event::CData(BytesCData::new(head)))?;
        rest = tail;
    }
    emit(writer, Event::CData(BytesCData::new(rest)))?;
    Ok(())
}

fn text_element<W: io::Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    emit(writer, Event::Start(BytesStart::new(tag)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
