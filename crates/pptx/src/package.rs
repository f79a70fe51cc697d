//! OPC package model: parts, relationships, and content types.
//!
//! A `.pptx` file is a ZIP archive of XML parts. The package keeps every
//! part as raw bytes keyed by its name (without a leading slash), so parts
//! the renderer does not understand survive untouched.

use crate::xml::{attr, escape, local_name, XML_DECL};
use quick_xml::events::Event;
use quick_xml::Reader;
use slidegen_core::{Error, Result};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the content types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Relationship type URIs used by the renderer.
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
}

/// Content type strings used by the renderer.
pub mod content_types {
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const NOTES_SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
    pub const NOTES_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
}

/// An in-memory OPC package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every part of a ZIP archive.
    ///
    /// Failures are reported as `DecodeError`; callers loading templates
    /// re-wrap them as configuration errors.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::DecodeError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = BTreeMap::new();
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| Error::DecodeError(format!("Failed to read ZIP entry: {}", e)))?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().trim_start_matches('/').to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)
                .map_err(|e| Error::DecodeError(format!("Failed to read '{}': {}", name, e)))?;
            parts.insert(name, content);
        }

        log::debug!("Read package with {} parts", parts.len());
        Ok(Self { parts })
    }

    /// Read a package from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Write the package as a ZIP archive, content types first.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let ordered = self
            .parts
            .iter()
            .filter(|(name, _)| name.as_str() == CONTENT_TYPES_PART)
            .chain(
                self.parts
                    .iter()
                    .filter(|(name, _)| name.as_str() != CONTENT_TYPES_PART),
            );

        for (name, content) in ordered {
            zip.start_file(name.as_str(), options)
                .map_err(|e| Error::RenderError(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(content)
                .map_err(|e| Error::RenderError(format!("Failed to write '{}': {}", name, e)))?;
        }

        zip.finish()
            .map_err(|e| Error::RenderError(format!("Failed to finish ZIP: {}", e)))
    }

    /// Serialize the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// A part decoded as UTF-8 text.
    pub fn xml_part(&self, name: &str) -> Option<&str> {
        self.part(name).and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Whether a part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Insert or replace a part.
    pub fn set_part(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.parts.insert(name.into(), content.into());
    }

    /// Remove a part, returning its content.
    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        self.parts.remove(name)
    }

    /// All part names in sorted order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// First unused name of the form `{prefix}{n}{suffix}`, counting from 1.
    pub fn next_part_name(&self, prefix: &str, suffix: &str) -> String {
        (1..)
            .map(|n| format!("{}{}{}", prefix, n, suffix))
            .find(|name| !self.contains(name))
            .unwrap_or_default()
    }

    /// Relationships of a part; empty when the part has no `.rels` file.
    pub fn relationships(&self, part: &str) -> Result<Relationships> {
        match self.xml_part(&rels_path_for(part)) {
            Some(xml) => Relationships::parse(xml),
            None => Ok(Relationships::default()),
        }
    }

    /// Name of the main document part, per the package root relationships.
    pub fn main_part(&self) -> Result<Option<String>> {
        let rels = self.relationships("")?;
        let main = rels
            .by_type(rel_types::OFFICE_DOCUMENT)
            .next()
            .map(|rel| resolve_target("", &rel.target));
        Ok(main)
    }

    /// Store the relationships of a part.
    pub fn set_relationships(&mut self, part: &str, rels: &Relationships) {
        self.set_part(rels_path_for(part), rels.to_xml());
    }
}

/// The `.rels` part that holds relationships of `part`.
///
/// The empty string names the package root.
pub fn rels_path_for(part: &str) -> String {
    match part.rfind('/') {
        Some(pos) => format!("{}/_rels/{}.rels", &part[..pos], &part[pos + 1..]),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target relative to its source part.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize_path(absolute);
    }

    let base = source_part
        .rfind('/')
        .map(|pos| &source_part[..pos])
        .unwrap_or("");
    normalize_path(&format!("{}/{}", base, target))
}

/// Relative target that reaches `to_part` from `from_part`.
pub fn relative_target(from_part: &str, to_part: &str) -> String {
    let from_dir: Vec<&str> = from_part.split('/').collect();
    let from_dir = &from_dir[..from_dir.len().saturating_sub(1)];
    let to: Vec<&str> = to_part.split('/').collect();

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = vec![".."; from_dir.len() - common];
    segments.extend(&to[common..]);
    segments.join("/")
}

fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// One relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id, e.g. `rId3`.
    pub id: String,
    /// Relationship type URI.
    pub rel_type: String,
    /// Target, relative to the source part unless external.
    pub target: String,
    /// Whether the target lives outside the package.
    pub external: bool,
}

/// The relationships of one source part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    /// Parse a `.rels` part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut rels = Vec::new();
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if local_name(e.name().as_ref()) == b"Relationship" =>
                {
                    let id = attr(e, b"Id").unwrap_or_default();
                    let rel_type = attr(e, b"Type").unwrap_or_default();
                    let target = attr(e, b"Target").unwrap_or_default();
                    let external = attr(e, b"TargetMode").as_deref() == Some("External");
                    rels.push(Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                    });
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::DecodeError(format!(
                        "Error parsing relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(Self { rels })
    }

    /// Serialize to a `.rels` part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);
        xml.push_str(XML_DECL);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for rel in &self.rels {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape(&rel.id),
                escape(&rel.rel_type),
                escape(&rel.target)
            ));
            if rel.external {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }

    /// Look a relationship up by id.
    pub fn by_id(&self, id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.id == id)
    }

    /// All relationships of a given type, in document order.
    pub fn by_type<'a>(&'a self, rel_type: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.rels.iter().filter(move |r| r.rel_type == rel_type)
    }

    /// Add an internal relationship and return its new id.
    pub fn add(&mut self, rel_type: &str, target: impl Into<String>) -> String {
        let next = self
            .rels
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{}", next);
        self.rels.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.into(),
            external: false,
        });
        id
    }

    /// Remove a relationship by id.
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let pos = self.rels.iter().position(|r| r.id == id)?;
        Some(self.rels.remove(pos))
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Whether there are no relationships.
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }
}

/// The `[Content_Types].xml` part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    /// Parse the content types part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut types = Self::default();
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match local_name(e.name().as_ref()) {
                        b"Default" => {
                            if let (Some(ext), Some(ct)) =
                                (attr(e, b"Extension"), attr(e, b"ContentType"))
                            {
                                types.defaults.push((ext, ct));
                            }
                        }
                        b"Override" => {
                            if let (Some(part), Some(ct)) =
                                (attr(e, b"PartName"), attr(e, b"ContentType"))
                            {
                                types
                                    .overrides
                                    .insert(part.trim_start_matches('/').to_string(), ct);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::DecodeError(format!(
                        "Error parsing content types: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(types)
    }

    /// Serialize to the content types part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(512 + self.overrides.len() * 160);
        xml.push_str(XML_DECL);
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(ext),
                escape(ct)
            ));
        }
        for (part, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="/{}" ContentType="{}"/>"#,
                escape(part),
                escape(ct)
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    /// Declare the content type of a part.
    pub fn set_override(&mut self, part: &str, content_type: &str) {
        self.overrides
            .insert(part.to_string(), content_type.to_string());
    }

    /// Drop the declaration of a part.
    pub fn remove_override(&mut self, part: &str) {
        self.overrides.remove(part);
    }

    /// Declared content type of a part, if overridden.
    pub fn override_for(&self, part: &str) -> Option<&str> {
        self.overrides.get(part).map(String::as_str)
    }
}
