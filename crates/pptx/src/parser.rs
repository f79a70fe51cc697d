//! Deck reader: recovers titles, bullets, and notes from a package.

use crate::package::{rel_types, resolve_target, Package};
use crate::xml::{attr, local_name, ordered_rel_ids};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use slidegen_core::{Error, Result};

/// Text content of one slide as read back from a deck.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderedSlide {
    /// Text of the title placeholder.
    pub title: String,
    /// Paragraphs of the `idx="1"` placeholder. On a title slide this is
    /// the subtitle.
    pub bullets: Vec<String>,
    /// Speaker notes, if the slide has a non-empty notes surface.
    pub notes: Option<String>,
}

/// Parser for slide text in a presentation package.
pub struct DeckParser;

impl DeckParser {
    /// Create a new deck parser.
    pub fn new() -> Self {
        Self
    }

    /// Read every slide in presentation order.
    pub fn parse(&self, package: &Package) -> Result<Vec<RenderedSlide>> {
        let slide_order = self.slide_order(package)?;
        log::debug!("Reading {} slides", slide_order.len());

        slide_order
            .iter()
            .map(|part| self.parse_slide(package, part))
            .collect()
    }

    /// Slide part names in `sldIdLst` order.
    fn slide_order(&self, package: &Package) -> Result<Vec<String>> {
        let presentation = package
            .main_part()?
            .ok_or_else(|| Error::DecodeError("Package has no presentation part".to_string()))?;
        let xml = read_part(package, &presentation)?;

        let ids = ordered_rel_ids(xml, b"sldId")
            .map_err(|e| Error::DecodeError(format!("Error parsing {}: {}", presentation, e)))?;
        let rels = package.relationships(&presentation)?;

        ids.iter()
            .map(|id| {
                rels.by_id(id)
                    .map(|rel| resolve_target(&presentation, &rel.target))
                    .ok_or_else(|| {
                        Error::DecodeError(format!("Slide relationship {} is missing", id))
                    })
            })
            .collect()
    }

    /// Parse a single slide and its notes.
    fn parse_slide(&self, package: &Package, slide_part: &str) -> Result<RenderedSlide> {
        let shapes = self.extract_shapes_from_xml(read_part(package, slide_part)?)?;

        let mut slide = RenderedSlide::default();
        for shape in shapes {
            match shape.role {
                ShapeRole::Title if slide.title.is_empty() => {
                    slide.title = shape.paragraphs.join("\n");
                }
                ShapeRole::Body if slide.bullets.is_empty() => {
                    slide.bullets = shape.paragraphs;
                }
                _ => {}
            }
        }

        slide.notes = self.notes_for(package, slide_part)?;
        Ok(slide)
    }

    /// Body text of the slide's notes slide, if any.
    fn notes_for(&self, package: &Package, slide_part: &str) -> Result<Option<String>> {
        let rels = package.relationships(slide_part)?;
        let Some(rel) = rels.by_type(rel_types::NOTES_SLIDE).next() else {
            return Ok(None);
        };

        let notes_part = resolve_target(slide_part, &rel.target);
        let shapes = self.extract_shapes_from_xml(read_part(package, &notes_part)?)?;

        let text = shapes
            .into_iter()
            .find(|s| s.role == ShapeRole::Body)
            .map(|s| s.paragraphs.join("\n"))
            .filter(|t| !t.trim().is_empty());
        Ok(text)
    }

    /// Extract placeholder shapes and their paragraphs from slide XML.
    ///
    /// A paragraph counts only when it holds at least one run or field,
    /// so an empty placeholder reads back as no paragraphs.
    fn extract_shapes_from_xml(&self, xml_content: &str) -> Result<Vec<ShapeText>> {
        let mut shapes = Vec::new();
        let mut reader = Reader::from_str(xml_content);

        let mut current_shape: Option<ShapeText> = None;
        let mut in_paragraph = false;
        let mut in_text = false;
        let mut has_run = false;
        let mut current_text = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                    b"sp" => current_shape = Some(ShapeText::default()),
                    b"p" if current_shape.is_some() => {
                        in_paragraph = true;
                        has_run = false;
                        current_text.clear();
                    }
                    b"r" | b"fld" if in_paragraph => has_run = true,
                    b"t" if in_paragraph => in_text = true,
                    b"br" if in_paragraph => current_text.push('\n'),
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                    b"ph" => {
                        if let Some(ref mut shape) = current_shape {
                            shape.role = ShapeRole::from_placeholder(
                                attr(e, b"type").as_deref(),
                                attr(e, b"idx").as_deref(),
                            );
                        }
                    }
                    b"br" if in_paragraph => current_text.push('\n'),
                    _ => {}
                },
                Ok(Event::Text(ref e)) => {
                    if in_text {
                        let text = e.unescape().unwrap_or_default();
                        current_text.push_str(&text);
                    }
                }
                Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                    b"sp" => {
                        if let Some(shape) = current_shape.take() {
                            shapes.push(shape);
                        }
                        in_paragraph = false;
                        in_text = false;
                    }
                    b"p" if in_paragraph => {
                        if has_run {
                            if let Some(ref mut shape) = current_shape {
                                shape.paragraphs.push(std::mem::take(&mut current_text));
                            }
                        }
                        in_paragraph = false;
                    }
                    b"t" => in_text = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::DecodeError(format!("Error parsing slide XML: {}", e)));
                }
                _ => {}
            }
        }

        Ok(shapes)
    }
}

impl Default for DeckParser {
    fn default() -> Self {
        Self::new()
    }
}

/// What a shape holds, judged by its placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ShapeRole {
    Title,
    Body,
    #[default]
    Other,
}

impl ShapeRole {
    fn from_placeholder(kind: Option<&str>, idx: Option<&str>) -> Self {
        match (kind, idx) {
            (Some("title") | Some("ctrTitle"), _) => Self::Title,
            (Some("body"), _) => Self::Body,
            (Some("subTitle") | None, Some("1")) => Self::Body,
            _ => Self::Other,
        }
    }
}

/// Paragraph text of a shape.
#[derive(Debug, Default)]
struct ShapeText {
    role: ShapeRole,
    paragraphs: Vec<String>,
}

fn read_part<'a>(package: &'a Package, part: &str) -> Result<&'a str> {
    package
        .xml_part(part)
        .ok_or_else(|| Error::DecodeError(format!("Part '{}' is missing or not UTF-8", part)))
}
