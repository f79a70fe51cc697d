//! Deck rendering: outline and template in, finished deck out.
//!
//! The renderer itself is stateless. Each call works on its own copy of
//! the template package, so one renderer can serve concurrent requests.

use crate::deck::Deck;
use crate::package::{
    content_types, rel_types, relative_target, rels_path_for, resolve_target, ContentTypes,
    Package, Relationships, CONTENT_TYPES_PART,
};
use crate::template::{DeckTemplate, LayoutInfo};
use crate::writer;
use crate::xml::{escape, local_name, prefix, NS_R};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use slidegen_core::{Error, Result, Slide, StructuredOutline};
use std::io::{Cursor, Write};

/// First id handed to slides in `sldIdLst`.
const FIRST_SLIDE_ID: u32 = 256;

/// Children of `p:presentation` that must follow `p:sldIdLst`.
const AFTER_SLIDE_LIST: &[&[u8]] = &[
    b"sldSz",
    b"notesSz",
    b"smartTags",
    b"embeddedFontLst",
    b"custShowLst",
    b"photoAlbum",
    b"custDataLst",
    b"kinsoku",
    b"defaultTextStyle",
    b"modifyVerifier",
    b"extLst",
];

/// Renders outlines into decks.
#[derive(Debug, Clone, Default)]
pub struct DeckRenderer;

impl DeckRenderer {
    /// Create a new renderer.
    pub fn new() -> Self {
        Self
    }

    /// Render an outline: one title slide, then one slide per outline entry.
    pub fn render(
        &self,
        outline: &StructuredOutline,
        template: &DeckTemplate,
        deck_title: &str,
    ) -> Result<Deck> {
        let slides = outline.slides();
        self.render_slides(&slides, outline.subtitle(), template, deck_title)
    }

    /// Render already-normalized slides.
    pub fn render_slides(
        &self,
        slides: &[Slide],
        subtitle: Option<&str>,
        template: &DeckTemplate,
        deck_title: &str,
    ) -> Result<Deck> {
        let layouts = template.required_layouts()?;
        let mut build = DeckBuild::start(template)?;

        build.remove_existing_slides()?;
        if slides.iter().any(|s| s.notes_text().is_some()) {
            build.ensure_notes_master(&layouts.master_part)?;
        }

        build.add_title_slide(&layouts.title, deck_title, subtitle)?;
        for slide in slides {
            build.add_content_slide(&layouts.content, slide)?;
        }
        build.set_core_properties(deck_title, subtitle)?;

        log::info!("Rendered deck '{}' with {} slides", deck_title, slides.len() + 1);
        build.finish()
    }
}

/// In-progress state of one render call.
struct DeckBuild {
    package: Package,
    content_types: ContentTypes,
    presentation_part: String,
    presentation_rels: Relationships,
    slide_ids: Vec<(u32, String)>,
    notes_master: Option<String>,
    added_notes_master_rel: Option<String>,
}

impl DeckBuild {
    fn start(template: &DeckTemplate) -> Result<Self> {
        let package = template.package().clone();
        let presentation_part = template.presentation_part()?;

        let types_xml = package
            .xml_part(CONTENT_TYPES_PART)
            .ok_or_else(|| Error::RenderError("Template has no content types part".to_string()))?;
        let content_types = ContentTypes::parse(types_xml).map_err(as_render_error)?;

        let presentation_rels = package
            .relationships(&presentation_part)
            .map_err(as_render_error)?;
        let notes_master = presentation_rels
            .by_type(rel_types::NOTES_MASTER)
            .next()
            .map(|rel| resolve_target(&presentation_part, &rel.target));

        Ok(Self {
            package,
            content_types,
            presentation_part,
            presentation_rels,
            slide_ids: Vec::new(),
            notes_master,
            added_notes_master_rel: None,
        })
    }

    /// Drop the template's own slides and their notes, keeping layouts.
    fn remove_existing_slides(&mut self) -> Result<()> {
        let slide_rels: Vec<_> = self
            .presentation_rels
            .by_type(rel_types::SLIDE)
            .cloned()
            .collect();

        for rel in &slide_rels {
            let slide_part = resolve_target(&self.presentation_part, &rel.target);
            let rels = self
                .package
                .relationships(&slide_part)
                .map_err(as_render_error)?;

            for notes in rels.by_type(rel_types::NOTES_SLIDE) {
                let notes_part = resolve_target(&slide_part, &notes.target);
                self.remove_part_with_rels(&notes_part);
            }
            self.remove_part_with_rels(&slide_part);
            self.presentation_rels.remove(&rel.id);
        }

        if !slide_rels.is_empty() {
            log::debug!("Removed {} template slides", slide_rels.len());
        }
        Ok(())
    }

    fn remove_part_with_rels(&mut self, part: &str) {
        self.package.remove_part(part);
        self.package.remove_part(&rels_path_for(part));
        self.content_types.remove_override(part);
    }

    /// Add a notes master, with its own copy of the master's theme, unless
    /// the template already has one.
    fn ensure_notes_master(&mut self, master_part: &str) -> Result<()> {
        if self.notes_master.is_some() {
            return Ok(());
        }

        let master_rels = self
            .package
            .relationships(master_part)
            .map_err(as_render_error)?;
        let theme_source = master_rels
            .by_type(rel_types::THEME)
            .next()
            .map(|rel| resolve_target(master_part, &rel.target))
            .ok_or_else(|| Error::RenderError("Slide master has no theme".to_string()))?;
        let theme = self
            .package
            .part(&theme_source)
            .ok_or_else(|| Error::RenderError(format!("Theme part '{}' is missing", theme_source)))?
            .to_vec();

        let theme_part = self.package.next_part_name("ppt/theme/theme", ".xml");
        self.package.set_part(&theme_part, theme);
        self.content_types
            .set_override(&theme_part, content_types::THEME);

        let notes_master_part = self
            .package
            .next_part_name("ppt/notesMasters/notesMaster", ".xml");
        self.package
            .set_part(&notes_master_part, writer::notes_master_xml());
        self.content_types
            .set_override(&notes_master_part, content_types::NOTES_MASTER);

        let mut rels = Relationships::default();
        rels.add(rel_types::THEME, relative_target(&notes_master_part, &theme_part));
        self.package.set_relationships(&notes_master_part, &rels);

        let rel_id = self.presentation_rels.add(
            rel_types::NOTES_MASTER,
            relative_target(&self.presentation_part, &notes_master_part),
        );
        log::debug!("Added notes master {}", notes_master_part);

        self.notes_master = Some(notes_master_part);
        self.added_notes_master_rel = Some(rel_id);
        Ok(())
    }

    fn add_title_slide(
        &mut self,
        layout: &LayoutInfo,
        title: &str,
        subtitle: Option<&str>,
    ) -> Result<()> {
        let title_ph = layout.title_placeholder().ok_or_else(|| {
            Error::RenderError(format!("Layout '{}' has no title placeholder", layout.part))
        })?;
        let subtitle_ph = layout.body_placeholder();

        if subtitle.is_some() && subtitle_ph.is_none() {
            log::warn!(
                "Title layout '{}' has no subtitle placeholder; subtitle skipped",
                layout.part
            );
        }

        let xml = writer::title_slide_xml(title_ph, subtitle_ph, title, subtitle);
        self.add_slide(layout, xml, None)
    }

    fn add_content_slide(&mut self, layout: &LayoutInfo, slide: &Slide) -> Result<()> {
        let (Some(title_ph), Some(body_ph)) =
            (layout.title_placeholder(), layout.body_placeholder())
        else {
            return Err(Error::RenderError(format!(
                "Layout '{}' lacks title or body placeholder",
                layout.part
            )));
        };

        let xml = writer::content_slide_xml(title_ph, body_ph, &slide.title, &slide.bullets);
        self.add_slide(layout, xml, slide.notes_text())
    }

    fn add_slide(&mut self, layout: &LayoutInfo, xml: String, notes: Option<&str>) -> Result<()> {
        let part = self.package.next_part_name("ppt/slides/slide", ".xml");

        let mut rels = Relationships::default();
        rels.add(rel_types::SLIDE_LAYOUT, relative_target(&part, &layout.part));

        self.package.set_part(&part, xml);
        self.content_types.set_override(&part, content_types::SLIDE);

        if let Some(notes) = notes {
            self.add_notes_slide(&part, &mut rels, notes)?;
        }
        self.package.set_relationships(&part, &rels);

        let rel_id = self.presentation_rels.add(
            rel_types::SLIDE,
            relative_target(&self.presentation_part, &part),
        );
        let slide_id = FIRST_SLIDE_ID + self.slide_ids.len() as u32;
        self.slide_ids.push((slide_id, rel_id));

        log::debug!("Added {} (id {})", part, slide_id);
        Ok(())
    }

    fn add_notes_slide(
        &mut self,
        slide_part: &str,
        slide_rels: &mut Relationships,
        notes: &str,
    ) -> Result<()> {
        let notes_master = self
            .notes_master
            .clone()
            .ok_or_else(|| Error::RenderError("Deck has no notes master".to_string()))?;

        let notes_part = self
            .package
            .next_part_name("ppt/notesSlides/notesSlide", ".xml");
        self.package
            .set_part(&notes_part, writer::notes_slide_xml(notes));
        self.content_types
            .set_override(&notes_part, content_types::NOTES_SLIDE);

        let mut rels = Relationships::default();
        rels.add(rel_types::NOTES_MASTER, relative_target(&notes_part, &notes_master));
        rels.add(rel_types::SLIDE, relative_target(&notes_part, slide_part));
        self.package.set_relationships(&notes_part, &rels);

        slide_rels.add(rel_types::NOTES_SLIDE, relative_target(slide_part, &notes_part));
        Ok(())
    }

    /// Write `docProps/core.xml`, registering it if the template had none.
    fn set_core_properties(&mut self, title: &str, description: Option<&str>) -> Result<()> {
        let mut root_rels = self.package.relationships("").map_err(as_render_error)?;
        let existing = root_rels
            .by_type(rel_types::CORE_PROPERTIES)
            .next()
            .map(|rel| resolve_target("", &rel.target));

        let part = match existing {
            Some(part) => part,
            None => {
                let part = "docProps/core.xml".to_string();
                root_rels.add(rel_types::CORE_PROPERTIES, part.as_str());
                self.package.set_relationships("", &root_rels);
                part
            }
        };

        self.package
            .set_part(&part, writer::core_properties_xml(title, description));
        self.content_types
            .set_override(&part, content_types::CORE_PROPERTIES);
        Ok(())
    }

    fn finish(mut self) -> Result<Deck> {
        let xml = self
            .package
            .xml_part(&self.presentation_part)
            .ok_or_else(|| Error::RenderError("Presentation part is missing".to_string()))?;
        let rewritten = rewrite_presentation(
            xml,
            &self.slide_ids,
            self.added_notes_master_rel.as_deref(),
        )?;

        self.package.set_part(&self.presentation_part, rewritten);
        self.package
            .set_relationships(&self.presentation_part, &self.presentation_rels);
        self.package
            .set_part(CONTENT_TYPES_PART, self.content_types.to_xml());

        Ok(Deck::from_package(self.package))
    }
}

fn as_render_error(error: Error) -> Error {
    match error {
        Error::RenderError(_) => error,
        other => Error::RenderError(other.to_string()),
    }
}

/// Element names used when writing into `presentation.xml`, following the
/// prefixes the document itself binds.
struct ListNames {
    p: String,
    r: String,
}

impl Default for ListNames {
    fn default() -> Self {
        Self {
            p: "p".to_string(),
            r: "r".to_string(),
        }
    }
}

impl ListNames {
    fn from_root(root: &BytesStart<'_>) -> Self {
        let mut names = Self::default();
        names.p = prefix(root.name().as_ref())
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_default();

        for attribute in root.attributes().flatten() {
            let key = attribute.key.as_ref();
            if prefix(key) == Some(&b"xmlns"[..]) && attribute.value.as_ref() == NS_R.as_bytes() {
                names.r = String::from_utf8_lossy(local_name(key)).into_owned();
            }
        }
        names
    }

    fn qualify(&self, local: &str) -> String {
        if self.p.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", self.p, local)
        }
    }

    fn slide_list(&self, slide_ids: &[(u32, String)]) -> String {
        let list = self.qualify("sldIdLst");
        let item = self.qualify("sldId");

        let mut xml = format!("<{}>", list);
        for (id, rel_id) in slide_ids {
            xml.push_str(&format!(
                r#"<{} id="{}" {}:id="{}"/>"#,
                item,
                id,
                self.r,
                escape(rel_id)
            ));
        }
        xml.push_str(&format!("</{}>", list));
        xml
    }

    fn notes_master_list(&self, rel_id: &str) -> String {
        let list = self.qualify("notesMasterIdLst");
        format!(
            r#"<{0}><{1} {2}:id="{3}"/></{0}>"#,
            list,
            self.qualify("notesMasterId"),
            self.r,
            escape(rel_id)
        )
    }
}

/// Rewrite `presentation.xml` with a fresh slide list.
///
/// The old `sldIdLst` is dropped and the new one written where the schema
/// wants it, before `sldSz` and its followers. A newly added notes master
/// is listed right after `sldMasterIdLst`. Everything else streams through
/// untouched.
fn rewrite_presentation(
    xml: &str,
    slide_ids: &[(u32, String)],
    notes_master_rel: Option<&str>,
) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut names = ListNames::default();
    let mut depth = 0usize;
    let mut skipping: Option<usize> = None;
    let mut slide_list_written = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::RenderError(format!("Error parsing presentation: {}", e)))?;

        match event {
            Event::Eof => break,
            Event::Start(e) => {
                depth += 1;
                if skipping.is_some() {
                    continue;
                }

                let local = local_name(e.name().as_ref()).to_vec();
                if depth == 1 {
                    names = ListNames::from_root(&e);
                }
                if depth == 2 {
                    if local == b"sldIdLst" {
                        skipping = Some(depth);
                        continue;
                    }
                    if !slide_list_written && AFTER_SLIDE_LIST.contains(&local.as_slice()) {
                        write_raw(&mut writer, &names.slide_list(slide_ids))?;
                        slide_list_written = true;
                    }
                }
                write_event(&mut writer, Event::Start(e))?;
            }
            Event::End(e) => {
                let level = depth;
                depth = depth.saturating_sub(1);
                if let Some(skip_level) = skipping {
                    if level == skip_level {
                        skipping = None;
                    }
                    continue;
                }

                let local = local_name(e.name().as_ref()).to_vec();
                if level == 1 && !slide_list_written {
                    write_raw(&mut writer, &names.slide_list(slide_ids))?;
                    slide_list_written = true;
                }
                write_event(&mut writer, Event::End(e))?;

                if level == 2 && local == b"sldMasterIdLst" {
                    if let Some(rel_id) = notes_master_rel {
                        write_raw(&mut writer, &names.notes_master_list(rel_id))?;
                    }
                }
            }
            Event::Empty(e) => {
                if skipping.is_some() {
                    continue;
                }

                let local = local_name(e.name().as_ref()).to_vec();
                if depth + 1 == 2 {
                    if local == b"sldIdLst" {
                        continue;
                    }
                    if !slide_list_written && AFTER_SLIDE_LIST.contains(&local.as_slice()) {
                        write_raw(&mut writer, &names.slide_list(slide_ids))?;
                        slide_list_written = true;
                    }
                }
                write_event(&mut writer, Event::Empty(e))?;
            }
            other => {
                if skipping.is_none() {
                    write_event(&mut writer, other)?;
                }
            }
        }
    }

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| Error::RenderError(format!("Presentation is not UTF-8: {}", e)))
}

fn write_event(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::RenderError(format!("Error writing presentation: {}", e)))
}

fn write_raw(writer: &mut Writer<Cursor<Vec<u8>>>, fragment: &str) -> Result<()> {
    writer
        .get_mut()
        .write_all(fragment.as_bytes())
        .map_err(|e| Error::RenderError(format!("Error writing presentation: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESENTATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="300" r:id="rId9"/></p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#;

    fn ids() -> Vec<(u32, String)> {
        vec![(256, "rId10".to_string()), (257, "rId11".to_string())]
    }

    #[test]
    fn test_rewrite_replaces_slide_list() {
        let xml = rewrite_presentation(PRESENTATION, &ids(), None).unwrap();

        assert!(!xml.contains("rId9"));
        assert!(xml.contains(
            r#"<p:sldIdLst><p:sldId id="256" r:id="rId10"/><p:sldId id="257" r:id="rId11"/></p:sldIdLst><p:sldSz"#
        ));
        assert!(xml.starts_with("<?xml"));
        assert!(!xml.contains("notesMasterIdLst"));
    }

    #[test]
    fn test_rewrite_inserts_notes_master_list() {
        let xml = rewrite_presentation(PRESENTATION, &ids(), Some("rId12")).unwrap();
        assert!(xml.contains(
            r#"</p:sldMasterIdLst><p:notesMasterIdLst><p:notesMasterId r:id="rId12"/></p:notesMasterIdLst><p:sldIdLst>"#
        ));
    }

    #[test]
    fn test_rewrite_follows_document_prefixes() {
        let xml = r#"<pml:presentation xmlns:pml="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:rel="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><pml:sldMasterIdLst><pml:sldMasterId id="2147483648" rel:id="rId1"/></pml:sldMasterIdLst></pml:presentation>"#;
        let rewritten = rewrite_presentation(xml, &ids()[..1], None).unwrap();
        assert!(rewritten.contains(
            r#"<pml:sldIdLst><pml:sldId id="256" rel:id="rId10"/></pml:sldIdLst></pml:presentation>"#
        ));
    }

    #[test]
    fn test_rewrite_drops_empty_slide_list() {
        let xml = PRESENTATION.replace(
            r#"<p:sldIdLst><p:sldId id="300" r:id="rId9"/></p:sldIdLst>"#,
            "<p:sldIdLst/>",
        );
        let rewritten = rewrite_presentation(&xml, &ids(), None).unwrap();
        assert_eq!(rewritten.matches("<p:sldIdLst>").count(), 1);
        assert!(!rewritten.contains("<p:sldIdLst/>"));
    }
}
