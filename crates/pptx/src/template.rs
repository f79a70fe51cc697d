//! Deck templates and their layout contract.
//!
//! A template is any `.pptx` package. Rendering needs two layouts from the
//! first slide master, in the master's own order: layout 0 for the title
//! slide and layout 1 for content slides.

use crate::package::{resolve_target, Package};
use crate::xml::{attr, escape, local_name, ordered_rel_ids};
use quick_xml::events::Event;
use quick_xml::Reader;
use slidegen_core::{Error, Result};
use std::fs;
use std::path::Path;

/// Parts of the built-in template, keyed by part name.
const BUILTIN_PARTS: &[(&str, &str)] = &[
    (
        "[Content_Types].xml",
        include_str!("default_template/content_types.xml"),
    ),
    ("_rels/.rels", include_str!("default_template/root.rels")),
    ("docProps/core.xml", include_str!("default_template/core.xml")),
    ("docProps/app.xml", include_str!("default_template/app.xml")),
    (
        "ppt/presentation.xml",
        include_str!("default_template/presentation.xml"),
    ),
    (
        "ppt/_rels/presentation.xml.rels",
        include_str!("default_template/presentation.xml.rels"),
    ),
    ("ppt/presProps.xml", include_str!("default_template/presProps.xml")),
    ("ppt/viewProps.xml", include_str!("default_template/viewProps.xml")),
    (
        "ppt/tableStyles.xml",
        include_str!("default_template/tableStyles.xml"),
    ),
    (
        "ppt/slideMasters/slideMaster1.xml",
        include_str!("default_template/slideMaster1.xml"),
    ),
    (
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        include_str!("default_template/slideMaster1.xml.rels"),
    ),
    (
        "ppt/slideLayouts/slideLayout1.xml",
        include_str!("default_template/slideLayout1.xml"),
    ),
    (
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        include_str!("default_template/slideLayout1.xml.rels"),
    ),
    (
        "ppt/slideLayouts/slideLayout2.xml",
        include_str!("default_template/slideLayout2.xml"),
    ),
    (
        "ppt/slideLayouts/_rels/slideLayout2.xml.rels",
        include_str!("default_template/slideLayout2.xml.rels"),
    ),
    ("ppt/theme/theme1.xml", include_str!("default_template/theme1.xml")),
];

/// A placeholder declared on a slide layout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaceholderInfo {
    /// The `type` attribute (`title`, `ctrTitle`, `subTitle`, `body`, ...).
    /// Absent means an object placeholder.
    pub kind: Option<String>,
    /// The `idx` attribute.
    pub idx: Option<u32>,
    /// Shape name from `cNvPr`.
    pub name: String,
}

impl PlaceholderInfo {
    /// Whether this placeholder holds a slide title.
    pub fn is_title(&self) -> bool {
        matches!(self.kind.as_deref(), Some("title") | Some("ctrTitle"))
    }

    /// Whether this placeholder is the primary body slot (`idx="1"`).
    pub fn is_primary_body(&self) -> bool {
        self.idx == Some(1) && !self.is_title()
    }

    /// The `<p:ph>` element a slide uses to inherit from this placeholder.
    pub fn ph_xml(&self) -> String {
        let mut xml = String::from("<p:ph");
        if let Some(kind) = &self.kind {
            xml.push_str(&format!(r#" type="{}""#, escape(kind)));
        }
        if let Some(idx) = self.idx {
            xml.push_str(&format!(r#" idx="{}""#, idx));
        }
        xml.push_str("/>");
        xml
    }
}

/// A slide layout and its placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutInfo {
    /// Part name of the layout.
    pub part: String,
    /// Display name from `cSld/@name`.
    pub name: Option<String>,
    /// Placeholders in shape-tree order.
    pub placeholders: Vec<PlaceholderInfo>,
}

impl LayoutInfo {
    /// First title placeholder.
    pub fn title_placeholder(&self) -> Option<&PlaceholderInfo> {
        self.placeholders.iter().find(|p| p.is_title())
    }

    /// The `idx="1"` placeholder.
    pub fn body_placeholder(&self) -> Option<&PlaceholderInfo> {
        self.placeholders.iter().find(|p| p.is_primary_body())
    }
}

/// The two layouts rendering depends on, already validated.
#[derive(Debug, Clone)]
pub(crate) struct RequiredLayouts {
    /// Slide master both layouts belong to.
    pub master_part: String,
    /// Layout 0, used for the title slide.
    pub title: LayoutInfo,
    /// Layout 1, used for every content slide.
    pub content: LayoutInfo,
}

/// A template handle: the package new decks are built from.
#[derive(Debug, Clone)]
pub struct DeckTemplate {
    package: Package,
}

impl DeckTemplate {
    /// The built-in 4:3 template with a title and a title-and-content layout.
    pub fn builtin() -> Self {
        let mut package = Package::new();
        for (name, content) in BUILTIN_PARTS {
            package.set_part(*name, *content);
        }
        Self { package }
    }

    /// Load a template file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            Error::ConfigError(format!(
                "Cannot read deck template '{}': {}",
                path.display(),
                e
            ))
        })?;
        log::debug!("Loaded deck template from {}", path.display());
        Self::from_bytes(&bytes)
    }

    /// Load a template from `.pptx` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let package = Package::from_bytes(bytes)
            .map_err(|e| Error::ConfigError(format!("Invalid deck template: {}", e)))?;
        Self::from_package(package)
    }

    /// Wrap an in-memory package.
    pub fn from_package(package: Package) -> Result<Self> {
        let main = package
            .main_part()
            .map_err(|e| Error::ConfigError(format!("Invalid deck template: {}", e)))?;

        match main {
            Some(part) if package.contains(&part) => Ok(Self { package }),
            _ => Err(Error::ConfigError(
                "Deck template has no presentation part".to_string(),
            )),
        }
    }

    /// The underlying package.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Take the underlying package.
    pub fn into_package(self) -> Package {
        self.package
    }

    /// Name of the presentation part.
    pub fn presentation_part(&self) -> Result<String> {
        self.package
            .main_part()
            .map_err(|e| Error::RenderError(format!("Template relationships are unreadable: {}", e)))?
            .ok_or_else(|| Error::RenderError("Template has no presentation part".to_string()))
    }

    /// Layouts of the first slide master, in the master's order.
    pub fn layouts(&self) -> Result<Vec<LayoutInfo>> {
        Ok(self.master_layouts()?.map(|(_, l)| l).unwrap_or_default())
    }

    fn master_layouts(&self) -> Result<Option<(String, Vec<LayoutInfo>)>> {
        let presentation = self.presentation_part()?;
        let presentation_xml = self.required_xml(&presentation)?;

        let master_ids = ordered_rel_ids(presentation_xml, b"sldMasterId")
            .map_err(|e| Error::RenderError(format!("Error parsing {}: {}", presentation, e)))?;
        let rels = self.rels_for(&presentation)?;

        let Some(master_rel) = master_ids.first().and_then(|id| rels.by_id(id)) else {
            return Ok(None);
        };
        let master_part = resolve_target(&presentation, &master_rel.target);
        let master_xml = self.required_xml(&master_part)?;

        let layout_ids = ordered_rel_ids(master_xml, b"sldLayoutId")
            .map_err(|e| Error::RenderError(format!("Error parsing {}: {}", master_part, e)))?;
        let master_rels = self.rels_for(&master_part)?;

        let mut layouts = Vec::with_capacity(layout_ids.len());
        for id in &layout_ids {
            let Some(rel) = master_rels.by_id(id) else {
                log::warn!("Slide master references missing layout relationship {}", id);
                continue;
            };
            let part = resolve_target(&master_part, &rel.target);
            let xml = self.required_xml(&part)?;
            layouts.push(parse_layout(&part, xml)?);
        }

        Ok(Some((master_part, layouts)))
    }

    /// Resolve and validate the title and content layouts.
    pub(crate) fn required_layouts(&self) -> Result<RequiredLayouts> {
        let (master_part, layouts) = self
            .master_layouts()?
            .ok_or_else(|| Error::RenderError("Template has no slide master".to_string()))?;

        if layouts.len() < 2 {
            return Err(Error::RenderError(format!(
                "Template exposes {} layout(s); a title layout and a title-and-content layout are required",
                layouts.len()
            )));
        }

        let mut layouts = layouts.into_iter();
        let (Some(title), Some(content)) = (layouts.next(), layouts.next()) else {
            return Err(Error::RenderError("Template layouts are missing".to_string()));
        };

        if title.title_placeholder().is_none() {
            return Err(Error::RenderError(format!(
                "Title layout '{}' has no title placeholder",
                title.part
            )));
        }
        if content.title_placeholder().is_none() {
            return Err(Error::RenderError(format!(
                "Content layout '{}' has no title placeholder",
                content.part
            )));
        }
        if content.body_placeholder().is_none() {
            return Err(Error::RenderError(format!(
                "Content layout '{}' has no body placeholder",
                content.part
            )));
        }

        Ok(RequiredLayouts {
            master_part,
            title,
            content,
        })
    }

    fn required_xml(&self, part: &str) -> Result<&str> {
        self.package
            .xml_part(part)
            .ok_or_else(|| Error::RenderError(format!("Template part '{}' is missing", part)))
    }

    fn rels_for(&self, part: &str) -> Result<crate::package::Relationships> {
        self.package.relationships(part).map_err(|e| {
            Error::RenderError(format!("Relationships of '{}' are unreadable: {}", part, e))
        })
    }
}

impl Default for DeckTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Collect the placeholders of a layout part.
fn parse_layout(part: &str, xml: &str) -> Result<LayoutInfo> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut name = None;
    let mut placeholders = Vec::new();
    let mut shape_name = String::new();
    let mut in_shape = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match local_name(e.name().as_ref()) {
                    b"cSld" => name = attr(e, b"name"),
                    b"sp" => {
                        in_shape = true;
                        shape_name.clear();
                    }
                    b"cNvPr" if in_shape => {
                        shape_name = attr(e, b"name").unwrap_or_default();
                    }
                    b"ph" if in_shape => {
                        placeholders.push(PlaceholderInfo {
                            kind: attr(e, b"type"),
                            idx: attr(e, b"idx").and_then(|v| v.parse().ok()),
                            name: shape_name.clone(),
                        });
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == b"sp" => {
                in_shape = false;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::RenderError(format!(
                    "Error parsing layout '{}': {}",
                    part, e
                )));
            }
            _ => {}
        }
    }

    Ok(LayoutInfo {
        part: part.to_string(),
        name,
        placeholders,
    })
}
