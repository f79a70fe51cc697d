//! XML for generated parts: slides, notes slides, and core properties.
//!
//! Every text run carries explicit formatting so the output looks the same
//! regardless of what the template's master styles say.

use crate::template::PlaceholderInfo;
use crate::xml::{escape, NS_A, NS_P, NS_R, XML_DECL};

/// Font family for all generated text.
pub const FONT_FAMILY: &str = "Calibri";

/// Title size in hundredths of a point.
pub const TITLE_SIZE: u32 = 4400;
/// Subtitle size in hundredths of a point.
pub const SUBTITLE_SIZE: u32 = 2800;
/// Body size in hundredths of a point.
pub const BODY_SIZE: u32 = 1800;
/// Space before and after each body paragraph, in hundredths of a point.
pub const PARAGRAPH_SPACING: u32 = 600;

/// Title color (black).
pub const TITLE_COLOR: &str = "000000";
/// Subtitle color (RGB 89, 89, 89).
pub const SUBTITLE_COLOR: &str = "595959";

const NOTES_MASTER_XML: &str = include_str!("parts/notes_master.xml");

/// Character formatting of one text role.
#[derive(Debug, Clone, Copy)]
struct RunStyle {
    size: u32,
    bold: bool,
    color: Option<&'static str>,
}

const TITLE_STYLE: RunStyle = RunStyle {
    size: TITLE_SIZE,
    bold: true,
    color: Some(TITLE_COLOR),
};

const SUBTITLE_STYLE: RunStyle = RunStyle {
    size: SUBTITLE_SIZE,
    bold: false,
    color: Some(SUBTITLE_COLOR),
};

const BODY_STYLE: RunStyle = RunStyle {
    size: BODY_SIZE,
    bold: false,
    color: None,
};

impl RunStyle {
    fn rpr(&self) -> String {
        let mut xml = format!(r#"<a:rPr lang="en-US" sz="{}""#, self.size);
        if self.bold {
            xml.push_str(r#" b="1""#);
        }
        xml.push_str(r#" dirty="0">"#);
        if let Some(color) = self.color {
            xml.push_str(&format!(
                r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
                color
            ));
        }
        xml.push_str(&format!(
            r#"<a:latin typeface="{0}"/><a:cs typeface="{0}"/></a:rPr>"#,
            FONT_FAMILY
        ));
        xml
    }
}

/// Runs for `text`, one per line, separated by line breaks.
///
/// Always emits at least one run so an empty string still reads back as a
/// paragraph.
fn runs(text: &str, style: &RunStyle) -> String {
    let rpr = style.rpr();
    text.split('\n')
        .map(|line| format!("<a:r>{}<a:t>{}</a:t></a:r>", rpr, escape(line.trim_end_matches('\r'))))
        .collect::<Vec<_>>()
        .join("<a:br/>")
}

fn title_paragraph(text: &str) -> String {
    format!(r#"<a:p><a:pPr algn="l"/>{}</a:p>"#, runs(text, &TITLE_STYLE))
}

fn subtitle_paragraph(text: &str) -> String {
    format!(r#"<a:p><a:pPr algn="l"/>{}</a:p>"#, runs(text, &SUBTITLE_STYLE))
}

fn body_paragraph(text: &str) -> String {
    format!(
        r#"<a:p><a:pPr lvl="0" algn="l"><a:spcBef><a:spcPts val="{0}"/></a:spcBef><a:spcAft><a:spcPts val="{0}"/></a:spcAft></a:pPr>{1}</a:p>"#,
        PARAGRAPH_SPACING,
        runs(text, &BODY_STYLE)
    )
}

/// An empty paragraph; keeps a text body valid without adding text.
const EMPTY_PARAGRAPH: &str = r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#;

fn placeholder_shape(id: u32, placeholder: &PlaceholderInfo, paragraphs: &str) -> String {
    let name = if placeholder.name.is_empty() {
        format!("Placeholder {}", id - 1)
    } else {
        placeholder.name.clone()
    };

    format!(
        concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/>"#,
            r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{ph}</p:nvPr></p:nvSpPr>"#,
            r#"<p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#
        ),
        id = id,
        name = escape(&name),
        ph = placeholder.ph_xml(),
        paragraphs = paragraphs
    )
}

const GROUP_PROPERTIES: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

fn slide_document(shapes: &[String]) -> String {
    format!(
        r#"{decl}<p:sld xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}"><p:cSld><p:spTree>{group}{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = GROUP_PROPERTIES,
        shapes = shapes.concat()
    )
}

/// The title slide: the deck title and, when given, the subtitle.
pub fn title_slide_xml(
    title_placeholder: &PlaceholderInfo,
    subtitle_placeholder: Option<&PlaceholderInfo>,
    title: &str,
    subtitle: Option<&str>,
) -> String {
    let mut shapes = vec![placeholder_shape(2, title_placeholder, &title_paragraph(title))];

    if let (Some(placeholder), Some(text)) = (subtitle_placeholder, subtitle) {
        shapes.push(placeholder_shape(3, placeholder, &subtitle_paragraph(text)));
    }

    slide_document(&shapes)
}

/// A content slide: title plus one level-0 paragraph per bullet.
pub fn content_slide_xml(
    title_placeholder: &PlaceholderInfo,
    body_placeholder: &PlaceholderInfo,
    title: &str,
    bullets: &[String],
) -> String {
    let body = if bullets.is_empty() {
        EMPTY_PARAGRAPH.to_string()
    } else {
        bullets.iter().map(|b| body_paragraph(b)).collect()
    };

    slide_document(&[
        placeholder_shape(2, title_placeholder, &title_paragraph(title)),
        placeholder_shape(3, body_placeholder, &body),
    ])
}

/// A notes slide holding `notes` in its body placeholder, one paragraph
/// per line.
pub fn notes_slide_xml(notes: &str) -> String {
    let paragraphs: String = notes
        .split('\n')
        .map(|line| {
            format!(
                r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                escape(line.trim_end_matches('\r'))
            )
        })
        .collect();

    format!(
        concat!(
            r#"{decl}<p:notes xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}"><p:cSld><p:spTree>{group}"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/>"#,
            r#"<p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr>"#,
            r#"<p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/>"#,
            r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#,
            r#"<p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/>"#,
            r#"<p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#,
            r#"</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>"#
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = GROUP_PROPERTIES,
        paragraphs = paragraphs
    )
}

/// The notes master added to templates that lack one.
pub fn notes_master_xml() -> &'static str {
    NOTES_MASTER_XML
}

/// `docProps/core.xml` with the deck title and optional description.
pub fn core_properties_xml(title: &str, description: Option<&str>) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(concat!(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties""#,
        r#" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/""#,
        r#" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
    ));
    xml.push_str(&format!("<dc:title>{}</dc:title>", escape(title)));
    if let Some(description) = description {
        xml.push_str(&format!(
            "<dc:description>{}</dc:description>",
            escape(description)
        ));
    }
    xml.push_str("<cp:revision>1</cp:revision></cp:coreProperties>");
    xml
}
