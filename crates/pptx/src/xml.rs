//! Small XML helpers shared by the package reader and writers.

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;

/// Namespace of PresentationML.
pub const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
/// Namespace of DrawingML.
pub const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
/// Namespace of officeDocument relationships.
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// XML declaration every generated part starts with.
pub const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Prefix of a namespaced name (`p` for `p:sld`), if any.
pub fn prefix(name: &[u8]) -> Option<&[u8]> {
    name.iter().position(|&b| b == b':').map(|pos| &name[..pos])
}

/// Unescaped value of the attribute named exactly `key`.
pub fn attr(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| attr_string(&a))
}

/// Value of a prefixed `id` attribute, i.e. `r:id` under whatever prefix
/// the part binds the relationships namespace to.
pub fn rel_id_attr(element: &BytesStart<'_>) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| {
            let key = a.key.as_ref();
            prefix(key).is_some_and(|p| p != b"xmlns") && local_name(key) == b"id"
        })
        .map(|a| attr_string(&a))
}

fn attr_string(attribute: &Attribute<'_>) -> String {
    match attribute.unescape_value() {
        Ok(value) => value.into_owned(),
        Err(_) => String::from_utf8_lossy(&attribute.value).into_owned(),
    }
}

/// Relationship ids of every `item` element in document order.
///
/// Used for the ordered id lists of OOXML (`sldIdLst`, `sldMasterIdLst`,
/// `sldLayoutIdLst`), whose order is the display order.
pub fn ordered_rel_ids(xml: &str, item: &[u8]) -> Result<Vec<String>, quick_xml::Error> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Empty(ref e) | Event::Start(ref e) if local_name(e.name().as_ref()) == item => {
                if let Some(id) = rel_id_attr(e) {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ids)
}

/// Escape text for element content or attribute values.
///
/// Characters XML 1.0 cannot carry (C0 controls other than tab, newline
/// and carriage return, plus U+FFFE and U+FFFF) are dropped first.
pub fn escape(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        return quick_xml::escape::escape(text);
    }

    let cleaned: String = text.chars().filter(|c| is_xml_char(*c)).collect();
    Cow::Owned(quick_xml::escape::escape(&cleaned).into_owned())
}

/// Whether `c` may appear in an XML 1.0 document.
fn is_xml_char(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => true,
        '\u{0}'..='\u{1f}' => false,
        '\u{fffe}' | '\u{ffff}' => false,
        _ => true,
    }
}
