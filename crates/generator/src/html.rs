//! Streaming HTML helpers on top of quick-xml.
//!
//! The reader runs with every well-formedness check disabled so HTML5
//! void elements (`<meta ...>`) and loose markup pass through. Events that
//! are not rewritten are written back verbatim.

use anyhow::Result;
use quick_xml::{
    Reader, Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use std::io::{Cursor, Write};

pub type HtmlWriter = Writer<Cursor<Vec<u8>>>;

/// Elements that never have content or a closing tag
const VOID_ELEMENTS: &[&[u8]] = &[
    b"area", b"base", b"br", b"col", b"embed", b"hr", b"img", b"input", b"link", b"meta",
    b"source", b"track", b"wbr",
];

#[inline]
pub fn create_html_reader(content: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    reader
}

#[inline]
pub fn create_html_writer(capacity: usize) -> HtmlWriter {
    Writer::new(Cursor::new(Vec::with_capacity(capacity)))
}

pub fn is_void(name: &[u8]) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|v| v.eq_ignore_ascii_case(name))
}

pub fn tag_name(elem: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(elem.name().as_ref()).to_ascii_lowercase()
}

/// Raw (still escaped) value of an attribute. Valueless attributes yield `""`.
pub fn attr_value(elem: &BytesStart<'_>, name: &str) -> Option<String> {
    elem.html_attributes()
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(name.as_bytes()))
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Rebuild an element, replacing or appending `set` attributes and dropping
/// `remove` ones. Values in `set` must already be escaped.
pub fn rewrite_attrs(
    elem: &BytesStart<'_>,
    set: &[(&str, &str)],
    remove: &[&str],
) -> BytesStart<'static> {
    let tag = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    let mut applied = vec![false; set.len()];
    let mut attrs: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();

    for attr in elem.html_attributes().flatten() {
        let key = attr.key.as_ref();
        if remove.iter().any(|r| key.eq_ignore_ascii_case(r.as_bytes())) {
            continue;
        }
        match set
            .iter()
            .position(|(k, _)| key.eq_ignore_ascii_case(k.as_bytes()))
        {
            Some(i) => {
                if !applied[i] {
                    attrs.push((key.to_vec(), set[i].1.as_bytes().to_vec()));
                    applied[i] = true;
                }
            }
            None => attrs.push((key.to_vec(), attr.value.into_owned())),
        }
    }

    for (i, (key, value)) in set.iter().enumerate() {
        if !applied[i] {
            attrs.push((key.as_bytes().to_vec(), value.as_bytes().to_vec()));
        }
    }

    let mut new_elem = BytesStart::new(tag);
    for (k, v) in &attrs {
        new_elem.push_attribute((k.as_slice(), v.as_slice()));
    }
    new_elem
}

/// Write `<tag ...>raw</tag>` where `inner` is already-escaped markup.
pub fn write_element_raw(writer: &mut HtmlWriter, start: BytesStart<'_>, inner: &[u8]) -> Result<()> {
    let end = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    writer.write_event(Event::Start(start))?;
    writer.get_mut().write_all(inner)?;
    writer.write_event(Event::End(BytesEnd::new(end)))?;
    Ok(())
}

/// Write an empty element with pre-escaped attribute values: `<tag a="b"/>`.
pub fn write_empty_elem(writer: &mut HtmlWriter, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut elem = BytesStart::new(tag);
    for (k, v) in attrs {
        elem.push_attribute((k.as_bytes(), v.as_bytes()));
    }
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

/// Write escaped text
pub fn write_escaped_text(writer: &mut HtmlWriter, escaped: &str) -> Result<()> {
    writer.write_event(Event::Text(BytesText::from_escaped(escaped)))?;
    Ok(())
}

pub fn into_string(writer: HtmlWriter) -> Result<String> {
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}
