//! Default-language content injection for crawlers.
//!
//! Elements tagged `data-i18n="key"` are usually emptied or filled with
//! a placeholder in the source HTML and translated at runtime. This pass
//! writes the default-language string into the built files so the
//! served markup is already readable.

use anyhow::{Context, Result, bail};
use folio_core::TranslationTable;
use folio_core::text::html_escape;
use quick_xml::events::{BytesStart, Event};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::html::{
    attr_value, create_html_reader, create_html_writer, into_string, is_void,
    rewrite_attrs, tag_name, write_element_raw,
};

/// Content shorter than this (after trimming) counts as a placeholder
pub const MIN_CONTENT_LEN: usize = 3;

const I18N_ATTR: &str = "data-i18n";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InjectionReport {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub injections: usize,
}

/// All `.html` files below `dir`, in a stable order
pub fn find_html_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "html")
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Inject into every HTML file under `dir`.
///
/// Stops at the first file that cannot be read, parsed or written.
pub fn inject_dir(dir: &Path, table: &TranslationTable) -> Result<InjectionReport> {
    let files = find_html_files(dir)?;
    log::info!("[seo] Found {} HTML files", files.len());

    let mut report = InjectionReport::default();
    for file in &files {
        let injections = inject_file(file, table)?;
        report.files_scanned += 1;
        if injections > 0 {
            report.files_changed += 1;
            report.injections += injections;
        }
    }
    Ok(report)
}

/// Inject into one file; it is rewritten only when something changed.
pub fn inject_file(path: &Path, table: &TranslationTable) -> Result<usize> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let (output, injections) =
        inject_html(&content, table).with_context(|| format!("Failed to parse {}", path.display()))?;

    if injections > 0 {
        fs::write(path, output).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("[seo] {}: {} injections", path.display(), injections);
    }
    Ok(injections)
}

/// Inject translations into an HTML document, returning the new markup and
/// the number of injections.
pub fn inject_html(content: &str, table: &TranslationTable) -> Result<(String, usize)> {
    let mut count = 0;
    let output = inject_fragment(content, table, &mut count)?;
    Ok((output, count))
}

fn inject_fragment(content: &str, table: &TranslationTable, count: &mut usize) -> Result<String> {
    let bytes = content.as_bytes();
    let mut reader = create_html_reader(bytes);
    let mut writer = create_html_writer(bytes.len() + 256);

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => {
                let Some(entry) = lookup(&elem, table) else {
                    writer.write_event(Event::Start(elem))?;
                    continue;
                };
                let name = tag_name(&elem);

                // `<input ...>` without the closing slash
                if is_void(name.as_bytes()) {
                    match inject_void(&elem, &name, &entry, count) {
                        Some(out) => writer.write_event(Event::Start(out))?,
                        None => writer.write_event(Event::Start(elem))?,
                    }
                    continue;
                }

                if name == "textarea" {
                    match with_placeholder(&elem, &entry, count) {
                        Some(out) => writer.write_event(Event::Start(out))?,
                        None => writer.write_event(Event::Start(elem))?,
                    }
                    continue;
                }

                let resume = reader.buffer_position() as usize;
                let span = match reader.read_to_end(elem.name()) {
                    Ok(span) => span,
                    Err(e) => {
                        // Omitted end tag (`<li>`, `<p>`): keep the element as is
                        // and carry on right after its start tag
                        log::debug!("[seo] '{}' has no end tag, skipping: {}", entry.key, e);
                        writer.write_event(Event::Start(elem))?;
                        let rest = inject_fragment(&content[resume..], table, count)?;
                        writer.get_mut().write_all(rest.as_bytes())?;
                        break;
                    }
                };
                let inner = &content[span.start as usize..span.end as usize];
                if entry.replaces(inner) {
                    *count += 1;
                    write_element_raw(&mut writer, elem, entry.escaped.as_bytes())?;
                } else {
                    let nested = inject_fragment(inner, table, count)?;
                    write_element_raw(&mut writer, elem, nested.as_bytes())?;
                }
            }
            Ok(Event::Empty(elem)) => {
                let Some(entry) = lookup(&elem, table) else {
                    writer.write_event(Event::Empty(elem))?;
                    continue;
                };
                let name = tag_name(&elem);

                if is_void(name.as_bytes()) || name == "textarea" {
                    let out = if name == "textarea" {
                        with_placeholder(&elem, &entry, count)
                    } else {
                        inject_void(&elem, &name, &entry, count)
                    };
                    match out {
                        Some(out) => writer.write_event(Event::Empty(out))?,
                        None => writer.write_event(Event::Empty(elem))?,
                    }
                } else if entry.replaces("") {
                    *count += 1;
                    let start = rewrite_attrs(&elem, &[], &[]);
                    write_element_raw(&mut writer, start, entry.escaped.as_bytes())?;
                } else {
                    writer.write_event(Event::Empty(elem))?;
                }
            }
            Ok(Event::Eof) => break,
            Ok(event) => writer.write_event(event)?,
            Err(e) => bail!(
                "HTML parse error at position {}: {:?}",
                reader.error_position(),
                e
            ),
        }
    }

    into_string(writer)
}

/// A `data-i18n` key with its escaped default-language string
struct Entry {
    key: String,
    escaped: String,
}

impl Entry {
    /// Placeholder content is empty, the raw key, or too short to be real
    /// text. Content that already holds the translation is left alone.
    fn replaces(&self, current: &str) -> bool {
        let current = current.trim();
        let is_placeholder = current.is_empty()
            || current == self.key
            || current.chars().count() < MIN_CONTENT_LEN;
        is_placeholder && current != self.escaped.trim()
    }
}

fn lookup(elem: &BytesStart<'_>, table: &TranslationTable) -> Option<Entry> {
    let key = attr_value(elem, I18N_ATTR)?;
    let translation = table.get(&key).filter(|t| !t.is_empty())?;
    Some(Entry {
        escaped: html_escape(translation),
        key,
    })
}

fn inject_void(
    elem: &BytesStart<'_>,
    name: &str,
    entry: &Entry,
    count: &mut usize,
) -> Option<BytesStart<'static>> {
    match name {
        "meta" => {
            let current = attr_value(elem, "content").unwrap_or_default();
            if !entry.replaces(&current) {
                return None;
            }
            *count += 1;
            Some(rewrite_attrs(elem, &[("content", entry.escaped.as_str())], &[]))
        }
        "input" => with_placeholder(elem, entry, count),
        _ => None,
    }
}

fn with_placeholder(
    elem: &BytesStart<'_>,
    entry: &Entry,
    count: &mut usize,
) -> Option<BytesStart<'static>> {
    let has_placeholder = attr_value(elem, "placeholder").is_some_and(|p| !p.is_empty());
    if has_placeholder {
        return None;
    }
    *count += 1;
    Some(rewrite_attrs(
        elem,
        &[("placeholder", entry.escaped.as_str())],
        &[],
    ))
}
