use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::office::{numbered_parts, part_names, OfficeSession};
use super::{ContentExtractor, ExtensionMatcher};
use crate::pattern::SearchPattern;
use crate::{FinderError, Result};

const EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm"];
const LEGACY: &[&str] = &["xls"];

const SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const SHEET_PREFIX: &str = "xl/worksheets/sheet";

/// Searches workbook cells, sheet by sheet, stopping at the first matching cell
#[derive(Debug)]
pub struct SpreadsheetExtractor {
    matcher: ExtensionMatcher,
    session: Option<OfficeSession>,
}

impl SpreadsheetExtractor {
    pub fn new() -> Self {
        tracing::debug!("Spreadsheet extensions: {:?}", EXTENSIONS);
        Self {
            matcher: ExtensionMatcher::OneOf(EXTENSIONS),
            session: Some(OfficeSession::open("spreadsheet")),
        }
    }

    pub fn is_released(&self) -> bool {
        self.session.is_none()
    }
}

impl Default for SpreadsheetExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor for SpreadsheetExtractor {
    fn name(&self) -> &str {
        "Spreadsheet"
    }

    fn matches_extension(&self, extension: &str) -> bool {
        self.matcher.matches(extension)
    }

    fn search(&mut self, path: &Path, pattern: &SearchPattern) -> Result<bool> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| FinderError::Extraction("spreadsheet session already released".into()))?;

        // archive is dropped on every return path below
        let mut archive = session.open_document(path, LEGACY)?;
        let names = part_names(&archive);

        let shared = if names.iter().any(|n| n == SHARED_STRINGS) {
            parse_shared_strings(session.read_part(&mut archive, SHARED_STRINGS)?)?
        } else {
            Vec::new()
        };

        for sheet in numbered_parts(&names, SHEET_PREFIX) {
            let xml = session.read_part(&mut archive, &sheet)?;
            if sheet_has_match(xml, &shared, pattern)? {
                tracing::debug!("Match in {} of {:?}", sheet, path);
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn release(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            tracing::debug!(
                "Closing {} session after {} documents",
                session.kind(),
                session.documents_opened()
            );
        }
        Ok(())
    }
}

/// Shared string table: one entry per `<si>`, rich-text runs concatenated
fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_item = false;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = true;
                    current.clear();
                }
                b"t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = false;
                    strings.push(std::mem::take(&mut current));
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_item && in_text => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

/// Walk every `<c>` of a worksheet and test its displayed text
fn sheet_has_match(xml: &str, shared: &[String], pattern: &SearchPattern) -> Result<bool> {
    let mut reader = Reader::from_str(xml);
    let mut cell_type: Option<String> = None;
    let mut in_cell = false;
    let mut in_value = false;
    let mut value = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"c" => {
                    in_cell = true;
                    value.clear();
                    cell_type = match e.try_get_attribute("t")? {
                        Some(attr) => Some(attr.unescape_value()?.into_owned()),
                        None => None,
                    };
                }
                b"v" | b"t" if in_cell => in_value = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"c" => {
                    in_cell = false;
                    let text = cell_text(cell_type.as_deref(), &value, shared);
                    if !text.is_empty() && pattern.is_match(text) {
                        return Ok(true);
                    }
                }
                b"v" | b"t" => in_value = false,
                _ => {}
            },
            Event::Text(t) if in_value => value.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(false)
}

/// Shared-string cells (`t="s"`) store an index; every other type stores its text
fn cell_text<'a>(cell_type: Option<&str>, raw: &'a str, shared: &'a [String]) -> &'a str {
    match cell_type {
        Some("s") => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared.get(i))
            .map(String::as_str)
            .unwrap_or(""),
        _ => raw,
    }
}
