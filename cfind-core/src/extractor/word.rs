use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::office::{part_names, OfficeSession};
use super::{ContentExtractor, ExtensionMatcher};
use crate::pattern::SearchPattern;
use crate::{FinderError, Result};

const EXTENSIONS: &[&str] = &["doc", "docx", "docm"];
const LEGACY: &[&str] = &["doc"];

const BODY: &str = "word/document.xml";

/// Searches the whole text of a word-processor document
///
/// Body, headers, footers, footnotes and endnotes are joined into one blob,
/// one paragraph per line, and the pattern is tested against that blob.
#[derive(Debug)]
pub struct WordDocumentExtractor {
    matcher: ExtensionMatcher,
    session: Option<OfficeSession>,
}

impl WordDocumentExtractor {
    pub fn new() -> Self {
        tracing::debug!("Word document extensions: {:?}", EXTENSIONS);
        Self {
            matcher: ExtensionMatcher::OneOf(EXTENSIONS),
            session: Some(OfficeSession::open("word document")),
        }
    }

    pub fn is_released(&self) -> bool {
        self.session.is_none()
    }

    /// Extract the document text without matching it
    pub fn extract_text(&mut self, path: &Path) -> Result<String> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| FinderError::Extraction("word document session already released".into()))?;

        let mut archive = session.open_document(path, LEGACY)?;
        let names = part_names(&archive);
        if !names.iter().any(|n| n == BODY) {
            return Err(FinderError::Extraction(format!(
                "{} has no {}",
                path.display(),
                BODY
            )));
        }

        let mut text = String::new();
        for part in text_parts(&names) {
            let xml = session.read_part(&mut archive, &part)?;
            append_paragraphs(xml, &mut text)?;
        }
        // paragraphs are separated, not terminated, by newlines
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }
}

impl Default for WordDocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor for WordDocumentExtractor {
    fn name(&self) -> &str {
        "Word Document"
    }

    fn matches_extension(&self, extension: &str) -> bool {
        self.matcher.matches(extension)
    }

    fn search(&mut self, path: &Path, pattern: &SearchPattern) -> Result<bool> {
        let text = self.extract_text(path)?;
        Ok(pattern.is_match(&text))
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

/// Body first, then headers, footers, footnotes and endnotes in name order
fn text_parts(names: &[String]) -> Vec<String> {
    let mut extra: Vec<String> = names
        .iter()
        .filter(|name| {
            let Some(rest) = name.strip_prefix("word/") else {
                return false;
            };
            rest.ends_with(".xml")
                && !rest.contains('/')
                && ["header", "footer", "footnotes", "endnotes"]
                    .iter()
                    .any(|kind| rest.starts_with(kind))
        })
        .cloned()
        .collect();
    extra.sort();

    let mut parts = vec![BODY.to_string()];
    parts.extend(extra);
    parts
}

/// Append the text runs of one part, ending each paragraph with a newline
fn append_paragraphs(xml: &str, out: &mut String) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => out.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_docx(path: &Path, parts: &[(&str, &str)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, xml) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    const BODY_XML: &str = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world</w:t></w:r></w:p>
<w:p><w:r><w:t>Second</w:t><w:tab/><w:t>line &lt;b&gt;</w:t></w:r></w:p>
</w:body>
</w:document>"#;

    const HEADER_XML: &str = r#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:p><w:r><w:t>Confidential</w:t></w:r></w:p></w:hdr>"#;

    #[test]
    fn test_append_paragraphs() {
        let mut text = String::new();
        append_paragraphs(BODY_XML, &mut text).unwrap();
        assert_eq!(text, "Hello world\nSecond\tline <b>\n");
    }

    #[test]
    fn test_text_parts_order() {
        let names: Vec<String> = [
            "word/footer1.xml",
            "word/document.xml",
            "word/header1.xml",
            "word/styles.xml",
            "word/_rels/header1.xml.rels",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        assert_eq!(
            text_parts(&names),
            vec!["word/document.xml", "word/footer1.xml", "word/header1.xml"]
        );
    }

    #[test]
    fn test_search_body_and_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memo.docx");
        write_docx(&path, &[(BODY, BODY_XML), ("word/header1.xml", HEADER_XML)]);

        let mut extractor = WordDocumentExtractor::new();
        assert!(extractor.search(&path, &SearchPattern::literal("HELLO WORLD")).unwrap());
        assert!(extractor.search(&path, &SearchPattern::literal("confidential")).unwrap());
        assert!(extractor.search(&path, &SearchPattern::regex("(?m)^second").unwrap()).unwrap());
        assert!(!extractor.search(&path, &SearchPattern::literal("absent")).unwrap());
    }

    #[test]
    fn test_extracted_text_has_no_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memo.docx");
        write_docx(&path, &[(BODY, BODY_XML), ("word/header1.xml", HEADER_XML)]);

        let mut extractor = WordDocumentExtractor::new();
        let text = extractor.extract_text(&path).unwrap();
        assert_eq!(text, "Hello world\nSecond\tline <b>\nConfidential");
        assert!(extractor
            .search(&path, &SearchPattern::regex("confidential$").unwrap())
            .unwrap());
    }

    #[test]
    fn test_missing_body_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("odd.docx");
        write_docx(&path, &[("word/styles.xml", "<w:styles/>")]);

        let mut extractor = WordDocumentExtractor::new();
        let err = extractor.search(&path, &SearchPattern::literal("x")).unwrap_err();
        assert!(matches!(err, FinderError::Extraction(_)));
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut extractor = WordDocumentExtractor::new();
        extractor.release().unwrap();
        extractor.release().unwrap();
        assert!(extractor.is_released());
    }
}
