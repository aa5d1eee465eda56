//! DOCX text extraction.
//!
//! A DOCX file is a ZIP archive; the body text lives in `word/document.xml`.
//! Paragraph and break elements become newlines, tabs become tabs, all other
//! markup is dropped.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use zip::ZipArchive;

use super::ExtractionError;

const DOCUMENT_XML: &str = "word/document.xml";

/// Upper bound on the decompressed size of `word/document.xml`.
pub const MAX_DOCUMENT_XML_BYTES: u64 = 64 * 1024 * 1024;

static PARAGRAPH_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</w:p>").unwrap());
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:(?:br|cr)\b[^>]*/>").unwrap());
static TAB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<w:tab\b[^>]*/>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#x[0-9A-Fa-f]+|lt|gt|quot|apos|amp);").unwrap());

const FAILED: &str = "Failed to extract text from DOCX file";

pub fn extract_docx(path: &Path) -> Result<String, ExtractionError> {
    extract_docx_bounded(path, MAX_DOCUMENT_XML_BYTES)
}

fn extract_docx_bounded(path: &Path, limit: u64) -> Result<String, ExtractionError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        warn!(error = %e, "DOCX is not a valid ZIP archive");
        ExtractionError::ExtractionFailed(FAILED)
    })?;

    let mut entry = archive.by_name(DOCUMENT_XML).map_err(|e| {
        warn!(error = %e, "DOCX has no {}", DOCUMENT_XML);
        ExtractionError::ExtractionFailed(FAILED)
    })?;

    if entry.size() > limit {
        warn!(size = entry.size(), limit, "{} exceeds size limit", DOCUMENT_XML);
        return Err(ExtractionError::ExtractionFailed(FAILED));
    }

    // The declared size can lie; cap what is actually inflated as well.
    let mut xml = String::new();
    entry
        .by_ref()
        .take(limit + 1)
        .read_to_string(&mut xml)
        .map_err(|e| {
            warn!(error = %e, "Failed to read {}", DOCUMENT_XML);
            ExtractionError::ExtractionFailed(FAILED)
        })?;
    if xml.len() as u64 > limit {
        warn!(limit, "{} inflates past size limit", DOCUMENT_XML);
        return Err(ExtractionError::ExtractionFailed(FAILED));
    }

    Ok(document_xml_to_text(&xml))
}

/// Convert WordprocessingML body markup to plain text.
pub fn document_xml_to_text(xml: &str) -> String {
    let text = PARAGRAPH_END.replace_all(xml, "\n");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = TAB.replace_all(&text, "\t");
    let text = TAG.replace_all(&text, "");
    decode_entities(&text).trim().to_string()
}

/// Decode the predefined XML entities and numeric character references in
/// one pass. References to invalid code points are kept as written.
fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => {
                    let code = match name.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => name[1..].parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Deep Learning &amp; Proteins</w:t></w:r></w:p><w:p><w:r><w:t>Abstract</w:t><w:tab/><w:t>We fold &lt;things&gt;.</w:t><w:br/><w:t xml:space="preserve">Second line</w:t></w:r></w:p></w:body></w:document>"#;

    #[test]
    fn test_document_xml_to_text() {
        assert_eq!(
            document_xml_to_text(BODY),
            "Deep Learning & Proteins\nAbstract\tWe fold <things>.\nSecond line"
        );
    }

    #[test]
    fn test_entities_decode_once() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_numeric_character_references() {
        assert_eq!(
            decode_entities("It&#8217;s &#x201C;fine&#x201d; &#65;"),
            "It\u{2019}s \u{201C}fine\u{201D} A"
        );
        assert_eq!(decode_entities("&#xD800; &#99999999;"), "&#xD800; &#99999999;");
        assert_eq!(decode_entities("&amp;#8217;"), "&#8217;");
    }

    fn write_docx(body: &[u8]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut writer = zip::ZipWriter::new(file.reopen().unwrap());
        writer
            .start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer
            .start_file(DOCUMENT_XML, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body).unwrap();
        writer.finish().unwrap();
        file
    }

    #[test]
    fn test_extract_docx_archive() {
        let file = write_docx(BODY.as_bytes());
        let text = extract_docx(file.path()).unwrap();
        assert!(text.starts_with("Deep Learning & Proteins\n"));
    }

    #[test]
    fn test_extract_docx_rejects_oversized_document_xml() {
        // 4 KiB of markup compresses to a few bytes but inflates past the limit.
        let body = "<w:p/>".repeat(700);
        let file = write_docx(body.as_bytes());

        let err = extract_docx_bounded(file.path(), 1024).unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailed(FAILED)));

        let text = extract_docx_bounded(file.path(), body.len() as u64).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_extract_docx_not_a_zip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"plain text pretending to be docx").unwrap();

        let err = extract_docx(file.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailed(FAILED)));
    }
}
