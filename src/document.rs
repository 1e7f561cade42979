use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md"];

/// Text of an uploaded document, or `None` when it holds no text at all.
///
/// PDFs go through `pdf-extract`; plain-text files are read as UTF-8 with
/// invalid bytes replaced.
pub fn read_document_text(path: &Path) -> Result<Option<String>> {
    let bytes = fs::read(path).with_context(|| format!("Failed reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|x| x.to_str())
        .unwrap_or_default();
    text_from_bytes(file_name, &bytes)
        .with_context(|| format!("Failed extracting text from {}", path.display()))
}

pub fn text_from_bytes(file_name: &str, bytes: &[u8]) -> Result<Option<String>> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|x| x.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let text = match extension.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|err| anyhow::anyhow!("PDF parsing failed: {err}"))?,
        ext if TEXT_EXTENSIONS.contains(&ext) => String::from_utf8_lossy(bytes).into_owned(),
        _ => bail!("Unsupported document type for {file_name}. Use .pdf, .txt, .text or .md"),
    };

    if text.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_plain_text_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("auth.txt");
        fs::write(&path, "Requested: 99213, G0101").expect("write");

        let text = read_document_text(&path).expect("read");
        assert_eq!(text.as_deref(), Some("Requested: 99213, G0101"));
    }

    #[test]
    fn blank_documents_have_no_text() {
        assert_eq!(text_from_bytes("empty.txt", b"  \n\t").expect("read"), None);
        assert_eq!(text_from_bytes("empty.md", b"").expect("read"), None);
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let text = text_from_bytes("NOTES.TXT", b"A0428").expect("read");
        assert_eq!(text.as_deref(), Some("A0428"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_document_text(&dir.path().join("missing.pdf")).unwrap_err();
        assert!(err.to_string().contains("missing.pdf"));
    }

    #[test]
    fn unsupported_and_corrupt_documents_are_errors() {
        assert!(text_from_bytes("scan.docx", b"PK").is_err());
        assert!(text_from_bytes("broken.pdf", b"not a pdf").is_err());
    }
}
