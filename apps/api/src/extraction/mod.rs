//! Text extraction: turns uploaded PDF, DOCX, Markdown and plain-text files into raw text.
//!
//! Extraction is synchronous and CPU-bound; async callers run it on the
//! blocking pool (`tokio::task::spawn_blocking`).

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

mod docx;

/// Uploads larger than this are rejected before parsing.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type '{0}' (expected .pdf, .docx, .txt or .md)")]
    Unsupported(String),

    #[error("File is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("Failed to read DOCX: {0}")]
    Docx(String),

    #[error("No readable text found in '{0}'")]
    Empty(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
    Markdown,
}

impl DocumentKind {
    /// Detects the kind from the file extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractionError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" | "text" => Ok(Self::PlainText),
            "md" | "markdown" => Ok(Self::Markdown),
            _ => Err(ExtractionError::Unsupported(file_name.to_string())),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::PlainText => "text/plain; charset=utf-8",
            Self::Markdown => "text/markdown; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedText {
    pub kind: DocumentKind,
    pub text: String,
    pub word_count: usize,
}

/// Extracts normalized text from an uploaded file.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ExtractionError::TooLarge {
            size: bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }

    let kind = DocumentKind::from_file_name(file_name)?;
    let raw = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?,
        DocumentKind::Docx => docx::extract_docx_text(bytes)?,
        DocumentKind::PlainText => String::from_utf8_lossy(bytes).into_owned(),
        DocumentKind::Markdown => strip_markdown(&String::from_utf8_lossy(bytes)),
    };

    let text = normalize_whitespace(&raw);
    if text.is_empty() {
        return Err(ExtractionError::Empty(file_name.to_string()));
    }

    Ok(ExtractedText {
        kind,
        word_count: text.split_whitespace().count(),
        text,
    })
}

/// Trims every line, collapses inner runs of spaces and keeps at most one blank line in a row.
pub fn normalize_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;

    for line in raw.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(&line);
        blank_run = 0;
    }

    out
}

fn markdown_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"(?m)^```.*$", ""),
            (r"!\[([^\]]*)\]\([^)]*\)", "$1"),
            (r"\[([^\]]+)\]\([^)]*\)", "$1"),
            (r"(?m)^\s{0,3}#{1,6}\s*", ""),
            (r"(?m)^\s{0,3}>\s?", ""),
            (r"(?m)^\s*[-*+]\s+", "- "),
            (r"(\*\*|__)(.+?)(\*\*|__)", "$2"),
            (r"`([^`]*)`", "$1"),
            (r"(?m)^\s*([-*_]\s*){3,}$", ""),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|re| (re, replacement))
        })
        .collect()
    })
}

fn strip_markdown(markdown: &str) -> String {
    markdown_patterns()
        .iter()
        .fold(markdown.to_string(), |text, (re, replacement)| {
            re.replace_all(&text, *replacement).into_owned()
        })
}
