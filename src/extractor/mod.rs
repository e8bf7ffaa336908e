//! Content Extractor (C2, spec §4.2).
//!
//! Fetches a URL, detects its format, and produces normalized plain text —
//! deterministic given the same bytes. Grounded structurally on the
//! teacher's staged-pipeline error handling (each stage translates its own
//! failure mode into a single closed error type the caller branches on).

mod fetch;
mod format;
mod html;
mod markdown;
mod pdf;

use std::time::Duration;

use thiserror::Error;

use crate::error::{ErrorKind, HasErrorKind};
use crate::model::ResourceFormat;

pub use fetch::FetchedContent;

/// Extracted text is capped at this length (spec §4.2 default 5 MB); excess
/// is truncated with a trailing marker.
pub const MAX_EXTRACTED_LEN: usize = 5 * 1024 * 1024;
const TRUNCATION_MARKER: &str = "\n\n[... truncated ...]";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("content could not be parsed")]
    Unparseable,
}

impl HasErrorKind for ExtractError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            Self::Fetch(_) => ErrorKind::FetchError,
            Self::Unparseable => ErrorKind::ExtractionError,
        }
    }
}

/// Output of the extraction stage (spec §4.2): `{raw_bytes, content_type,
/// extracted_text, detected_format, fetch_status}`. `fetch_status` is
/// represented by `Result` at the call site rather than as a field here.
pub struct ExtractedContent {
    pub raw_bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub detected_format: ResourceFormat,
    pub title: String,
    pub extracted_text: String,
}

/// Fetch `url` and extract normalized plain text plus a best-effort title.
pub async fn extract_url(url: &str, timeout: Duration) -> Result<ExtractedContent, ExtractError> {
    let fetched = fetch::fetch(url, timeout).await?;
    extract_bytes(
        &fetched.raw_bytes,
        fetched.content_type.as_deref(),
        &fetched.final_url,
    )
}

/// Extract from already-fetched bytes — the deterministic half of the
/// pipeline (spec §4.2 "same bytes → same extracted_text"), split out so it
/// can be exercised in tests and from the ingestion pipeline's retry path
/// without a network round-trip.
pub fn extract_bytes(
    raw_bytes: &[u8],
    content_type: Option<&str>,
    url: &str,
) -> Result<ExtractedContent, ExtractError> {
    let detected_format = format::detect_format(content_type, url, raw_bytes);

    let (title, extracted_text) = match detected_format {
        ResourceFormat::Html => {
            let text = String::from_utf8_lossy(raw_bytes);
            html::extract(&text)
        }
        ResourceFormat::Pdf => {
            let text = pdf::extract(raw_bytes)?;
            (String::new(), normalize_plain(&text))
        }
        ResourceFormat::Markdown | ResourceFormat::Text => {
            let text = String::from_utf8_lossy(raw_bytes);
            markdown::extract(&text)
        }
    };

    Ok(ExtractedContent {
        raw_bytes: raw_bytes.to_vec(),
        content_type: content_type.map(str::to_string),
        detected_format,
        title,
        extracted_text: truncate(&extracted_text),
    })
}

fn normalize_plain(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_EXTRACTED_LEN {
        return text.to_string();
    }
    let mut cut = MAX_EXTRACTED_LEN;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = text[..cut].to_string();
    out.push_str(TRUNCATION_MARKER);
    out
}
