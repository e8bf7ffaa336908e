//! Format detection (spec §4.2): HTTP Content-Type, then URL suffix, then
//! magic bytes, in that priority order.

use crate::model::ResourceFormat;

/// Detect the format of fetched content using the priority order spec §4.2
/// specifies. Each stage is tried only if the previous one was inconclusive.
pub fn detect_format(content_type: Option<&str>, url: &str, raw_bytes: &[u8]) -> ResourceFormat {
    if let Some(fmt) = from_content_type(content_type) {
        return fmt;
    }
    if let Some(fmt) = from_url_suffix(url) {
        return fmt;
    }
    from_magic_bytes(raw_bytes).unwrap_or(ResourceFormat::Text)
}

fn from_content_type(content_type: Option<&str>) -> Option<ResourceFormat> {
    let ct = content_type?.to_lowercase();
    let ct = ct.split(';').next().unwrap_or(&ct).trim();
    match ct {
        "text/html" | "application/xhtml+xml" => Some(ResourceFormat::Html),
        "application/pdf" => Some(ResourceFormat::Pdf),
        "text/markdown" | "text/x-markdown" => Some(ResourceFormat::Markdown),
        "text/plain" => Some(ResourceFormat::Text),
        _ => None,
    }
}

fn from_url_suffix(url: &str) -> Option<ResourceFormat> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let lower = path.to_lowercase();
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        Some(ResourceFormat::Html)
    } else if lower.ends_with(".pdf") {
        Some(ResourceFormat::Pdf)
    } else if lower.ends_with(".md") || lower.ends_with(".markdown") {
        Some(ResourceFormat::Markdown)
    } else if lower.ends_with(".txt") {
        Some(ResourceFormat::Text)
    } else {
        None
    }
}

fn from_magic_bytes(raw_bytes: &[u8]) -> Option<ResourceFormat> {
    if raw_bytes.starts_with(b"%PDF-") {
        return Some(ResourceFormat::Pdf);
    }
    let head = &raw_bytes[..raw_bytes.len().min(512)];
    let text = String::from_utf8_lossy(head).to_lowercase();
    if text.contains("<html") || text.contains("<!doctype html") {
        return Some(ResourceFormat::Html);
    }
    None
}
