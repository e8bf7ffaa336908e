//! Citation extraction per detected format (spec §4.7).
//!
//! HTML uses `scraper` (already a dependency for C2's readability pass);
//! Markdown link syntax is pulled from `pulldown-cmark` events, the same
//! parser C2 uses for body-text extraction. Bare URLs (PDF text, and
//! markdown prose outside `[text](url)` syntax) are found with a manual
//! scan rather than a regex dependency — the teacher keeps `regex` out of
//! its production dependency set too (only `regex-lite` as a dev-dependency
//! for tests), so a hand-rolled scanner matches its posture here.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use scraper::{ElementRef, Html, Selector};

use crate::model::{classify_citation_type, Citation, ResourceFormat, ResourceId};

/// Cap on citations extracted per resource (spec §4.7).
pub const MAX_CITATIONS_PER_RESOURCE: usize = 50;
const CONTEXT_WINDOW: usize = 50;

/// Extract citations from `raw_bytes` (HTML/Markdown source) or
/// `extracted_text` (PDF, where raw bytes aren't directly scannable text).
pub fn extract_citations(
    format: ResourceFormat,
    raw_bytes: &[u8],
    extracted_text: &str,
    source_resource_id: &ResourceId,
) -> Vec<Citation> {
    let mut citations = match format {
        ResourceFormat::Html => extract_html(&String::from_utf8_lossy(raw_bytes), source_resource_id),
        ResourceFormat::Markdown | ResourceFormat::Text => {
            extract_markdown(&String::from_utf8_lossy(raw_bytes), source_resource_id)
        }
        ResourceFormat::Pdf => extract_bare_urls(extracted_text, source_resource_id),
    };
    citations.truncate(MAX_CITATIONS_PER_RESOURCE);
    citations
}

fn extract_html(html: &str, source_resource_id: &ResourceId) -> Vec<Citation> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").expect("'a[href]' is a valid CSS selector");

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href").map(|href| (el, href)))
        .filter(|(_, href)| is_http_url(href))
        .enumerate()
        .map(|(position, (el, href))| {
            let context = anchor_context(el);
            Citation::new(source_resource_id.clone(), href, position as u32)
                .with_context_snippet(context)
                .with_type(classify_citation_type(href))
        })
        .collect()
}

fn anchor_context(el: ElementRef) -> String {
    let own_text = el.text().collect::<Vec<_>>().join(" ");
    let own_text = own_text.trim();
    if !own_text.is_empty() {
        return own_text.to_string();
    }
    el.parent()
        .and_then(ElementRef::wrap)
        .map(|p| p.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .unwrap_or_default()
}

fn extract_markdown(source: &str, source_resource_id: &ResourceId) -> Vec<Citation> {
    let mut citations = Vec::new();
    let mut position = 0u32;
    let mut in_link: Option<String> = None;
    let mut link_text = String::new();
    let mut seen_urls = std::collections::HashSet::new();

    for event in Parser::new(source) {
        match event {
            Event::Start(Tag::Link { dest_url, .. }) => {
                in_link = Some(dest_url.to_string());
                link_text.clear();
            }
            Event::Text(text) if in_link.is_some() => {
                link_text.push_str(&text);
            }
            Event::End(TagEnd::Link) => {
                if let Some(url) = in_link.take() {
                    if is_http_url(&url) {
                        seen_urls.insert(url.clone());
                        citations.push(
                            Citation::new(source_resource_id.clone(), url.clone(), position)
                                .with_context_snippet(link_text.trim())
                                .with_type(classify_citation_type(&url)),
                        );
                        position += 1;
                    }
                }
            }
            _ => {}
        }
    }

    for (url, start) in scan_bare_urls(source) {
        if seen_urls.contains(&url) {
            continue;
        }
        let context = context_window(source, start, url.len());
        citations.push(
            Citation::new(source_resource_id.clone(), url.clone(), position)
                .with_context_snippet(context)
                .with_type(classify_citation_type(&url)),
        );
        position += 1;
    }

    citations
}

fn extract_bare_urls(text: &str, source_resource_id: &ResourceId) -> Vec<Citation> {
    scan_bare_urls(text)
        .into_iter()
        .enumerate()
        .map(|(position, (url, start))| {
            let context = context_window(text, start, url.len());
            Citation::new(source_resource_id.clone(), url.clone(), position as u32)
                .with_context_snippet(context)
                .with_type(classify_citation_type(&url))
        })
        .collect()
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Scan `text` for bare `http(s)://` URLs, returning `(url, byte_offset)`.
fn scan_bare_urls(text: &str) -> Vec<(String, usize)> {
    const TRAILING_PUNCTUATION: &[u8] = b".,;:!?)]\"'";
    let mut results = Vec::new();
    let mut cursor = 0usize;

    while let Some(rel) = text[cursor..].find("http") {
        let start = cursor + rel;
        if !(text[start..].starts_with("http://") || text[start..].starts_with("https://")) {
            cursor = start + 4;
            continue;
        }

        let mut end = text[start..]
            .find(|c: char| c.is_whitespace() || c == '<' || c == '>')
            .map(|offset| start + offset)
            .unwrap_or(text.len());

        while end > start && TRAILING_PUNCTUATION.contains(&text.as_bytes()[end - 1]) {
            end -= 1;
        }

        results.push((text[start..end].to_string(), start));
        cursor = end.max(start + 4);
        if cursor >= text.len() {
            break;
        }
    }

    results
}

fn context_window(text: &str, url_start: usize, url_len: usize) -> String {
    let before = url_start.saturating_sub(CONTEXT_WINDOW);
    let after = (url_start + url_len + CONTEXT_WINDOW).min(text.len());
    let start = nearest_char_boundary(text, before, false);
    let end = nearest_char_boundary(text, after, true);
    text[start..end].trim().to_string()
}

fn nearest_char_boundary(text: &str, mut idx: usize, forward: bool) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        if forward {
            idx += 1;
        } else {
            idx -= 1;
        }
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_extracts_absolute_links_with_context() {
        let html = r#"<html><body><p>See the <a href="https://arxiv.org/abs/1234">paper</a> for details.</p></body></html>"#;
        let citations = extract_html(html, &ResourceId::new());
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].target_url, "https://arxiv.org/abs/1234");
        assert_eq!(citations[0].context_snippet, "paper");
    }

    #[test]
    fn html_skips_non_http_hrefs() {
        let html = r#"<a href="mailto:a@b.com">mail</a><a href="#section">anchor</a>"#;
        let citations = extract_html(html, &ResourceId::new());
        assert!(citations.is_empty());
    }

    #[test]
    fn markdown_extracts_link_syntax() {
        let md = "See [the paper](https://doi.org/10.1/x) for more.";
        let citations = extract_markdown(md, &ResourceId::new());
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].target_url, "https://doi.org/10.1/x");
        assert_eq!(citations[0].context_snippet, "the paper");
    }

    #[test]
    fn markdown_also_finds_bare_urls() {
        let md = "Raw link: https://example.com/resource and more text.";
        let citations = extract_markdown(md, &ResourceId::new());
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].target_url, "https://example.com/resource");
    }

    #[test]
    fn markdown_does_not_double_count_link_url_as_bare_url() {
        let md = "[link](https://example.com/a) https://example.com/a";
        let citations = extract_markdown(md, &ResourceId::new());
        assert_eq!(citations.len(), 1);
    }

    #[test]
    fn bare_url_scan_trims_trailing_punctuation() {
        let text = "Check this out (https://example.com/page).";
        let found = scan_bare_urls(text);
        assert_eq!(found[0].0, "https://example.com/page");
    }

    #[test]
    fn extraction_is_capped_at_fifty() {
        let mut html = String::from("<html><body>");
        for i in 0..60 {
            html.push_str(&format!(r#"<a href="https://example.com/{i}">link</a>"#));
        }
        html.push_str("</body></html>");
        let citations = extract_citations(ResourceFormat::Html, html.as_bytes(), "", &ResourceId::new());
        assert_eq!(citations.len(), MAX_CITATIONS_PER_RESOURCE);
    }

    /// Cross-checks the hand-rolled scanner against an independent regex
    /// oracle (the teacher's own tests lean on `regex-lite` the same way,
    /// e.g. `spike_06_self_ingestion.rs`'s ADR/type-name patterns) so the
    /// manual scanner can't silently drift from what "a bare URL" means.
    #[test]
    fn bare_url_scan_agrees_with_a_regex_oracle() {
        let text = "See https://example.com/a and https://example.org/b/c?q=1 in the text.";
        let url_pattern = regex_lite::Regex::new(r"https?://[^\s()]+").unwrap();
        let expected: Vec<&str> = url_pattern.find_iter(text).map(|m| m.as_str()).collect();

        let found = scan_bare_urls(text);
        let actual: Vec<&str> = found.iter().map(|(url, _)| url.as_str()).collect();
        assert_eq!(actual, expected);
    }
}
