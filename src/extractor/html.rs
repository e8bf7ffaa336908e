//! Readability-style HTML extraction (spec §4.2): drop nav/footer/script
//! noise, keep the article body, collapse whitespace.

use scraper::{ElementRef, Html, Selector};

/// Ancestor tags whose subtrees are dropped as navigational/boilerplate noise.
const NOISE_TAGS: &[&str] = &[
    "nav", "footer", "header", "script", "style", "noscript", "aside", "form", "svg",
];

/// Extract a title and a flattened plain-text body from raw HTML bytes.
pub fn extract(html: &str) -> (String, String) {
    let document = Html::parse_document(html);
    let title = extract_title(&document);
    let body = extract_body_text(&document);
    (title, collapse_whitespace(&body))
}

fn extract_title(document: &Html) -> String {
    let selector = Selector::parse("title").unwrap();
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            let h1 = Selector::parse("h1").unwrap();
            document
                .select(&h1)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default()
}

fn extract_body_text(document: &Html) -> String {
    let body_selector = Selector::parse("body").unwrap();
    let mut out = String::new();
    match document.select(&body_selector).next() {
        Some(body) => collect_text(body, &mut out),
        None => collect_text(document.root_element(), &mut out),
    }
    out
}

/// Walk the element tree depth-first, skipping the subtree of any element
/// whose tag is in [`NOISE_TAGS`]. Text nodes are appended with a separating
/// space so adjacent inline elements don't run words together.
fn collect_text(el: ElementRef, out: &mut String) {
    if NOISE_TAGS.contains(&el.value().name()) {
        return;
    }
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            collect_text(child_el, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_body_text() {
        let html = "<html><head><title>Deep Learning</title></head><body><h1>Deep Learning</h1><p>Neural networks are powerful.</p></body></html>";
        let (title, body) = extract(html);
        assert_eq!(title, "Deep Learning");
        assert!(body.contains("Neural networks are powerful."));
    }

    #[test]
    fn drops_nav_and_footer_text() {
        let html = "<html><body><nav><p>Home About</p></nav><article><p>Main content here.</p></article><footer><p>Copyright 2024</p></footer></body></html>";
        let (_, body) = extract(html);
        assert!(body.contains("Main content here."));
        assert!(!body.contains("Home"));
        assert!(!body.contains("Copyright"));
    }

    #[test]
    fn falls_back_to_h1_when_no_title_tag() {
        let html = "<html><body><h1>Untitled Article</h1><p>Body text.</p></body></html>";
        let (title, _) = extract(html);
        assert_eq!(title, "Untitled Article");
    }

    #[test]
    fn collapses_repeated_whitespace() {
        let html = "<html><body><p>Line one.\n\n   Line   two.</p></body></html>";
        let (_, body) = extract(html);
        assert_eq!(body, "Line one. Line two.");
    }
}
