//! Markdown/plain text pass-through (spec §4.2): minimal normalization,
//! title taken from the first top-level heading when present.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// For markdown input, strip formatting down to the plain reading text and
/// pull a title from the first `# Heading` if one exists. For plain text
/// input callers should call this too — with no markdown constructs present
/// it degrades to whitespace normalization only.
pub fn extract(source: &str) -> (String, String) {
    let parser = Parser::new(source);
    let mut title = String::new();
    let mut body = String::new();
    let mut in_first_h1 = false;
    let mut seen_h1 = false;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { level: HeadingLevel::H1, .. }) if !seen_h1 => {
                in_first_h1 = true;
            }
            Event::End(TagEnd::Heading(HeadingLevel::H1)) if in_first_h1 => {
                in_first_h1 = false;
                seen_h1 = true;
            }
            Event::Text(text) | Event::Code(text) => {
                if in_first_h1 {
                    title.push_str(&text);
                } else {
                    body.push_str(&text);
                    body.push(' ');
                }
            }
            Event::SoftBreak | Event::HardBreak => body.push(' '),
            _ => {}
        }
    }

    (title.trim().to_string(), normalize(&body))
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
