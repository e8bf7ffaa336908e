//! URL canonicalization for ingestion dedupe (spec §4.4 stage 1).
//!
//! Deliberately separate from [`crate::citation::canonicalize_target_url`]:
//! that one also strips default ports and trailing slashes for citation
//! resolution, this one strips known tracking query parameters instead —
//! the two call sites normalize for different purposes and the spec gives
//! each its own rule set.

/// Query parameters known to carry no identity information, stripped before
/// a source URL is used as a dedupe key.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "mc_cid",
    "mc_eid",
    "igshid",
    "mkt_tok",
    "ref",
];

/// Lowercase the host, drop the fragment, and strip tracking query
/// parameters (spec §4.4 stage 1). Manual string split rather than a `url`
/// crate dependency, matching the hand-rolled approach already used for
/// citation target URLs.
pub fn canonicalize_source_url(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);

    let (scheme, rest) = match without_fragment.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("", without_fragment),
    };

    let (authority, path_and_query) = match rest.split_once('/') {
        Some((authority, path)) => (authority, format!("/{path}")),
        None => (rest, String::new()),
    };
    let host = authority.to_lowercase();

    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (path_and_query, None),
    };
    let filtered_query = query.map(|q| strip_tracking_params(&q)).filter(|q| !q.is_empty());

    let mut result = String::new();
    if !scheme.is_empty() {
        result.push_str(scheme);
        result.push_str("://");
    }
    result.push_str(&host);
    result.push_str(&path);
    if let Some(query) = filtered_query {
        result.push('?');
        result.push_str(&query);
    }
    result
}

fn strip_tracking_params(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or("").to_lowercase();
            !TRACKING_PARAMS.contains(&key.as_str())
        })
        .collect::<Vec<_>>()
        .join("&")
}
