//! Citation resolution (spec §4.7): periodic batch job matching unresolved
//! citations against the corpus by canonical target URL.

use crate::model::{Citation, ResourceId};
use crate::storage::GraphStore;

/// Normalize a URL the same way canonical source URLs are normalized (spec
/// §4.7): lowercase host, strip fragment, strip default ports, strip a
/// trailing slash.
pub fn canonicalize_target_url(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);

    let (scheme, rest) = match without_fragment.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("", without_fragment),
    };

    let (authority, path) = match rest.split_once('/') {
        Some((authority, path)) => (authority, format!("/{path}")),
        None => (rest, String::new()),
    };

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    };
    let host = host.to_lowercase();

    let default_port = match scheme {
        "http" => Some("80"),
        "https" => Some("443"),
        _ => None,
    };
    let keep_port = port.filter(|p| Some(*p) != default_port);

    let mut result = String::new();
    if !scheme.is_empty() {
        result.push_str(scheme);
        result.push_str("://");
    }
    result.push_str(&host);
    if let Some(port) = keep_port {
        result.push(':');
        result.push_str(port);
    }
    let trimmed_path = path.strip_suffix('/').unwrap_or(&path);
    result.push_str(trimmed_path);

    result
}

/// Resolve every unresolved citation in `store` against the corpus by
/// canonical target URL; returns the count of citations resolved this pass.
pub fn resolve_unresolved_citations(store: &dyn GraphStore) -> crate::storage::StorageResult<usize> {
    let unresolved = store.unresolved_citations()?;
    let mut resolved_count = 0;

    for citation in unresolved {
        if let Some(target_id) = resolve_one(store, &citation)? {
            store.update_citation_resolution(&citation.id, &target_id)?;
            resolved_count += 1;
        }
    }

    Ok(resolved_count)
}

fn resolve_one(store: &dyn GraphStore, citation: &Citation) -> crate::storage::StorageResult<Option<ResourceId>> {
    let canonical = canonicalize_target_url(&citation.target_url);
    let resource = store.find_resource_by_canonical_url(&canonical)?;
    Ok(resource.map(|r| r.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Resource;
    use crate::storage::{OpenStore, SqliteStore};

    #[test]
    fn canonicalize_lowercases_host() {
        assert_eq!(
            canonicalize_target_url("https://Example.COM/Path"),
            "https://example.com/Path"
        );
    }

    #[test]
    fn canonicalize_strips_fragment_and_default_port() {
        assert_eq!(
            canonicalize_target_url("https://example.com:443/page#section"),
            "https://example.com/page"
        );
    }

    #[test]
    fn canonicalize_strips_trailing_slash() {
        assert_eq!(canonicalize_target_url("https://example.com/page/"), "https://example.com/page");
    }

    #[test]
    fn canonicalize_keeps_nondefault_port() {
        assert_eq!(
            canonicalize_target_url("http://example.com:8080/page"),
            "http://example.com:8080/page"
        );
    }

    #[test]
    fn resolve_matches_existing_resource_by_canonical_url() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut target = Resource::new("https://example.com/page");
        target.title = "Target".into();
        store.create_resource(&target).unwrap();

        let source = Resource::new("https://example.com/source");
        store.create_resource(&source).unwrap();

        let citation = Citation::new(source.id.clone(), "https://EXAMPLE.com/page/", 0);
        store.create_citation(&citation).unwrap();

        let resolved = resolve_unresolved_citations(&store).unwrap();
        assert_eq!(resolved, 1);

        let citations = store.citations_by_source(&source.id).unwrap();
        assert_eq!(citations[0].target_resource_id, Some(target.id));
    }
}
