//! Pluggable external search provider (spec §4.10 step 3): a trait any
//! search backend can implement, plus a default DuckDuckGo-style HTML
//! scraper grounded on the same `reqwest` fetch shape as the extractor's
//! HTTP stage.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use scraper::{Html, Selector};
use thiserror::Error;
use tokio::sync::Mutex;

/// One candidate hit from an external search provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider response could not be parsed: {0}")]
    Parse(String),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<CandidateHit>, ProviderError>;
}

/// Default provider (spec §4.10): queries DuckDuckGo's no-JS HTML endpoint
/// and scrapes result anchors/snippets the same way `citation::extract`
/// scrapes anchors from ingested HTML.
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
}

impl DuckDuckGoProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<CandidateHit>, ProviderError> {
        let response = self
            .client
            .get("https://html.duckduckgo.com/html/")
            .query(&[("q", keyword)])
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Request(format!("upstream returned status {}", response.status())));
        }

        let body = response.text().await.map_err(|e| ProviderError::Request(e.to_string()))?;
        parse_duckduckgo_html(&body, limit)
    }
}

fn parse_duckduckgo_html(body: &str, limit: usize) -> Result<Vec<CandidateHit>, ProviderError> {
    let document = Html::parse_document(body);
    let result_selector = Selector::parse(".result").map_err(|e| ProviderError::Parse(format!("{e:?}")))?;
    let link_selector = Selector::parse(".result__a").map_err(|e| ProviderError::Parse(format!("{e:?}")))?;
    let snippet_selector = Selector::parse(".result__snippet").map_err(|e| ProviderError::Parse(format!("{e:?}")))?;

    let mut hits = Vec::new();
    for result in document.select(&result_selector) {
        let Some(link) = result.select(&link_selector).next() else {
            continue;
        };
        let Some(url) = link.value().attr("href") else {
            continue;
        };
        let title: String = link.text().collect::<String>().trim().to_string();
        let snippet: String = result
            .select(&snippet_selector)
            .next()
            .map(|s| s.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        if title.is_empty() {
            continue;
        }
        hits.push(CandidateHit { url: url.to_string(), title, snippet });
        if hits.len() >= limit {
            break;
        }
    }
    Ok(hits)
}

struct CacheEntry {
    inserted_at: Instant,
    hits: Vec<CandidateHit>,
}

/// In-memory response cache (spec §4.10 step 3, default 5 minutes).
pub struct ProviderCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ProviderCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    pub async fn get(&self, keyword: &str) -> Option<Vec<CandidateHit>> {
        let entries = self.entries.lock().await;
        entries.get(keyword).and_then(|entry| {
            (entry.inserted_at.elapsed() < self.ttl).then(|| entry.hits.clone())
        })
    }

    pub async fn put(&self, keyword: String, hits: Vec<CandidateHit>) {
        self.entries.lock().await.insert(keyword, CacheEntry { inserted_at: Instant::now(), hits });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duckduckgo_html_extracts_title_url_snippet() {
        let body = r#"
            <div class="result">
                <a class="result__a" href="https://example.com/a">Example A</a>
                <a class="result__snippet">First result snippet.</a>
            </div>
            <div class="result">
                <a class="result__a" href="https://example.com/b">Example B</a>
                <a class="result__snippet">Second result snippet.</a>
            </div>
        "#;
        let hits = parse_duckduckgo_html(body, 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://example.com/a");
        assert_eq!(hits[0].title, "Example A");
        assert_eq!(hits[0].snippet, "First result snippet.");
    }

    #[test]
    fn parse_duckduckgo_html_respects_limit() {
        let body = r#"
            <div class="result"><a class="result__a" href="https://a">A</a></div>
            <div class="result"><a class="result__a" href="https://b">B</a></div>
            <div class="result"><a class="result__a" href="https://c">C</a></div>
        "#;
        let hits = parse_duckduckgo_html(body, 2).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn cache_expires_entries_after_ttl() {
        let cache = ProviderCache::new(Duration::from_millis(10));
        cache.put("rust".to_string(), vec![CandidateHit {
            url: "https://example.com".into(),
            title: "Rust".into(),
            snippet: "".into(),
        }]).await;
        assert!(cache.get("rust").await.is_some());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get("rust").await.is_none());
    }
}
