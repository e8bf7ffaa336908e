//! HTTP fetch stage (spec §4.2): GET with a configurable timeout, bounded
//! redirects, network failures surfaced as [`ExtractError::Fetch`].

use std::time::Duration;

use super::ExtractError;

pub struct FetchedContent {
    pub raw_bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub final_url: String,
}

const MAX_REDIRECTS: usize = 5;

/// Fetch `url`, following up to [`MAX_REDIRECTS`] redirects with `timeout`
/// as the overall deadline for the request.
pub async fn fetch(url: &str, timeout: Duration) -> Result<FetchedContent, ExtractError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| ExtractError::Fetch(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ExtractError::Fetch(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ExtractError::Fetch(format!(
            "upstream returned status {}",
            response.status()
        )));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let final_url = response.url().to_string();

    let raw_bytes = response
        .bytes()
        .await
        .map_err(|e| ExtractError::Fetch(e.to_string()))?
        .to_vec();

    Ok(FetchedContent {
        raw_bytes,
        content_type,
        final_url,
    })
}
