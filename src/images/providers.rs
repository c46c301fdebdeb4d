//! Network tiers of the image chain. Each tier either yields a usable URL or a
//! [`ProviderError`]; none of them retries.

use rand::Rng;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::config::ImageSettings;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("NETWORK_FAILURE: {0}")]
    NetworkFailure(String),
    #[error("INVALID_RESPONSE: {0}")]
    InvalidResponse(String),
    #[error("RATE_LIMIT")]
    RateLimit,
    #[error("NOT_FOUND")]
    NotFound,
    #[error("TIMEOUT")]
    Timeout,
    #[error("API_KEY_INVALID")]
    ApiKeyInvalid,
}

impl ProviderError {
    pub const CODES: [&'static str; 6] =
        ["NETWORK_FAILURE", "INVALID_RESPONSE", "RATE_LIMIT", "NOT_FOUND", "TIMEOUT", "API_KEY_INVALID"];

    pub fn code(&self) -> &'static str {
        match self {
            ProviderError::NetworkFailure(_) => "NETWORK_FAILURE",
            ProviderError::InvalidResponse(_) => "INVALID_RESPONSE",
            ProviderError::RateLimit => "RATE_LIMIT",
            ProviderError::NotFound => "NOT_FOUND",
            ProviderError::Timeout => "TIMEOUT",
            ProviderError::ApiKeyInvalid => "API_KEY_INVALID",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::NetworkFailure(e.to_string())
        }
    }
}

fn check_status(status: StatusCode) -> Result<(), ProviderError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimit),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::ApiKeyInvalid),
        StatusCode::NOT_FOUND => Err(ProviderError::NotFound),
        s => Err(ProviderError::InvalidResponse(s.as_u16().to_string())),
    }
}

fn parse_url(raw: &str) -> Result<Url, ProviderError> {
    Url::parse(raw).map_err(|e| ProviderError::InvalidResponse(format!("bad url {raw}: {e}")))
}

#[derive(Deserialize)]
struct FreepikSearch {
    #[serde(default)]
    data: Vec<FreepikResource>,
}

#[derive(Deserialize)]
struct FreepikResource {
    preview: FreepikPreview,
}

#[derive(Deserialize)]
struct FreepikPreview {
    url: String,
}

pub async fn freepik(client: &Client, settings: &ImageSettings, term: &str) -> Result<String, ProviderError> {
    let key = settings.freepik_api_key.as_deref().ok_or(ProviderError::ApiKeyInvalid)?;
    let response = client
        .get(format!("{}/resources", settings.freepik_base_url))
        .query(&[("term", term), ("limit", "1")])
        .header("x-freepik-api-key", key)
        .timeout(settings.timeout)
        .send()
        .await?;
    check_status(response.status())?;
    let body: FreepikSearch = response.json().await?;
    body.data.into_iter().next().map(|r| r.preview.url).ok_or(ProviderError::NotFound)
}

#[derive(Deserialize)]
struct PexelsSearch {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Deserialize)]
struct PexelsPhoto {
    src: PexelsSource,
}

#[derive(Deserialize)]
struct PexelsSource {
    medium: String,
}

pub async fn pexels(client: &Client, settings: &ImageSettings, term: &str) -> Result<String, ProviderError> {
    let key = settings.pexels_api_key.as_deref().ok_or(ProviderError::ApiKeyInvalid)?;
    let response = client
        .get(format!("{}/search", settings.pexels_base_url))
        .query(&[("query", term), ("per_page", "1"), ("orientation", "landscape")])
        .header(reqwest::header::AUTHORIZATION, key)
        .timeout(settings.timeout)
        .send()
        .await?;
    check_status(response.status())?;
    let body: PexelsSearch = response.json().await?;
    body.photos.into_iter().next().map(|p| p.src.medium).ok_or(ProviderError::NotFound)
}

/// Keyless tiers are checked with `HEAD` and the checked URL is returned as is.
async fn head_check(client: &Client, settings: &ImageSettings, url: Url) -> Result<String, ProviderError> {
    let response = client.head(url.clone()).timeout(settings.timeout).send().await?;
    check_status(response.status())?;
    Ok(url.into())
}

pub async fn unsplash(client: &Client, settings: &ImageSettings, term: &str) -> Result<String, ProviderError> {
    let mut url = parse_url(&format!("{}/800x600/", settings.unsplash_base_url))?;
    url.query_pairs_mut().append_key_only(term);
    head_check(client, settings, url).await
}

pub async fn picsum(client: &Client, settings: &ImageSettings) -> Result<String, ProviderError> {
    let seed: u32 = rand::thread_rng().gen_range(1..=1000);
    let url = parse_url(&format!("{}/800/600?random={seed}", settings.picsum_base_url))?;
    head_check(client, settings, url).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(check_status(StatusCode::OK), Ok(()));
        assert_eq!(check_status(StatusCode::TOO_MANY_REQUESTS), Err(ProviderError::RateLimit));
        assert_eq!(check_status(StatusCode::FORBIDDEN), Err(ProviderError::ApiKeyInvalid));
        assert_eq!(check_status(StatusCode::BAD_GATEWAY), Err(ProviderError::InvalidResponse("502".into())));
    }

    #[test]
    fn test_codes_match_display_prefix() {
        for e in [ProviderError::NetworkFailure("x".into()), ProviderError::RateLimit, ProviderError::Timeout] {
            assert!(e.to_string().starts_with(e.code()));
            assert!(ProviderError::CODES.contains(&e.code()));
        }
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let settings = ImageSettings { freepik_base_url: "http://127.0.0.1:9".into(), ..ImageSettings::default() };
        let err = freepik(&Client::new(), &settings, "hoodie").await.unwrap_err();
        assert_eq!(err, ProviderError::ApiKeyInvalid);
    }
}
