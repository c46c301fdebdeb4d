//! Tiered image lookup: Freepik, Pexels, Unsplash, Picsum, then an inline SVG.
//!
//! Every network tier is optional. A tier that fails is logged and counted in
//! `retryCount`, and the chain moves on; the SVG tier cannot fail, so a lookup
//! always produces something renderable.

pub mod placeholder;
pub mod providers;

use reqwest::Client;
use serde::Serialize;
use tracing::warn;

use crate::config::ImageSettings;
use crate::{Result, StoreError};
use providers::ProviderError;

/// Search phrases for the storefront's fashion categories.
pub const FASHION_CATEGORIES: [(&str, &str); 12] = [
    ("streetwear", "urban streetwear fashion clothing style modern"),
    ("tshirts", "t-shirt mockup template fashion cotton casual wear"),
    ("hoodies", "hoodie sweatshirt urban fashion comfortable streetwear"),
    ("jackets", "jacket bomber fashion outerwear style trendy"),
    ("accessories", "fashion accessories cap bag jewelry urban style"),
    ("models", "fashion model portrait lifestyle young trendy"),
    ("lifestyle", "young person lifestyle urban fashion street style"),
    ("vintage", "vintage retro fashion clothing classic style"),
    ("minimalist", "minimalist fashion clean simple elegant style"),
    ("cyberpunk", "cyberpunk futuristic fashion neon tech style"),
    ("athletic", "athletic sportswear fitness fashion active wear"),
    ("formal", "formal fashion business attire professional wear"),
];

pub fn category_phrase(category: &str) -> Option<&'static str> {
    FASHION_CATEGORIES.iter().find(|(name, _)| *name == category).map(|(_, phrase)| *phrase)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Freepik,
    Pexels,
    Unsplash,
    Picsum,
    SvgPlaceholder,
}

impl ImageSource {
    pub const CHAIN: [ImageSource; 5] =
        [ImageSource::Freepik, ImageSource::Pexels, ImageSource::Unsplash, ImageSource::Picsum, ImageSource::SvgPlaceholder];

    pub fn label(&self) -> &'static str {
        match self {
            ImageSource::Freepik => "Freepik API",
            ImageSource::Pexels => "Pexels",
            ImageSource::Unsplash => "Unsplash",
            ImageSource::Picsum => "Picsum",
            ImageSource::SvgPlaceholder => "SVG placeholder",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub url: String,
    pub source: ImageSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub retry_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reliability {
    pub fallback_sources: Vec<ImageSource>,
    pub error_codes: Vec<&'static str>,
    pub fashion_categories: Vec<&'static str>,
    pub fallback_enabled: bool,
    pub timeout_ms: u64,
    pub features: Vec<&'static str>,
}

#[derive(Clone)]
pub struct ImageService {
    client: Client,
    settings: ImageSettings,
}

impl ImageService {
    pub fn new(settings: ImageSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("fashun-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Upstream(e.to_string()))?;
        Ok(Self { client, settings })
    }

    pub async fn image(&self, term: &str, category: Option<&str>) -> ImageResult {
        let mut failed = 0;

        let freepik_term = category.and_then(category_phrase).unwrap_or(term);
        let mut last_error = match providers::freepik(&self.client, &self.settings, freepik_term).await {
            Ok(url) => return ImageResult { url, source: ImageSource::Freepik, error: None, retry_count: 0 },
            Err(e) => Some(self.record(ImageSource::Freepik, &e, &mut failed)),
        };

        if self.settings.enable_fallback {
            for source in [ImageSource::Pexels, ImageSource::Unsplash, ImageSource::Picsum] {
                let attempt = match source {
                    ImageSource::Pexels => providers::pexels(&self.client, &self.settings, term).await,
                    ImageSource::Unsplash => providers::unsplash(&self.client, &self.settings, term).await,
                    _ => providers::picsum(&self.client, &self.settings).await,
                };
                match attempt {
                    Ok(url) => return ImageResult { url, source, error: last_error, retry_count: failed },
                    Err(e) => last_error = Some(self.record(source, &e, &mut failed)),
                }
            }
        }

        ImageResult {
            url: placeholder::svg_data_uri(term),
            source: ImageSource::SvgPlaceholder,
            error: last_error,
            retry_count: failed,
        }
    }

    /// Looks up `"{term} {i}"` for each slot so a gallery shows distinct images.
    pub async fn gallery(&self, term: &str, count: usize, category: Option<&str>) -> Vec<ImageResult> {
        let mut results = Vec::with_capacity(count);
        for i in 0..count {
            results.push(self.image(&format!("{term} {i}"), category).await);
        }
        results
    }

    pub fn reliability(&self) -> Reliability {
        Reliability {
            fallback_sources: ImageSource::CHAIN.to_vec(),
            error_codes: ProviderError::CODES.to_vec(),
            fashion_categories: FASHION_CATEGORIES.iter().map(|(name, _)| *name).collect(),
            fallback_enabled: self.settings.enable_fallback,
            timeout_ms: self.settings.timeout.as_millis() as u64,
            features: vec![
                "5-tier fallback chain",
                "Per-tier timeout",
                "Rate limit detection",
                "Fashion-optimized search terms",
                "SVG placeholder generation",
            ],
        }
    }

    fn record(&self, source: ImageSource, error: &ProviderError, failed: &mut u32) -> String {
        *failed += 1;
        if self.settings.log_errors {
            warn!(source = source.label(), code = error.code(), %error, "image tier failed");
        }
        format!("{} failed: {error}", source.label())
    }
}
