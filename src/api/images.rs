//! `/api/images` lookups through the fallback chain.

use axum::extract::State;
use serde::Deserialize;

use super::{data, ApiQuery, ApiResult, AppState};

const MAX_GALLERY: usize = 24;

#[derive(Debug, Default, Deserialize)]
pub struct ImageParams {
    pub term: Option<String>,
    pub category: Option<String>,
    pub count: Option<usize>,
}

impl ImageParams {
    fn term(&self) -> &str {
        self.term.as_deref().map(str::trim).filter(|t| !t.is_empty()).unwrap_or("fashion")
    }
}

pub async fn image(State(s): State<AppState>, ApiQuery(p): ApiQuery<ImageParams>) -> ApiResult {
    Ok(data(s.images.image(p.term(), p.category.as_deref()).await))
}

pub async fn gallery(State(s): State<AppState>, ApiQuery(p): ApiQuery<ImageParams>) -> ApiResult {
    let count = p.count.unwrap_or(6).clamp(1, MAX_GALLERY);
    Ok(data(s.images.gallery(p.term(), count, p.category.as_deref()).await))
}

pub async fn reliability(State(s): State<AppState>) -> ApiResult {
    Ok(data(s.images.reliability()))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app, call};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_reliability_is_static() {
        let (status, body) = call(&app(), Method::GET, "/api/images/reliability", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["fallbackSources"][0], "freepik");
        assert_eq!(body["data"]["fallbackSources"][4], "svg_placeholder");
        assert!(body["data"]["fashionCategories"].is_array());
        assert!(body["data"]["timeoutMs"].is_number());
        assert!(body["data"].get("fallback_sources").is_none());
    }

    #[tokio::test]
    async fn test_bad_count_is_rejected() {
        let (status, body) = call(&app(), Method::GET, "/api/images/gallery?count=many", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Malformed request");
    }
}
