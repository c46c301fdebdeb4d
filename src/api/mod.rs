//! HTTP surface: router, shared state, response envelope and error mapping.

pub mod affiliate;
pub mod experiments;
pub mod images;
pub mod inventory;
pub mod rum;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::config::Settings;
use crate::events::EventBus;
use crate::experiments::{ExperimentEngine, InMemoryAssignmentStore};
use crate::images::ImageService;
use crate::repository::Repositories;
use crate::services::{AffiliateService, InventoryService, Paginated, RumService};
use crate::StoreError;

#[derive(Clone)]
pub struct AppState {
    pub inventory: InventoryService,
    pub affiliate: AffiliateService,
    pub rum: RumService,
    pub experiments: Arc<ExperimentEngine>,
    pub images: ImageService,
}

impl AppState {
    /// Seeded in-memory state sharing one event bus.
    pub fn new(settings: &Settings, events: EventBus) -> crate::Result<Self> {
        let repos = Repositories::seeded()?;
        let engine = ExperimentEngine::new(
            repos.experiments.clone(),
            repos.feature_flags.clone(),
            Arc::new(InMemoryAssignmentStore::default()),
            events.clone(),
        );
        Ok(Self {
            inventory: InventoryService::new(repos.clone(), events.clone()),
            affiliate: AffiliateService::new(repos, events),
            rum: RumService::new(settings.rum.clone()),
            experiments: Arc::new(engine),
            images: ImageService::new(settings.images.clone())?,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "fashun-store"})) }))
        .route("/api/inventory", get(inventory::query).post(inventory::command).patch(inventory::update))
        .route("/api/affiliate", get(affiliate::query).post(affiliate::command).patch(affiliate::update))
        .route("/api/rum", post(rum::ingest))
        .route("/api/rum/stats", get(rum::stats))
        .route("/api/experiments/active", get(experiments::active))
        .route("/api/experiments/create", post(experiments::create))
        .route("/api/experiments/assign", post(experiments::assign))
        .route("/api/experiments/preview", post(experiments::preview))
        .route("/api/experiments/events", post(experiments::track))
        .route("/api/experiments/multivariate", post(experiments::multivariate))
        .route("/api/experiments/sample-size", post(experiments::sample_size))
        .route("/api/experiments/feature-flags", get(experiments::list_flags).post(experiments::create_flag))
        .route("/api/experiments/feature-flags/:id", get(experiments::get_flag))
        .route("/api/experiments/:id/start", post(experiments::start))
        .route("/api/experiments/:id/stop", post(experiments::stop))
        .route("/api/experiments/:id/results", get(experiments::results))
        .route("/api/experiments/:id/analysis", post(experiments::analysis))
        .route("/api/images", get(images::image))
        .route("/api/images/gallery", get(images::gallery))
        .route("/api/images/reliability", get(images::reliability))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `{"success": true, "message"?, "data"?}`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn data<T: Serialize>(data: T) -> Response {
    Json(Envelope { success: true, message: None, data: Some(data) }).into_response()
}

pub fn done<T: Serialize>(message: &'static str, data: T) -> Response {
    Json(Envelope { success: true, message: Some(message), data: Some(data) }).into_response()
}

pub fn message(message: &'static str) -> Response {
    Json(Envelope::<()> { success: true, message: Some(message), data: None }).into_response()
}

/// Paginated listing keyed by the collection name, e.g. `{items, total, page, totalPages}`.
pub fn page<T: Serialize>(key: &'static str, page: Paginated<T>) -> Response {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Page<T> {
        #[serde(flatten)]
        items: BTreeMap<&'static str, Vec<T>>,
        total: usize,
        page: u32,
        total_pages: u32,
    }
    data(Page { items: BTreeMap::from([(key, page.items)]), total: page.total, page: page.page, total_pages: page.total_pages })
}

pub type ApiResult = Result<Response, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    MalformedRequest(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self { ApiError::Store(e) }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self { ApiError::MalformedRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self { ApiError::MalformedRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MalformedRequest(detail) => (StatusCode::BAD_REQUEST, json!({ "error": "Malformed request", "details": detail })),
            ApiError::Store(StoreError::InvalidAction) => (StatusCode::BAD_REQUEST, json!({ "error": "Invalid action" })),
            ApiError::Store(StoreError::Validation(msg)) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Store(StoreError::InsufficientBalance { available }) => {
                (StatusCode::BAD_REQUEST, json!({ "error": "Insufficient balance", "availableBalance": available }))
            }
            ApiError::Store(e @ StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, json!({ "error": e.to_string() })),
            ApiError::Store(e) => {
                error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
        };
        (status, Json(body)).into_response()
    }
}

/// `Json` whose rejection is reported in the API's error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejection is reported in the API's error shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    pub fn app() -> Router {
        router(AppState::new(&Settings::default(), EventBus::default()).unwrap())
    }

    pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder.header("content-type", "application/json").body(Body::from(b.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }
}
