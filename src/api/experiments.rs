//! `/api/experiments` handlers: lifecycle, assignment, tracking, flags and stats.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{data, done, ApiJson, ApiQuery, ApiResult, AppState};
use crate::domain::aggregates::{DeviceType, ExperimentDraft, FeatureFlagDraft};
use crate::experiments::{calculate_sample_size, generate_session_id, Document, MultivariateRequest, UserContext};
use crate::StoreError;

pub async fn active(State(s): State<AppState>) -> ApiResult {
    Ok(data(s.experiments.active_experiments().await?))
}

pub async fn create(State(s): State<AppState>, ApiJson(draft): ApiJson<ExperimentDraft>) -> ApiResult {
    let experiment = s.experiments.create_experiment(draft).await?;
    Ok((StatusCode::CREATED, done("Experiment created", experiment)).into_response())
}

pub async fn start(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult {
    Ok(done("Experiment started", s.experiments.start_experiment(&id).await?))
}

pub async fn stop(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult {
    Ok(done("Experiment stopped", s.experiments.stop_experiment(&id).await?))
}

/// A visitor without a user or session id gets a fresh session id, which the
/// client is expected to keep.
pub async fn assign(State(s): State<AppState>, ApiJson(mut ctx): ApiJson<UserContext>) -> ApiResult {
    if ctx.identity().is_empty() {
        ctx.session_id = generate_session_id();
    }
    let assignments = s.experiments.assign(&ctx).await;
    Ok(data(json!({ "sessionId": ctx.session_id, "assignments": assignments })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub experiment_id: String,
    pub variant_id: String,
    #[serde(default)]
    pub document: Document,
}

pub async fn preview(State(s): State<AppState>, ApiJson(req): ApiJson<PreviewRequest>) -> ApiResult {
    Ok(data(s.experiments.preview(&req.experiment_id, &req.variant_id, req.document).await?))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedEvent { Exposure, Conversion }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    #[serde(rename = "type")]
    pub kind: TrackedEvent,
    pub experiment_id: String,
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: String,
    pub goal_name: Option<String>,
    pub value: Option<f64>,
    pub metadata: Option<Value>,
}

pub async fn track(State(s): State<AppState>, ApiJson(req): ApiJson<TrackRequest>) -> ApiResult {
    let identity = req.user_id.as_deref().filter(|u| !u.is_empty()).unwrap_or(&req.session_id);
    if identity.is_empty() {
        return Err(StoreError::Validation("userId or sessionId is required".into()).into());
    }
    let recorded = match req.kind {
        TrackedEvent::Exposure => s.experiments.track_exposure(&req.experiment_id, identity).await?,
        TrackedEvent::Conversion => {
            let goal = req.goal_name.as_deref().unwrap_or("conversion");
            s.experiments.track_conversion(&req.experiment_id, identity, goal, req.value, req.metadata.clone()).await?
        }
    };
    Ok(data(json!({ "recorded": recorded })))
}

pub async fn multivariate(State(s): State<AppState>, ApiJson(req): ApiJson<MultivariateRequest>) -> ApiResult {
    let experiment = s.experiments.create_multivariate_experiment(req).await?;
    Ok((StatusCode::CREATED, done("Experiment created", experiment)).into_response())
}

pub async fn results(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult {
    Ok(data(s.experiments.results(&id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisRequest {
    pub metric: Option<String>,
}

/// The body is optional; the metric defaults to `conversion_rate`.
pub async fn analysis(State(s): State<AppState>, Path(id): Path<String>, body: Option<ApiJson<AnalysisRequest>>) -> ApiResult {
    let metric = body.and_then(|ApiJson(r)| r.metric).unwrap_or_else(|| "conversion_rate".into());
    match s.experiments.analysis(&id, &metric).await? {
        Some(test) => Ok(data(test)),
        None => Ok(done("Not enough data for a statistical test yet", Value::Null)),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSizeRequest {
    pub baseline_rate: f64,
    pub minimum_detectable_effect: f64,
    #[serde(default = "default_power")]
    pub power: f64,
    #[serde(default = "default_alpha")]
    pub significance_level: f64,
}

fn default_power() -> f64 { 0.8 }
fn default_alpha() -> f64 { 0.05 }

pub async fn sample_size(ApiJson(req): ApiJson<SampleSizeRequest>) -> ApiResult {
    let per_variant = calculate_sample_size(req.baseline_rate, req.minimum_detectable_effect, req.power, req.significance_level)
        .ok_or_else(|| StoreError::Validation("baselineRate, power and significanceLevel must lie strictly between 0 and 1, with a non-zero effect".into()))?;
    Ok(data(json!({ "sampleSizePerVariant": per_variant })))
}

pub async fn list_flags(State(s): State<AppState>) -> ApiResult {
    Ok(data(s.experiments.feature_flags().await?))
}

pub async fn create_flag(State(s): State<AppState>, ApiJson(draft): ApiJson<FeatureFlagDraft>) -> ApiResult {
    let flag = s.experiments.create_feature_flag(draft).await?;
    Ok((StatusCode::CREATED, done("Feature flag created", flag)).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagQuery {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub device_type: Option<DeviceType>,
    pub country: Option<String>,
}

/// With a user or session id the flag is also evaluated for that visitor.
pub async fn get_flag(State(s): State<AppState>, Path(id): Path<String>, ApiQuery(q): ApiQuery<FlagQuery>) -> ApiResult {
    let flag = s.experiments.get_feature_flag(&id).await?.ok_or(StoreError::NotFound("Feature flag"))?;
    let mut ctx = UserContext::for_session(q.session_id.unwrap_or_default());
    ctx.user_id = q.user_id;
    ctx.device_type = q.device_type;
    ctx.country = q.country;
    let enabled = if ctx.identity().is_empty() { None } else { Some(s.experiments.is_feature_enabled(&id, &ctx).await?) };
    let variation = s.experiments.feature_variation(&id).await?;
    Ok(data(json!({ "flag": flag, "enabled": enabled, "variation": variation })))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app, call};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_assignment_is_sticky_and_session_generated() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/api/experiments/assign", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        let session = body["data"]["sessionId"].as_str().unwrap().to_string();
        assert!(session.contains('-'));
        let first = body["data"]["assignments"][0]["variantId"].clone();
        assert!(first.is_string());

        let (_, again) = call(&app, Method::POST, "/api/experiments/assign", Some(json!({ "sessionId": session }))).await;
        assert_eq!(again["data"]["assignments"][0]["variantId"], first);
    }

    #[tokio::test]
    async fn test_exposure_counts_once() {
        let app = app();
        call(&app, Method::POST, "/api/experiments/assign", Some(json!({ "sessionId": "sess-exp" }))).await;
        let event = json!({ "type": "exposure", "experimentId": "exp_hero_cta", "sessionId": "sess-exp" });
        let (_, first) = call(&app, Method::POST, "/api/experiments/events", Some(event.clone())).await;
        let (_, second) = call(&app, Method::POST, "/api/experiments/events", Some(event)).await;
        assert_eq!(first["data"]["recorded"], true);
        assert_eq!(second["data"]["recorded"], false);
    }

    #[tokio::test]
    async fn test_lifecycle_and_results() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/api/experiments/create", Some(json!({
            "name": "PDP size guide",
            "variants": [
                { "id": "control", "name": "Control", "trafficWeight": 50, "isControl": true },
                { "id": "guide", "name": "Inline guide", "trafficWeight": 50,
                  "changes": [{ "type": "element_text", "selector": "#size-guide", "value": "Find your fit" }] }
            ]
        }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["status"], "draft");

        let (status, body) = call(&app, Method::POST, &format!("/api/experiments/{id}/start"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "running");

        let (status, body) = call(&app, Method::GET, &format!("/api/experiments/{id}/results"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["variants"].as_array().unwrap().len(), 2);

        let (status, body) = call(&app, Method::POST, &format!("/api/experiments/{id}/analysis"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].is_null());

        let (status, _) = call(&app, Method::POST, "/api/experiments/nope/stop", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preview_renders_variant_changes() {
        let app = app();
        let (_, body) = call(&app, Method::POST, "/api/experiments/preview", Some(json!({
            "experimentId": "exp_hero_cta",
            "variantId": "drop_cta",
            "document": { "elements": [{ "tag": "a", "classes": ["hero-cta"], "text": "Shop Now" }] }
        }))).await;
        assert_eq!(body["data"]["document"]["elements"][0]["text"], "Shop the Drop");
    }

    #[tokio::test]
    async fn test_sample_size_uses_standard_z_values() {
        let (status, body) = call(&app(), Method::POST, "/api/experiments/sample-size", Some(json!({
            "baselineRate": 0.1, "minimumDetectableEffect": 20
        }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["sampleSizePerVariant"], 3838);

        let (status, _) = call(&app(), Method::POST, "/api/experiments/sample-size", Some(json!({
            "baselineRate": 0, "minimumDetectableEffect": 20
        }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_flag_lookup_evaluates_for_visitor() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/experiments/feature-flags/flag_one_page_checkout?sessionId=abc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["enabled"].is_boolean());
        assert_eq!(body["data"]["variation"]["layout"], "single-page");

        let (status, _) = call(&app, Method::GET, "/api/experiments/feature-flags/flag_missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
