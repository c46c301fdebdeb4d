//! `/api/rum` beacon ingest and stats.

use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use super::{data, ApiJson, ApiQuery, ApiResult, AppState};
use crate::domain::aggregates::RumEnvelope;
use crate::services::rum::TimeRange;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    pub time_range: Option<String>,
}

pub async fn ingest(State(s): State<AppState>, ApiJson(envelope): ApiJson<RumEnvelope>) -> ApiResult {
    let accepted = s.rum.ingest(envelope).await?;
    Ok(data(json!({ "accepted": accepted })))
}

pub async fn stats(State(s): State<AppState>, ApiQuery(p): ApiQuery<StatsParams>) -> ApiResult {
    let range = TimeRange::parse(p.time_range.as_deref())?;
    Ok(data(s.rum.stats(range).await))
}
