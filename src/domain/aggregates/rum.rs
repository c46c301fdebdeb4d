//! Real user monitoring records

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use crate::domain::aggregates::experiment::DeviceType;

/// Page-level performance sample. Timings are milliseconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    #[serde(default)] pub lcp: f64,
    #[serde(default)] pub fid: f64,
    #[serde(default)] pub cls: f64,
    #[serde(default)] pub ttfb: f64,
    #[serde(default)] pub fcp: f64,
    #[serde(default)] pub dom_content_loaded: f64,
    #[serde(default)] pub load_complete: f64,
    #[serde(default)] pub connection_type: String,
    #[serde(default)] pub effective_type: String,
    pub device_type: DeviceType,
    #[serde(default)] pub browser_name: String,
    #[serde(default)] pub viewport_width: u32,
    #[serde(default)] pub viewport_height: u32,
    pub url: String,
    pub timestamp: i64,
    pub user_id: Option<String>,
    pub session_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInteraction {
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub element: Option<String>,
    pub timestamp: i64,
    pub url: String,
    pub session_id: String,
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType { Click, Scroll, Input, Navigation, Error }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub message: String,
    #[serde(default)]
    pub stack: String,
    pub url: String,
    pub timestamp: i64,
    pub session_id: String,
    pub user_id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RumKind { Metrics, Interaction, Error }

/// Beacon body posted by the storefront: `{type, data, sessionId, userId, timestamp}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RumEnvelope {
    #[serde(rename = "type")]
    pub kind: RumKind,
    pub data: Value,
    pub session_id: String,
    pub user_id: Option<String>,
    pub timestamp: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RumStats {
    #[serde(rename = "averageLCP")]
    pub average_lcp: f64,
    #[serde(rename = "averageFID")]
    pub average_fid: f64,
    #[serde(rename = "averageCLS")]
    pub average_cls: f64,
    pub average_page_load: f64,
    pub bounce_rate: f64,
    pub session_duration: f64,
    pub page_views: u64,
    pub unique_users: u64,
    pub error_rate: f64,
    pub mobile_traffic: f64,
}
