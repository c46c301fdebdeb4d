//! Experiment Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;
use crate::domain::value_objects::Percentage;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub hypothesis: String,
    pub status: ExperimentStatus,
    #[serde(rename = "type")]
    pub kind: ExperimentType,
    pub traffic_allocation: Percentage,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub target_metrics: Vec<String>,
    pub targeting: Targeting,
    pub variants: Vec<ExperimentVariant>,
    pub statistical_significance: f64,
    pub minimum_detectable_effect: f64,
    pub estimated_duration: u32,
}

/// Inbound definition of an experiment; the id is assigned on creation.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentDraft {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hypothesis: String,
    #[serde(default)]
    pub status: ExperimentStatus,
    #[serde(rename = "type", default)]
    pub kind: ExperimentType,
    #[serde(default)]
    pub traffic_allocation: Percentage,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub target_metrics: Vec<String>,
    #[serde(default)]
    pub targeting: Targeting,
    #[validate(length(min = 1))]
    pub variants: Vec<ExperimentVariant>,
    #[serde(default = "default_significance")]
    #[validate(range(min = 50.0, max = 99.99))]
    pub statistical_significance: f64,
    #[serde(default = "default_mde")]
    pub minimum_detectable_effect: f64,
    #[serde(default = "default_duration")]
    pub estimated_duration: u32,
}

fn default_significance() -> f64 { 95.0 }
fn default_mde() -> f64 { 5.0 }
fn default_duration() -> u32 { 14 }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus { #[default] Draft, Running, Paused, Completed, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentType { #[default] Split, Multivariate, Redirect, FeatureFlag }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType { Mobile, Tablet, Desktop }

impl DeviceType {
    /// Breakpoints used by the storefront layout.
    pub fn from_viewport_width(width: u32) -> Self {
        if width < 768 { DeviceType::Mobile }
        else if width < 1024 { DeviceType::Tablet }
        else { DeviceType::Desktop }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Targeting {
    pub url: Option<String>,
    pub url_pattern: Option<String>,
    #[serde(default)]
    pub device: Vec<DeviceType>,
    pub new_users: Option<bool>,
    pub returning_users: Option<bool>,
    #[serde(default)]
    pub custom_attributes: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentVariant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub traffic_weight: f64,
    #[serde(default)]
    pub is_control: bool,
    #[serde(default)]
    pub changes: Vec<VariantChange>,
    #[serde(default)]
    pub conversion_goals: Vec<String>,
}

/// Declarative change carried by a variant. Interpreted by the sandboxed
/// transform layer; nothing here is ever evaluated as code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariantChange {
    ElementText { selector: String, value: String },
    ElementStyle { selector: String, property: String, value: String },
    ElementAttribute { selector: String, property: String, value: String },
    Redirect { value: String },
    FeatureFlag { property: String, value: bool },
    ConfigValue { property: String, value: Value },
    CustomCode {
        #[serde(rename = "customCode", default)]
        custom_code: Option<String>,
        #[serde(default)]
        value: Value,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentAssignment {
    pub experiment_id: String,
    pub variant_id: String,
    pub user_id: Option<String>,
    pub session_id: String,
    pub assigned_at: DateTime<Utc>,
    pub exposed_at: Option<DateTime<Utc>>,
    pub converted_at: Option<DateTime<Utc>>,
    pub conversion_value: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultivariateFactor {
    pub id: String,
    pub name: String,
    pub levels: Vec<FactorLevel>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorLevel {
    pub id: String,
    pub name: String,
    pub value: Value,
}

impl ExperimentConfig {
    pub fn create(draft: ExperimentDraft) -> Self {
        Self {
            id: format!("exp_{}", Uuid::now_v7().simple()),
            name: draft.name,
            description: draft.description,
            hypothesis: draft.hypothesis,
            status: draft.status,
            kind: draft.kind,
            traffic_allocation: draft.traffic_allocation,
            start_date: draft.start_date.unwrap_or_else(Utc::now),
            end_date: draft.end_date,
            target_metrics: draft.target_metrics,
            targeting: draft.targeting,
            variants: draft.variants,
            statistical_significance: draft.statistical_significance,
            minimum_detectable_effect: draft.minimum_detectable_effect,
            estimated_duration: draft.estimated_duration,
        }
    }

    pub fn is_running(&self) -> bool { self.status == ExperimentStatus::Running }

    pub fn start(&mut self) {
        self.status = ExperimentStatus::Running;
        self.start_date = Utc::now();
    }

    pub fn stop(&mut self) {
        self.status = ExperimentStatus::Completed;
        self.end_date = Some(Utc::now());
    }

    pub fn variant(&self, variant_id: &str) -> Option<&ExperimentVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// The variant flagged as control, or the first one.
    pub fn control(&self) -> Option<&ExperimentVariant> {
        self.variants.iter().find(|v| v.is_control).or_else(|| self.variants.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ExperimentDraft {
        serde_json::from_value(serde_json::json!({
            "name": "Hero copy",
            "trafficAllocation": 80,
            "variants": [
                { "id": "control", "name": "Control", "trafficWeight": 50, "isControl": true },
                { "id": "bold", "name": "Bold", "trafficWeight": 50,
                  "changes": [{ "type": "element_text", "selector": "h1", "value": "Drop 04 is live" }] }
            ]
        })).unwrap()
    }

    #[test]
    fn test_draft_defaults() {
        let d = draft();
        assert_eq!(d.status, ExperimentStatus::Draft);
        assert_eq!(d.kind, ExperimentType::Split);
        assert_eq!(d.statistical_significance, 95.0);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_lifecycle() {
        let mut exp = ExperimentConfig::create(draft());
        assert!(exp.id.starts_with("exp_"));
        assert!(!exp.is_running());
        exp.start();
        assert!(exp.is_running());
        exp.stop();
        assert_eq!(exp.status, ExperimentStatus::Completed);
        assert!(exp.end_date.is_some());
        assert_eq!(exp.control().unwrap().id, "control");
    }

    #[test]
    fn test_custom_code_change_deserializes_without_running() {
        let change: VariantChange = serde_json::from_value(serde_json::json!({
            "type": "custom_code", "customCode": "alert(1)"
        })).unwrap();
        assert!(matches!(change, VariantChange::CustomCode { custom_code: Some(_), .. }));
    }

    #[test]
    fn test_device_breakpoints() {
        assert_eq!(DeviceType::from_viewport_width(375), DeviceType::Mobile);
        assert_eq!(DeviceType::from_viewport_width(800), DeviceType::Tablet);
        assert_eq!(DeviceType::from_viewport_width(1440), DeviceType::Desktop);
    }
}
