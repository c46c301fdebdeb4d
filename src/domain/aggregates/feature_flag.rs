//! Feature Flag Aggregate

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::experiment::DeviceType;
use crate::domain::value_objects::Percentage;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlag {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub rollout_percentage: Percentage,
    pub targeting: Option<FlagTargeting>,
    pub variations: BTreeMap<String, Value>,
    pub default_variation: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlagDraft {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub rollout_percentage: Percentage,
    pub targeting: Option<FlagTargeting>,
    #[serde(default)]
    pub variations: BTreeMap<String, Value>,
    #[serde(default)]
    pub default_variation: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagTargeting {
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub segments: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub devices: Vec<DeviceType>,
}

impl FeatureFlag {
    pub fn create(draft: FeatureFlagDraft) -> Self {
        Self {
            id: format!("flag_{}", Uuid::now_v7().simple()),
            name: draft.name,
            description: draft.description,
            enabled: draft.enabled,
            rollout_percentage: draft.rollout_percentage,
            targeting: draft.targeting,
            variations: draft.variations,
            default_variation: draft.default_variation,
        }
    }

    pub fn default_value(&self) -> Option<&Value> { self.variations.get(&self.default_variation) }
}
