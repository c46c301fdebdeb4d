//! Experiment engine: the server-side source of truth for assignments.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use validator::Validate;

use super::analysis::{self, ExperimentResults, StatisticalTest};
use super::bucketing::{bucket_for, choose_variant};
use super::store::AssignmentStore;
use super::targeting::{matches_flag_targeting, matches_targeting, UserContext};
use super::transform::{compile_changes, ApplyOutcome, Document, RejectedChange, Transform};
use crate::domain::aggregates::experiment::{MultivariateFactor, Targeting};
use crate::domain::aggregates::{
    ExperimentAssignment, ExperimentConfig, ExperimentDraft, ExperimentStatus, ExperimentType, ExperimentVariant,
    FeatureFlag, FeatureFlagDraft, VariantChange,
};
use crate::domain::events::{DomainEvent, ExperimentEvent};
use crate::domain::value_objects::Percentage;
use crate::events::EventBus;
use crate::repository::Repo;
use crate::{Result, StoreError};

/// An assignment together with the validated changes to render.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedVariant {
    pub experiment_id: String,
    pub variant_id: String,
    pub assignment: ExperimentAssignment,
    pub transforms: Vec<Transform>,
    pub rejected: Vec<RejectedChange>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub document: Document,
    pub outcome: ApplyOutcome,
    pub rejected: Vec<RejectedChange>,
}

/// Shorthand for building a multivariate experiment from factors.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultivariateRequest {
    pub name: String,
    pub factors: Vec<MultivariateFactor>,
    #[serde(default)]
    pub target_metrics: Vec<String>,
    pub traffic_allocation: Option<Percentage>,
    pub targeting: Option<Targeting>,
}

pub struct ExperimentEngine {
    experiments: Repo<ExperimentConfig>,
    flags: Repo<FeatureFlag>,
    assignments: Arc<dyn AssignmentStore>,
    events: EventBus,
}

impl ExperimentEngine {
    pub fn new(
        experiments: Repo<ExperimentConfig>,
        flags: Repo<FeatureFlag>,
        assignments: Arc<dyn AssignmentStore>,
        events: EventBus,
    ) -> Self {
        Self { experiments, flags, assignments, events }
    }

    /// Assigns the visitor to every running experiment they participate in.
    /// Failures are logged and yield no assignments.
    pub async fn assign(&self, ctx: &UserContext) -> Vec<AssignedVariant> {
        match self.try_assign(ctx).await {
            Ok(assigned) => assigned,
            Err(e) => {
                warn!(error = %e, session_id = %ctx.session_id, "experiment assignment failed");
                Vec::new()
            }
        }
    }

    async fn try_assign(&self, ctx: &UserContext) -> Result<Vec<AssignedVariant>> {
        let identity = ctx.identity().to_string();
        let mut assigned = Vec::new();

        for experiment in self.experiments.list().await? {
            if !experiment.is_running() { continue; }

            let assignment = match self.assignments.get(&experiment.id, &identity).await? {
                Some(existing) => existing,
                None => {
                    let Some(variant) = participating_variant(&experiment, ctx) else { continue };
                    let fresh = ExperimentAssignment {
                        experiment_id: experiment.id.clone(),
                        variant_id: variant.id.clone(),
                        user_id: ctx.user_id.clone(),
                        session_id: ctx.session_id.clone(),
                        assigned_at: Utc::now(),
                        exposed_at: None,
                        converted_at: None,
                        conversion_value: None,
                    };
                    let stored = self.assignments.put_if_absent(&identity, fresh.clone()).await?;
                    if stored == fresh {
                        debug!(experiment_id = %experiment.id, variant_id = %stored.variant_id, "assigned");
                        self.publish(ExperimentEvent::Assignment {
                            experiment_id: stored.experiment_id.clone(),
                            variant_id: stored.variant_id.clone(),
                            user_id: stored.user_id.clone(),
                            session_id: stored.session_id.clone(),
                            at: stored.assigned_at,
                        }).await;
                    }
                    stored
                }
            };

            let Some(variant) = experiment.variant(&assignment.variant_id) else {
                warn!(experiment_id = %experiment.id, variant_id = %assignment.variant_id, "assigned variant no longer exists");
                continue;
            };
            let compiled = compile_changes(&variant.id, &variant.changes);

            assigned.push(AssignedVariant {
                experiment_id: experiment.id.clone(),
                variant_id: variant.id.clone(),
                assignment,
                transforms: compiled.transforms,
                rejected: compiled.rejected,
            });
        }
        Ok(assigned)
    }

    /// A flag state forced by the variant the identity holds in a running
    /// experiment. Stopped experiments no longer force anything.
    async fn forced_flag(&self, flag_id: &str, identity: &str) -> Result<Option<bool>> {
        for experiment in self.experiments.list().await? {
            if !experiment.is_running() { continue; }
            let Some(assignment) = self.assignments.get(&experiment.id, identity).await? else { continue };
            let Some(variant) = experiment.variant(&assignment.variant_id) else { continue };
            let forced = variant.changes.iter().find_map(|change| match change {
                VariantChange::FeatureFlag { property, value } if property == flag_id => Some(*value),
                _ => None,
            });
            if forced.is_some() {
                return Ok(forced);
            }
        }
        Ok(None)
    }

    /// Renders a variant's changes against a caller-supplied document.
    pub async fn preview(&self, experiment_id: &str, variant_id: &str, mut document: Document) -> Result<Preview> {
        let experiment = self.require(experiment_id).await?;
        let variant = experiment.variant(variant_id).ok_or(StoreError::NotFound("Variant"))?;
        let compiled = compile_changes(&variant.id, &variant.changes);
        let outcome = document.apply(&compiled.transforms);
        Ok(Preview { document, outcome, rejected: compiled.rejected })
    }

    pub async fn create_experiment(&self, draft: ExperimentDraft) -> Result<ExperimentConfig> {
        draft.validate()?;
        if draft.variants.iter().any(|v| !v.traffic_weight.is_finite() || v.traffic_weight < 0.0) {
            return Err(StoreError::Validation("variant trafficWeight must be a non-negative number".into()));
        }
        let experiment = self.experiments.insert(ExperimentConfig::create(draft)).await?;
        info!(experiment_id = %experiment.id, name = %experiment.name, "experiment created");
        self.publish(ExperimentEvent::Created { experiment_id: experiment.id.clone() }).await;
        Ok(experiment)
    }

    pub async fn start_experiment(&self, experiment_id: &str) -> Result<ExperimentConfig> {
        let experiment = self.experiments.update(experiment_id, &mut |e| e.start()).await?
            .ok_or(StoreError::NotFound("Experiment"))?;
        info!(experiment_id, "experiment started");
        self.publish(ExperimentEvent::Started { experiment_id: experiment_id.to_string() }).await;
        Ok(experiment)
    }

    pub async fn stop_experiment(&self, experiment_id: &str) -> Result<ExperimentConfig> {
        let experiment = self.experiments.update(experiment_id, &mut |e| e.stop()).await?
            .ok_or(StoreError::NotFound("Experiment"))?;
        info!(experiment_id, "experiment stopped");
        self.publish(ExperimentEvent::Stopped { experiment_id: experiment_id.to_string() }).await;
        Ok(experiment)
    }

    pub async fn get_experiment(&self, experiment_id: &str) -> Result<Option<ExperimentConfig>> {
        self.experiments.get(experiment_id).await
    }

    pub async fn active_experiments(&self) -> Result<Vec<ExperimentConfig>> {
        Ok(self.experiments.list().await?.into_iter().filter(|e| e.status == ExperimentStatus::Running).collect())
    }

    pub async fn is_in_experiment(&self, experiment_id: &str, identity: &str, variant_id: Option<&str>) -> Result<bool> {
        Ok(match self.assignments.get(experiment_id, identity).await? {
            Some(a) => variant_id.map_or(true, |v| a.variant_id == v),
            None => false,
        })
    }

    pub async fn variant_for(&self, experiment_id: &str, identity: &str) -> Result<Option<String>> {
        Ok(self.assignments.get(experiment_id, identity).await?.map(|a| a.variant_id))
    }

    /// Records the first exposure only. Returns `false` when there is no
    /// assignment or the visitor was already exposed.
    pub async fn track_exposure(&self, experiment_id: &str, identity: &str) -> Result<bool> {
        let mut first = false;
        let updated = self.assignments.update(experiment_id, identity, &mut |a| {
            if a.exposed_at.is_none() {
                a.exposed_at = Some(Utc::now());
                first = true;
            }
        }).await?;
        match updated {
            Some(a) if first => {
                self.publish(ExperimentEvent::Exposure {
                    experiment_id: a.experiment_id,
                    variant_id: a.variant_id,
                    user_id: a.user_id,
                    session_id: a.session_id,
                    at: a.exposed_at.unwrap_or_else(Utc::now),
                }).await;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub async fn track_conversion(
        &self,
        experiment_id: &str,
        identity: &str,
        goal_name: &str,
        value: Option<f64>,
        metadata: Option<Value>,
    ) -> Result<bool> {
        let now = Utc::now();
        let updated = self.assignments.update(experiment_id, identity, &mut |a| {
            a.converted_at = Some(now);
            a.conversion_value = value;
        }).await?;
        let Some(a) = updated else { return Ok(false) };
        self.publish(ExperimentEvent::Conversion {
            experiment_id: a.experiment_id,
            variant_id: a.variant_id,
            goal_name: goal_name.to_string(),
            value,
            metadata,
            user_id: a.user_id,
            session_id: a.session_id,
            at: now,
        }).await;
        Ok(true)
    }

    pub async fn create_feature_flag(&self, draft: FeatureFlagDraft) -> Result<FeatureFlag> {
        draft.validate()?;
        let flag = self.flags.insert(FeatureFlag::create(draft)).await?;
        info!(flag_id = %flag.id, "feature flag created");
        self.publish(ExperimentEvent::FeatureFlagCreated { flag_id: flag.id.clone() }).await;
        Ok(flag)
    }

    pub async fn feature_flags(&self) -> Result<Vec<FeatureFlag>> {
        self.flags.list().await
    }

    pub async fn get_feature_flag(&self, flag_id: &str) -> Result<Option<FeatureFlag>> {
        self.flags.get(flag_id).await
    }

    pub async fn is_feature_enabled(&self, flag_id: &str, ctx: &UserContext) -> Result<bool> {
        let identity = ctx.identity();
        if let Some(forced) = self.forced_flag(flag_id, identity).await? {
            return Ok(forced);
        }
        let Some(flag) = self.flags.get(flag_id).await? else { return Ok(false) };
        if !flag.enabled { return Ok(false); }
        if let Some(targeting) = &flag.targeting {
            if !matches_flag_targeting(targeting, ctx) { return Ok(false); }
        }
        Ok(flag.rollout_percentage.admits(bucket_for(&flag.id, identity)))
    }

    /// The flag's default variation, or `None` for an unknown flag.
    pub async fn feature_variation(&self, flag_id: &str) -> Result<Option<Value>> {
        Ok(self.flags.get(flag_id).await?.and_then(|f| f.default_value().cloned()))
    }

    /// One variant per combination of factor levels, split evenly, the first
    /// being the control. Each level is carried as a `config_value` change.
    pub async fn create_multivariate_experiment(&self, request: MultivariateRequest) -> Result<ExperimentConfig> {
        let combinations = combinations(&request.factors);
        if combinations.is_empty() {
            return Err(StoreError::Validation("multivariate experiment needs at least one factor level".into()));
        }
        let weight = (100 / combinations.len()) as f64;
        let variants = combinations.iter().enumerate().map(|(index, combo)| ExperimentVariant {
            id: format!("variant_{index}"),
            name: format!("Combination {}", index + 1),
            description: combo.iter()
                .map(|(factor, level)| format!("{}: {}", factor.name, level.name))
                .collect::<Vec<_>>()
                .join(", "),
            traffic_weight: weight,
            is_control: index == 0,
            changes: combo.iter()
                .map(|(factor, level)| VariantChange::ConfigValue { property: factor.id.clone(), value: level.value.clone() })
                .collect(),
            conversion_goals: request.target_metrics.clone(),
        }).collect();

        let draft = ExperimentDraft {
            name: request.name,
            description: format!("Multivariate test with {} factors", request.factors.len()),
            hypothesis: "Multiple factors interaction will improve conversion".into(),
            status: ExperimentStatus::Draft,
            kind: ExperimentType::Multivariate,
            traffic_allocation: request.traffic_allocation.unwrap_or(Percentage::FULL),
            start_date: None,
            end_date: None,
            target_metrics: request.target_metrics,
            targeting: request.targeting.unwrap_or_default(),
            variants,
            statistical_significance: 95.0,
            minimum_detectable_effect: 5.0,
            estimated_duration: 14,
        };
        self.create_experiment(draft).await
    }

    pub async fn results(&self, experiment_id: &str) -> Result<ExperimentResults> {
        let experiment = self.require(experiment_id).await?;
        let assignments = self.assignments.list(experiment_id).await?;
        Ok(analysis::build_results(&experiment, &assignments))
    }

    /// `None` when there is not yet enough data for a test.
    pub async fn analysis(&self, experiment_id: &str, metric: &str) -> Result<Option<StatisticalTest>> {
        let experiment = self.require(experiment_id).await?;
        let assignments = self.assignments.list(experiment_id).await?;
        Ok(analysis::analyze(&experiment, &assignments, metric))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    async fn require(&self, experiment_id: &str) -> Result<ExperimentConfig> {
        self.experiments.get(experiment_id).await?.ok_or(StoreError::NotFound("Experiment"))
    }

    async fn publish(&self, event: ExperimentEvent) {
        self.events.publish(DomainEvent::Experiment(event)).await;
    }
}

/// Running-state, allocation and targeting checks, then the weighted pick.
fn participating_variant<'a>(experiment: &'a ExperimentConfig, ctx: &UserContext) -> Option<&'a ExperimentVariant> {
    if !experiment.is_running() { return None; }
    let bucket = bucket_for(&experiment.id, ctx.identity());
    if !experiment.traffic_allocation.admits(bucket) { return None; }
    if !matches_targeting(&experiment.targeting, ctx) { return None; }
    choose_variant(&experiment.variants, bucket)
}

type Combination<'a> = Vec<(&'a MultivariateFactor, &'a crate::domain::aggregates::experiment::FactorLevel)>;

/// Cartesian product of factor levels, first factor varying slowest.
fn combinations(factors: &[MultivariateFactor]) -> Vec<Combination<'_>> {
    if factors.is_empty() { return Vec::new(); }
    factors.iter().fold(vec![Vec::new()], |acc, factor| {
        acc.iter()
            .flat_map(|prefix| factor.levels.iter().map(move |level| {
                let mut combo = prefix.clone();
                combo.push((factor, level));
                combo
            }))
            .collect()
    })
}

/// `"{millis}-{9 base36 chars}"`, used when a client arrives without a session.
pub fn generate_session_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiments::store::InMemoryAssignmentStore;
    use crate::repository::InMemoryRepository;
    use serde_json::json;

    fn engine() -> ExperimentEngine {
        ExperimentEngine::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(InMemoryRepository::new()),
            Arc::new(InMemoryAssignmentStore::new()),
            EventBus::default(),
        )
    }

    fn draft(allocation: f64, changes: Value) -> ExperimentDraft {
        serde_json::from_value(json!({
            "name": "Hero",
            "trafficAllocation": allocation,
            "variants": [
                { "id": "control", "name": "Control", "trafficWeight": 50, "isControl": true },
                { "id": "bold", "name": "Bold", "trafficWeight": 50, "changes": changes }
            ]
        })).unwrap()
    }

    async fn running(engine: &ExperimentEngine, allocation: f64, changes: Value) -> ExperimentConfig {
        let exp = engine.create_experiment(draft(allocation, changes)).await.unwrap();
        engine.start_experiment(&exp.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_draft_experiments_assign_nobody() {
        let engine = engine();
        engine.create_experiment(draft(100.0, json!([]))).await.unwrap();
        assert!(engine.assign(&UserContext::for_session("s1")).await.is_empty());
    }

    #[tokio::test]
    async fn test_assignment_is_sticky_and_deterministic() {
        let engine = engine();
        let exp = running(&engine, 100.0, json!([])).await;
        let ctx = UserContext::for_session("sess-42");
        let first = engine.assign(&ctx).await;
        let second = engine.assign(&ctx).await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].variant_id, second[0].variant_id);
        assert_eq!(first[0].assignment.assigned_at, second[0].assignment.assigned_at);
        let expected = choose_variant(&exp.variants, bucket_for(&exp.id, "sess-42")).unwrap();
        assert_eq!(first[0].variant_id, expected.id);
        assert_eq!(engine.variant_for(&exp.id, "sess-42").await.unwrap().as_deref(), Some(expected.id.as_str()));
        assert!(engine.is_in_experiment(&exp.id, "sess-42", None).await.unwrap());
        assert!(!engine.is_in_experiment(&exp.id, "someone-else", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_allocation_excludes_everyone() {
        let engine = engine();
        running(&engine, 0.0, json!([])).await;
        for i in 0..50 {
            assert!(engine.assign(&UserContext::for_session(format!("s{i}"))).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_exposure_is_recorded_once() {
        let engine = engine();
        let exp = running(&engine, 100.0, json!([])).await;
        let mut rx = engine.subscribe();
        engine.assign(&UserContext::for_session("s1")).await;
        assert!(engine.track_exposure(&exp.id, "s1").await.unwrap());
        assert!(!engine.track_exposure(&exp.id, "s1").await.unwrap());
        assert!(!engine.track_exposure(&exp.id, "unknown").await.unwrap());

        let mut exposures = 0;
        while let Ok(event) = rx.try_recv() {
            if let DomainEvent::Experiment(ExperimentEvent::Exposure { .. }) = event { exposures += 1; }
        }
        assert_eq!(exposures, 1);
    }

    #[tokio::test]
    async fn test_conversions_feed_results() {
        let engine = engine();
        let exp = running(&engine, 100.0, json!([])).await;
        for i in 0..20 {
            let session = format!("visitor-{i}");
            engine.assign(&UserContext::for_session(session.clone())).await;
            if i % 4 == 0 {
                assert!(engine.track_conversion(&exp.id, &session, "purchase", Some(2499.0), None).await.unwrap());
            }
        }
        let results = engine.results(&exp.id).await.unwrap();
        assert_eq!(results.total_participants, 20);
        let conversions: u64 = results.variants.iter().map(|v| v.conversions).sum();
        assert_eq!(conversions, 5);
    }

    #[tokio::test]
    async fn test_custom_code_is_rejected_not_run() {
        let engine = engine();
        running(&engine, 100.0, json!([
            { "type": "custom_code", "customCode": "document.body.innerHTML = ''" },
            { "type": "element_text", "selector": "h1", "value": "Drop 04" }
        ])).await;
        let mut bold = None;
        for i in 0..200 {
            let assigned = engine.assign(&UserContext::for_session(format!("s{i}"))).await;
            if let Some(a) = assigned.into_iter().find(|a| a.variant_id == "bold") {
                bold = Some(a);
                break;
            }
        }
        let bold = bold.expect("some session lands in the bold variant");
        assert_eq!(bold.transforms.len(), 1);
        assert_eq!(bold.rejected.len(), 1);
        assert_eq!(bold.rejected[0].index, 0);
    }

    #[tokio::test]
    async fn test_flag_rollout_and_overrides() {
        let engine = engine();
        let flag = engine.create_feature_flag(serde_json::from_value(json!({
            "name": "One page checkout", "enabled": true, "rolloutPercentage": 100,
            "variations": { "on": true }, "defaultVariation": "on"
        })).unwrap()).await.unwrap();
        let ctx = UserContext::for_session("s1");
        assert!(engine.is_feature_enabled(&flag.id, &ctx).await.unwrap());
        assert!(!engine.is_feature_enabled("flag_missing", &ctx).await.unwrap());
        assert_eq!(engine.feature_variation(&flag.id).await.unwrap(), Some(json!(true)));

        running(&engine, 100.0, json!([{ "type": "feature_flag", "property": flag.id.clone(), "value": false }])).await;
        // Both variants share the same identity; only the bold one forces the flag off.
        let assigned = engine.assign(&ctx).await;
        let forced_off = assigned.iter().any(|a| a.variant_id == "bold");
        assert_eq!(engine.is_feature_enabled(&flag.id, &ctx).await.unwrap(), !forced_off);
    }

    #[tokio::test]
    async fn test_stopping_an_experiment_releases_forced_flags() {
        let engine = engine();
        let flag = engine.create_feature_flag(serde_json::from_value(json!({
            "name": "Size guide", "enabled": true, "rolloutPercentage": 100
        })).unwrap()).await.unwrap();
        let draft: ExperimentDraft = serde_json::from_value(json!({
            "name": "Guide off",
            "variants": [{ "id": "off", "name": "Off", "trafficWeight": 100, "isControl": true,
                           "changes": [{ "type": "feature_flag", "property": flag.id.clone(), "value": false }] }]
        })).unwrap();
        let exp = engine.create_experiment(draft).await.unwrap();
        engine.start_experiment(&exp.id).await.unwrap();

        let ctx = UserContext::for_session("s-guide");
        assert_eq!(engine.assign(&ctx).await.len(), 1);
        assert!(!engine.is_feature_enabled(&flag.id, &ctx).await.unwrap());

        engine.stop_experiment(&exp.id).await.unwrap();
        assert!(engine.assign(&ctx).await.is_empty());
        assert!(engine.is_feature_enabled(&flag.id, &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_disabled_flag_is_off() {
        let engine = engine();
        let flag = engine.create_feature_flag(serde_json::from_value(json!({
            "name": "Dark mode", "enabled": false, "rolloutPercentage": 100
        })).unwrap()).await.unwrap();
        assert!(!engine.is_feature_enabled(&flag.id, &UserContext::for_session("s")).await.unwrap());
        assert_eq!(engine.feature_variation(&flag.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_multivariate_builds_cartesian_product() {
        let engine = engine();
        let request: MultivariateRequest = serde_json::from_value(json!({
            "name": "PDP layout",
            "targetMetrics": ["add_to_cart"],
            "factors": [
                { "id": "headline", "name": "Headline", "levels": [
                    { "id": "a", "name": "Short", "value": "Drop 04" },
                    { "id": "b", "name": "Long", "value": "Drop 04 is live now" }
                ]},
                { "id": "cta_color", "name": "CTA colour", "levels": [
                    { "id": "x", "name": "Black", "value": "#000" },
                    { "id": "y", "name": "Red", "value": "#e11" },
                    { "id": "z", "name": "White", "value": "#fff" }
                ]}
            ]
        })).unwrap();
        let exp = engine.create_multivariate_experiment(request).await.unwrap();
        assert_eq!(exp.kind, ExperimentType::Multivariate);
        assert_eq!(exp.variants.len(), 6);
        assert!(exp.variants[0].is_control);
        assert!(exp.variants.iter().all(|v| v.traffic_weight == 16.0));
        assert_eq!(exp.variants[1].description, "Headline: Short, CTA colour: Red");
        assert_eq!(exp.variants[5].changes[1], VariantChange::ConfigValue { property: "cta_color".into(), value: json!("#fff") });
    }

    #[tokio::test]
    async fn test_multivariate_without_levels_is_invalid() {
        let engine = engine();
        let request = MultivariateRequest { name: "Empty".into(), factors: vec![], target_metrics: vec![], traffic_allocation: None, targeting: None };
        assert!(matches!(engine.create_multivariate_experiment(request).await, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_lifecycle_errors_for_unknown_experiment() {
        let engine = engine();
        assert!(matches!(engine.start_experiment("exp_nope").await, Err(StoreError::NotFound(_))));
        assert!(matches!(engine.results("exp_nope").await, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_session_id_shape() {
        let id = generate_session_id();
        let (millis, suffix) = id.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
