//! Result aggregation and significance testing for experiments.

use serde::Serialize;
use std::f64::consts::SQRT_2;

use crate::domain::aggregates::{ExperimentAssignment, ExperimentConfig, ExperimentStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus { Running, Completed, Inconclusive }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType { ImplementWinner, ContinueTesting, StopTest, InvestigateFurther }

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub message: String,
    pub confidence: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantResult {
    pub id: String,
    pub name: String,
    pub participants: u64,
    pub conversions: u64,
    pub conversion_rate: f64,
    pub conversion_rate_change: f64,
    pub revenue: f64,
    pub revenue_per_user: f64,
    pub confidence: f64,
    pub is_statistically_significant: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentResults {
    pub experiment_id: String,
    pub status: ResultStatus,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    pub total_participants: u64,
    pub statistical_significance: f64,
    pub confidence_level: f64,
    pub winner: Option<String>,
    pub variants: Vec<VariantResult>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerAnalysis {
    pub power: f64,
    pub sample_size: Option<u64>,
    pub effect: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalTest {
    pub metric: String,
    pub test_type: &'static str,
    pub p_value: f64,
    pub confidence_interval: [f64; 2],
    pub effect_size: f64,
    pub power_analysis: PowerAnalysis,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZTest {
    pub z: f64,
    pub p_value: f64,
    pub difference: f64,
    pub std_error: f64,
}

// Abramowitz & Stegun 7.1.26, max error 1.5e-7.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t * (0.254_829_592 + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

pub fn normal_cdf(x: f64) -> f64 { 0.5 * (1.0 + erf(x / SQRT_2)) }

/// Inverse of [`normal_cdf`] by bisection.
pub fn normal_quantile(p: f64) -> f64 {
    let (mut lo, mut hi) = (-10.0_f64, 10.0_f64);
    for _ in 0..100 {
        let mid = (lo + hi) / 2.0;
        if normal_cdf(mid) < p { lo = mid } else { hi = mid }
    }
    (lo + hi) / 2.0
}

fn round2(v: f64) -> f64 { (v * 100.0).round() / 100.0 }

/// Two-sided pooled z-test for a difference in conversion proportions.
pub fn two_proportion_z_test(control_conv: u64, control_n: u64, variant_conv: u64, variant_n: u64) -> Option<ZTest> {
    if control_n == 0 || variant_n == 0 { return None; }
    let (n1, n2) = (control_n as f64, variant_n as f64);
    let p1 = control_conv as f64 / n1;
    let p2 = variant_conv as f64 / n2;
    let pooled = (control_conv + variant_conv) as f64 / (n1 + n2);
    let se = (pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2)).sqrt();
    if se == 0.0 || !se.is_finite() { return None; }
    let z = (p2 - p1) / se;
    let p_value = 2.0 * (1.0 - normal_cdf(z.abs()));
    Some(ZTest { z, p_value, difference: p2 - p1, std_error: se })
}

/// Visitors needed per variant to detect a relative lift of `mde_percent`
/// over `baseline` (a rate in `0..1`). Z-values are taken at two decimals,
/// which gives the usual 1.96 / 0.84 at the default alpha and power.
pub fn calculate_sample_size(baseline: f64, mde_percent: f64, power: f64, alpha: f64) -> Option<u64> {
    if !(0.0..1.0).contains(&baseline) || baseline == 0.0 { return None; }
    if !(0.0..1.0).contains(&alpha) || alpha == 0.0 || !(0.0..1.0).contains(&power) || power == 0.0 { return None; }
    let z_alpha = round2(normal_quantile(1.0 - alpha / 2.0));
    let z_beta = round2(normal_quantile(power));
    let p1 = baseline;
    let p2 = p1 * (1.0 + mde_percent / 100.0);
    if p2 == p1 { return None; }
    let pooled = (p1 + p2) / 2.0;
    let numerator = (z_alpha + z_beta).powi(2) * 2.0 * pooled * (1.0 - pooled);
    let denominator = (p2 - p1).powi(2);
    Some((numerator / denominator).ceil() as u64)
}

#[derive(Default)]
struct Tally { participants: u64, conversions: u64, revenue: f64 }

fn tally(assignments: &[ExperimentAssignment], variant_id: &str) -> Tally {
    assignments.iter().filter(|a| a.variant_id == variant_id).fold(Tally::default(), |mut t, a| {
        t.participants += 1;
        if a.converted_at.is_some() {
            t.conversions += 1;
            t.revenue += a.conversion_value.unwrap_or(0.0);
        }
        t
    })
}

fn rate(conversions: u64, participants: u64) -> f64 {
    if participants == 0 { 0.0 } else { conversions as f64 / participants as f64 }
}

pub fn build_results(experiment: &ExperimentConfig, assignments: &[ExperimentAssignment]) -> ExperimentResults {
    let threshold = experiment.statistical_significance;
    let control_id = experiment.control().map(|v| v.id.clone()).unwrap_or_default();
    let control = tally(assignments, &control_id);
    let control_rate = rate(control.conversions, control.participants);

    let variants: Vec<VariantResult> = experiment.variants.iter().map(|v| {
        let t = tally(assignments, &v.id);
        let r = rate(t.conversions, t.participants);
        let is_control = v.id == control_id;
        let confidence = if is_control { 0.0 } else {
            two_proportion_z_test(control.conversions, control.participants, t.conversions, t.participants)
                .map(|z| round2((1.0 - z.p_value) * 100.0))
                .unwrap_or(0.0)
        };
        VariantResult {
            id: v.id.clone(),
            name: v.name.clone(),
            participants: t.participants,
            conversions: t.conversions,
            conversion_rate: round2(r * 100.0),
            conversion_rate_change: if is_control || control_rate == 0.0 { 0.0 } else { round2((r - control_rate) / control_rate * 100.0) },
            revenue: round2(t.revenue),
            revenue_per_user: if t.participants == 0 { 0.0 } else { round2(t.revenue / t.participants as f64) },
            confidence,
            is_statistically_significant: !is_control && confidence >= threshold,
        }
    }).collect();

    let winner = variants.iter()
        .filter(|v| v.is_statistically_significant && v.conversion_rate_change > 0.0)
        .max_by(|a, b| a.conversion_rate_change.total_cmp(&b.conversion_rate_change))
        .cloned();
    let total_participants = variants.iter().map(|v| v.participants).sum();
    let confidence_level = variants.iter().map(|v| v.confidence).fold(0.0, f64::max);

    let mut recommendations = Vec::new();
    let treatments: Vec<&VariantResult> = variants.iter().filter(|v| v.id != control_id).collect();
    if let Some(w) = &winner {
        recommendations.push(Recommendation {
            kind: RecommendationType::ImplementWinner,
            message: format!("{} lifts conversion by {:.2}% over control", w.name, w.conversion_rate_change),
            confidence: w.confidence,
        });
    } else if !treatments.is_empty() && treatments.iter().all(|v| v.is_statistically_significant && v.conversion_rate_change < 0.0) {
        recommendations.push(Recommendation {
            kind: RecommendationType::StopTest,
            message: "Every variant performs significantly worse than control".into(),
            confidence: confidence_level,
        });
    } else {
        let needed = calculate_sample_size(control_rate, experiment.minimum_detectable_effect, 0.8, 0.05);
        let smallest = variants.iter().map(|v| v.participants).min().unwrap_or(0);
        match needed {
            Some(n) if smallest < n => recommendations.push(Recommendation {
                kind: RecommendationType::ContinueTesting,
                message: format!("Collect at least {n} participants per variant (smallest has {smallest})"),
                confidence: confidence_level,
            }),
            _ => recommendations.push(Recommendation {
                kind: RecommendationType::InvestigateFurther,
                message: "Sample size reached without a significant difference".into(),
                confidence: confidence_level,
            }),
        }
    }

    let status = match experiment.status {
        ExperimentStatus::Completed | ExperimentStatus::Cancelled if winner.is_none() => ResultStatus::Inconclusive,
        ExperimentStatus::Completed | ExperimentStatus::Cancelled => ResultStatus::Completed,
        _ => ResultStatus::Running,
    };

    ExperimentResults {
        experiment_id: experiment.id.clone(),
        status,
        start_date: experiment.start_date,
        end_date: experiment.end_date,
        total_participants,
        statistical_significance: threshold,
        confidence_level,
        winner: winner.map(|w| w.id),
        variants,
        recommendations,
    }
}

/// Compares the control with the best-converting treatment.
pub fn analyze(experiment: &ExperimentConfig, assignments: &[ExperimentAssignment], metric: &str) -> Option<StatisticalTest> {
    let control_id = experiment.control()?.id.clone();
    let control = tally(assignments, &control_id);
    let best = experiment.variants.iter()
        .filter(|v| v.id != control_id)
        .map(|v| tally(assignments, &v.id))
        .max_by(|a, b| rate(a.conversions, a.participants).total_cmp(&rate(b.conversions, b.participants)))?;

    let test = two_proportion_z_test(control.conversions, control.participants, best.conversions, best.participants)?;
    let p1 = rate(control.conversions, control.participants);
    let p2 = rate(best.conversions, best.participants);
    let unpooled = (p1 * (1.0 - p1) / control.participants as f64 + p2 * (1.0 - p2) / best.participants as f64).sqrt();
    let z_alpha = 1.96;
    let effect = if p1 == 0.0 { 0.0 } else { (p2 - p1) / p1 * 100.0 };
    let power = if unpooled > 0.0 { normal_cdf(test.difference.abs() / unpooled - z_alpha) } else { 0.0 };

    Some(StatisticalTest {
        metric: metric.to_string(),
        test_type: "z_test",
        p_value: test.p_value,
        confidence_interval: [test.difference - z_alpha * unpooled, test.difference + z_alpha * unpooled],
        effect_size: test.difference,
        power_analysis: PowerAnalysis {
            power,
            sample_size: calculate_sample_size(p1, effect.abs(), 0.8, 0.05),
            effect,
        },
    })
}
