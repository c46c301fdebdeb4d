//! Real user monitoring: beacon ingest into bounded buffers and rolled-up stats.

use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::RumSettings;
use crate::domain::aggregates::experiment::DeviceType;
use crate::domain::aggregates::{ErrorReport, PerformanceMetrics, RumEnvelope, RumKind, RumStats, UserInteraction};
use crate::domain::value_objects::Percentage;
use crate::experiments::bucketing::bucket_for;
use crate::{Result, StoreError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeRange { Hour, #[default] Day, Week, Month }

impl TimeRange {
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.unwrap_or("24h") {
            "1h" => Ok(TimeRange::Hour),
            "" | "24h" => Ok(TimeRange::Day),
            "7d" => Ok(TimeRange::Week),
            "30d" => Ok(TimeRange::Month),
            other => Err(StoreError::Validation(format!("unknown timeRange '{other}'"))),
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            TimeRange::Hour => Duration::hours(1),
            TimeRange::Day => Duration::hours(24),
            TimeRange::Week => Duration::days(7),
            TimeRange::Month => Duration::days(30),
        }
    }
}

#[derive(Default)]
struct Buffers {
    metrics: VecDeque<PerformanceMetrics>,
    interactions: VecDeque<UserInteraction>,
    errors: VecDeque<ErrorReport>,
}

fn push_bounded<T>(buf: &mut VecDeque<T>, item: T, capacity: usize) {
    while buf.len() >= capacity {
        buf.pop_front();
    }
    buf.push_back(item);
}

#[derive(Clone)]
pub struct RumService {
    settings: RumSettings,
    sample: Percentage,
    buffers: Arc<RwLock<Buffers>>,
}

impl RumService {
    pub fn new(settings: RumSettings) -> Self {
        let sample = Percentage::new(settings.sample_rate.clamp(0.0, 1.0) * 100.0).unwrap_or_default();
        Self { settings, sample, buffers: Arc::new(RwLock::new(Buffers::default())) }
    }

    /// Sessions are sampled by bucket so a session is either fully kept or fully dropped.
    pub fn is_sampled(&self, session_id: &str) -> bool {
        self.sample.admits(bucket_for("rum", session_id))
    }

    /// Stores one beacon. Returns `false` when the session is outside the sample.
    pub async fn ingest(&self, envelope: RumEnvelope) -> Result<bool> {
        if envelope.session_id.is_empty() {
            return Err(StoreError::Validation("sessionId is required".into()));
        }
        if !self.is_sampled(&envelope.session_id) {
            debug!(session_id = %envelope.session_id, "rum beacon dropped by sampling");
            return Ok(false);
        }
        let capacity = self.settings.buffer_capacity.max(1);
        let kind = envelope.kind;
        match kind {
            RumKind::Metrics => {
                let record: PerformanceMetrics = decode(envelope)?;
                push_bounded(&mut self.buffers.write().await.metrics, record, capacity);
            }
            RumKind::Interaction => {
                let record: UserInteraction = decode(envelope)?;
                push_bounded(&mut self.buffers.write().await.interactions, record, capacity);
            }
            RumKind::Error => {
                let record: ErrorReport = decode(envelope)?;
                push_bounded(&mut self.buffers.write().await.errors, record, capacity);
            }
        }
        debug!(?kind, "rum beacon stored");
        Ok(true)
    }

    pub async fn stats(&self, range: TimeRange) -> RumStats {
        let since = (Utc::now() - range.duration()).timestamp_millis();
        let buffers = self.buffers.read().await;
        let metrics: Vec<&PerformanceMetrics> = buffers.metrics.iter().filter(|m| m.timestamp >= since).collect();
        let errors = buffers.errors.iter().filter(|e| e.timestamp >= since).count();

        let page_views = metrics.len();
        if page_views == 0 {
            return RumStats::default();
        }
        let avg = |f: fn(&PerformanceMetrics) -> f64| metrics.iter().map(|m| f(m)).sum::<f64>() / page_views as f64;

        let mut views_per_session: HashMap<&str, usize> = HashMap::new();
        let mut span: HashMap<&str, (i64, i64)> = HashMap::new();
        let mut users: HashSet<&str> = HashSet::new();
        for m in &metrics {
            *views_per_session.entry(m.session_id.as_str()).or_default() += 1;
            users.insert(m.user_id.as_deref().unwrap_or(&m.session_id));
            widen(&mut span, &m.session_id, m.timestamp);
        }
        for i in buffers.interactions.iter().filter(|i| i.timestamp >= since) {
            if span.contains_key(i.session_id.as_str()) {
                widen(&mut span, &i.session_id, i.timestamp);
            }
        }

        let sessions = views_per_session.len() as f64;
        let bounced = views_per_session.values().filter(|&&n| n == 1).count() as f64;
        let duration_ms: i64 = span.values().map(|(lo, hi)| hi - lo).sum();
        let mobile = metrics.iter().filter(|m| m.device_type == DeviceType::Mobile).count() as f64;

        RumStats {
            average_lcp: round(avg(|m| m.lcp) / 1000.0, 2),
            average_fid: round(avg(|m| m.fid), 0),
            average_cls: round(avg(|m| m.cls), 3),
            average_page_load: round(avg(|m| m.load_complete), 0),
            bounce_rate: round(bounced / sessions * 100.0, 1),
            session_duration: round(duration_ms as f64 / sessions / 1000.0, 0),
            page_views: page_views as u64,
            unique_users: users.len() as u64,
            error_rate: round(errors as f64 / page_views as f64 * 100.0, 1),
            mobile_traffic: round(mobile / page_views as f64 * 100.0, 1),
        }
    }
}

fn widen<'a>(span: &mut HashMap<&'a str, (i64, i64)>, session: &'a str, ts: i64) {
    let entry = span.entry(session).or_insert((ts, ts));
    entry.0 = entry.0.min(ts);
    entry.1 = entry.1.max(ts);
}

fn round(v: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (v * f).round() / f
}

/// Envelope fields fill in whatever the `data` object leaves out.
fn decode<T: DeserializeOwned>(envelope: RumEnvelope) -> Result<T> {
    let RumEnvelope { data, session_id, user_id, timestamp, .. } = envelope;
    let mut data = match data {
        Value::Object(map) => map,
        _ => return Err(StoreError::Validation("data must be an object".into())),
    };
    data.entry("sessionId").or_insert(Value::String(session_id));
    data.entry("timestamp").or_insert(Value::from(timestamp));
    if let Some(user) = user_id {
        data.entry("userId").or_insert(Value::String(user));
    }
    serde_json::from_value(Value::Object(data)).map_err(|e| StoreError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(kind: RumKind, session: &str, data: Value) -> RumEnvelope {
        RumEnvelope { kind, data, session_id: session.into(), user_id: None, timestamp: Utc::now().timestamp_millis() }
    }

    fn page(session: &str, device: &str, lcp: f64, offset_ms: i64) -> RumEnvelope {
        let mut e = envelope(RumKind::Metrics, session, json!({
            "lcp": lcp, "fid": 80.0, "cls": 0.1, "loadComplete": 3000.0, "deviceType": device, "url": "/",
        }));
        e.timestamp -= offset_ms;
        e
    }

    #[tokio::test]
    async fn test_stats_roll_up_sessions() {
        let rum = RumService::new(RumSettings::default());
        assert!(rum.ingest(page("s1", "mobile", 2000.0, 60_000)).await.unwrap());
        assert!(rum.ingest(page("s1", "mobile", 3000.0, 0)).await.unwrap());
        assert!(rum.ingest(page("s2", "desktop", 2500.0, 0)).await.unwrap());
        rum.ingest(envelope(RumKind::Error, "s2", json!({ "message": "boom", "url": "/" }))).await.unwrap();

        let stats = rum.stats(TimeRange::Day).await;
        assert_eq!(stats.page_views, 3);
        assert_eq!(stats.unique_users, 2);
        assert_eq!(stats.average_lcp, 2.5);
        assert_eq!(stats.average_fid, 80.0);
        assert_eq!(stats.average_page_load, 3000.0);
        assert_eq!(stats.bounce_rate, 50.0);
        assert_eq!(stats.session_duration, 30.0);
        assert_eq!(stats.error_rate, 33.3);
        assert_eq!(stats.mobile_traffic, 66.7);
    }

    #[tokio::test]
    async fn test_old_records_fall_outside_range() {
        let rum = RumService::new(RumSettings::default());
        rum.ingest(page("s1", "desktop", 1000.0, 2 * 3_600_000)).await.unwrap();
        assert_eq!(rum.stats(TimeRange::Hour).await.page_views, 0);
        assert_eq!(rum.stats(TimeRange::Day).await.page_views, 1);
    }

    #[tokio::test]
    async fn test_buffer_evicts_oldest() {
        let rum = RumService::new(RumSettings { sample_rate: 1.0, buffer_capacity: 2 });
        for s in ["a", "b", "c"] {
            rum.ingest(page(s, "desktop", 1000.0, 0)).await.unwrap();
        }
        assert_eq!(rum.stats(TimeRange::Day).await.page_views, 2);
    }

    #[tokio::test]
    async fn test_sampling_is_stable_per_session() {
        let none = RumService::new(RumSettings { sample_rate: 0.0, buffer_capacity: 10 });
        assert!(!none.ingest(page("s1", "desktop", 1000.0, 0)).await.unwrap());

        let half = RumService::new(RumSettings { sample_rate: 0.5, buffer_capacity: 10 });
        for i in 0..50 {
            let session = format!("session-{i}");
            assert_eq!(half.is_sampled(&session), half.is_sampled(&session));
        }
    }

    #[tokio::test]
    async fn test_malformed_data_is_rejected() {
        let rum = RumService::new(RumSettings::default());
        let bad = envelope(RumKind::Metrics, "s1", json!({ "lcp": 1.0 }));
        assert!(matches!(rum.ingest(bad).await, Err(StoreError::Validation(_))));
        let not_object = envelope(RumKind::Error, "s1", json!("oops"));
        assert!(matches!(rum.ingest(not_object).await, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_parses_time_ranges() {
        assert_eq!(TimeRange::parse(None).unwrap(), TimeRange::Day);
        assert_eq!(TimeRange::parse(Some("7d")).unwrap(), TimeRange::Week);
        assert!(TimeRange::parse(Some("2y")).is_err());
    }
}
