use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::config::{
    AlertSensitivity, AnalyticsConfiguration, AnomalyThresholds, CorrelationThresholds,
    InsightThresholds, PredictionThresholds,
};
use crate::models::DataBundle;

/// SHA-256 of the canonical JSON form of `data`. Object keys are sorted at
/// every depth, so field order never changes the digest.
pub fn fingerprint<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    let value = serde_json::to_value(data).context("failed to serialize value for fingerprint")?;
    let canonical = serde_json::to_string(&canonicalize(value))
        .context("failed to encode canonical JSON")?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// `<prefix>:<sha256>` over the params in name order. Each name and value
/// is length-prefixed so no value can spill into the next param.
pub fn build_key(prefix: &str, params: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    for (name, value) in params {
        for part in [name, value] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
    }
    format!("{prefix}:{:x}", hasher.finalize())
}

/// The settings an analysis result depends on. The lookback is resolved and
/// host and cache tuning are left out, so equivalent requests share a key.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisParams<'a> {
    min_data_points: usize,
    concern_frequency_threshold: f64,
    lookback_days: u32,
    alert_sensitivity: AlertSensitivity,
    correlation: &'a CorrelationThresholds,
    prediction: &'a PredictionThresholds,
    anomaly: &'a AnomalyThresholds,
    insights: &'a InsightThresholds,
}

impl<'a> From<&'a AnalyticsConfiguration> for AnalysisParams<'a> {
    fn from(config: &'a AnalyticsConfiguration) -> Self {
        Self {
            min_data_points: config.min_data_points,
            concern_frequency_threshold: config.concern_frequency_threshold,
            lookback_days: config.effective_lookback_days(),
            alert_sensitivity: config.alert_sensitivity,
            correlation: &config.correlation,
            prediction: &config.prediction,
            anomaly: &config.anomaly,
            insights: &config.insights,
        }
    }
}

/// Key under which an analysis of `bundle` with `config` is cached.
pub fn analysis_key(bundle: &DataBundle, config: &AnalyticsConfiguration) -> Result<String> {
    let params = BTreeMap::from([
        ("data".to_string(), fingerprint(bundle)?),
        ("config".to_string(), fingerprint(&AnalysisParams::from(config))?),
    ]);
    Ok(build_key("analysis", &params))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, inner)| (key, canonicalize(inner)))
                .collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_fingerprint() {
        let a = json!({"b": 1, "a": {"y": [1, 2], "x": null}});
        let b = json!({"a": {"x": null, "y": [1, 2]}, "b": 1});
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
        assert_eq!(fingerprint(&a).unwrap().len(), 64);
    }

    #[test]
    fn array_order_changes_fingerprint() {
        let a = json!([1, 2, 3]);
        let b = json!([3, 2, 1]);
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn build_key_is_prefixed_and_param_sensitive() {
        let one = BTreeMap::from([("days".to_string(), "7".to_string())]);
        let two = BTreeMap::from([("days".to_string(), "30".to_string())]);
        let key = build_key("analysis", &one);
        assert!(key.starts_with("analysis:"));
        assert_ne!(key, build_key("analysis", &two));
    }

    #[test]
    fn build_key_values_cannot_smuggle_params() {
        let joined = BTreeMap::from([("a".to_string(), "1;b=2".to_string())]);
        let split = BTreeMap::from([
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ]);
        assert_ne!(build_key("k", &joined), build_key("k", &split));
    }

    #[test]
    fn analysis_key_tracks_config() {
        let bundle = DataBundle::default();
        let config = AnalyticsConfiguration::default();
        let base = analysis_key(&bundle, &config).unwrap();
        assert_eq!(base, analysis_key(&bundle, &config.clone()).unwrap());
        assert_ne!(base, analysis_key(&bundle, &config.with_lookback(7)).unwrap());
    }

    #[test]
    fn analysis_key_ignores_settings_that_do_not_change_results() {
        let bundle = DataBundle::default();
        let config = AnalyticsConfiguration::default();
        let base = analysis_key(&bundle, &config).unwrap();

        let pinned = config.with_lookback(config.effective_lookback_days());
        assert_eq!(base, analysis_key(&bundle, &pinned).unwrap());

        let mut tuned = config.clone();
        tuned.host.timeout_ms = 1;
        tuned.cache.max_entries = 3;
        assert_eq!(base, analysis_key(&bundle, &tuned).unwrap());
    }
}
