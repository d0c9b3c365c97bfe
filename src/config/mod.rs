//! Analytics thresholds. Every number the pipeline compares against lives
//! here so a dashboard can override it without touching the stages.

mod store;

pub use store::ConfigStore;

use serde::{Deserialize, Serialize};

/// Sessions required before correlation pairs are surfaced as significant.
pub const MIN_SESSIONS_FOR_SIGNIFICANCE: usize = 10;
/// Sessions required before a metric gets a predictive insight.
pub const MIN_SESSIONS_FOR_PREDICTION: usize = 5;
/// Sessions required to build a correlation matrix at all.
pub const MIN_SESSIONS_FOR_CORRELATION: usize = 3;

/// Named preset scaling anomaly and pattern thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertSensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl AlertSensitivity {
    /// Higher sensitivity lowers the thresholds.
    pub fn multiplier(&self) -> f64 {
        match self {
            AlertSensitivity::Low => 1.2,
            AlertSensitivity::Medium => 1.0,
            AlertSensitivity::High => 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CorrelationThresholds {
    pub high: f64,
    pub high_min_samples: usize,
    pub moderate: f64,
    pub min_sessions: usize,
    pub min_sessions_for_significance: usize,
}

impl Default for CorrelationThresholds {
    fn default() -> Self {
        Self {
            high: 0.7,
            high_min_samples: 10,
            moderate: 0.4,
            min_sessions: MIN_SESSIONS_FOR_CORRELATION,
            min_sessions_for_significance: MIN_SESSIONS_FOR_SIGNIFICANCE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PredictionThresholds {
    pub min_sessions: usize,
    /// |slope| below this is reported as stable.
    pub stable_epsilon: f64,
    /// Adverse slope, in series standard deviations per session.
    pub medium_rate: f64,
    pub high_rate: f64,
}

impl Default for PredictionThresholds {
    fn default() -> Self {
        Self {
            min_sessions: MIN_SESSIONS_FOR_PREDICTION,
            stable_epsilon: 0.01,
            medium_rate: 0.15,
            high_rate: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnomalyThresholds {
    pub z_score_threshold: f64,
    pub high_multiplier: f64,
    pub medium_multiplier: f64,
    /// Other sessions needed before a baseline is trusted.
    pub min_baseline: usize,
    /// `None` uses every session as the baseline.
    pub baseline_window_days: Option<u32>,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            z_score_threshold: 2.0,
            high_multiplier: 3.0,
            medium_multiplier: 1.5,
            min_baseline: 3,
            baseline_window_days: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InsightThresholds {
    pub low_data_sessions: usize,
    pub pattern_confidence_floor: f64,
    pub sensory_confidence_floor: f64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            low_data_sessions: 5,
            pattern_confidence_floor: 0.7,
            sensory_confidence_floor: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeWindows {
    pub default_days: u32,
    pub recent_days: u32,
    pub long_term_days: u32,
}

impl Default for TimeWindows {
    fn default() -> Self {
        Self {
            default_days: 30,
            recent_days: 7,
            long_term_days: 90,
        }
    }
}

impl TimeWindows {
    /// Windows the cache warmer precomputes, shortest first.
    pub fn all(&self) -> [u32; 3] {
        [self.recent_days, self.default_days, self.long_term_days]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HostSettings {
    pub timeout_ms: u64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self { timeout_ms: 5_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsConfiguration {
    pub min_data_points: usize,
    /// Share of records (0–1) above which a motif counts as a pattern.
    pub concern_frequency_threshold: f64,
    /// Pattern lookback. `None` falls back to `time_windows.default_days`.
    pub lookback_days: Option<u32>,
    pub alert_sensitivity: AlertSensitivity,
    pub correlation: CorrelationThresholds,
    pub prediction: PredictionThresholds,
    pub anomaly: AnomalyThresholds,
    pub insights: InsightThresholds,
    pub time_windows: TimeWindows,
    pub cache: CacheSettings,
    pub host: HostSettings,
}

impl Default for AnalyticsConfiguration {
    fn default() -> Self {
        Self {
            min_data_points: 3,
            concern_frequency_threshold: 0.2,
            lookback_days: None,
            alert_sensitivity: AlertSensitivity::default(),
            correlation: CorrelationThresholds::default(),
            prediction: PredictionThresholds::default(),
            anomaly: AnomalyThresholds::default(),
            insights: InsightThresholds::default(),
            time_windows: TimeWindows::default(),
            cache: CacheSettings::default(),
            host: HostSettings::default(),
        }
    }
}

impl AnalyticsConfiguration {
    pub fn effective_lookback_days(&self) -> u32 {
        self.lookback_days.unwrap_or(self.time_windows.default_days)
    }

    /// Concern frequency after the sensitivity preset, kept below 1.
    pub fn effective_concern_threshold(&self) -> f64 {
        (self.concern_frequency_threshold * self.alert_sensitivity.multiplier()).clamp(0.0, 0.99)
    }

    pub fn effective_anomaly_threshold(&self) -> f64 {
        self.anomaly.z_score_threshold * self.alert_sensitivity.multiplier()
    }

    /// Copy pinned to a lookback window, used when warming the cache.
    pub fn with_lookback(&self, days: u32) -> Self {
        Self {
            lookback_days: Some(days),
            ..self.clone()
        }
    }
}
