//! Value objects produced by an analysis run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PatternCategory {
    Emotion,
    Sensory,
    Environmental,
    Correlation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: String,
    pub name: String,
    pub category: PatternCategory,
    pub confidence: f64,
    pub description: String,
    pub frequency: usize,
    pub recommendations: Vec<String>,
    pub data_points: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
    Low,
    Moderate,
    High,
}

impl Significance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Significance::Low => "low",
            Significance::Moderate => "moderate",
            Significance::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPair {
    pub factor_a: String,
    pub factor_b: String,
    pub coefficient: f64,
    pub significance: Significance,
    pub sample_count: usize,
    pub description: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    pub factors: Vec<String>,
    /// Row/column aligned with `factors`.
    pub matrix: Vec<Vec<f64>>,
    pub significant_pairs: Vec<CorrelationPair>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Coefficient for two named factors, if both are in the matrix.
    pub fn coefficient(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.factors.iter().position(|f| f == a)?;
        let j = self.factors.iter().position(|f| f == b)?;
        Some(self.matrix[i][j])
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub trend: TrendDirection,
    /// R² of the fitted trend.
    pub accuracy: f64,
    pub slope: f64,
    pub projected_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveInsight {
    pub metric: String,
    pub title: String,
    pub description: String,
    pub confidence: f64,
    pub severity: Severity,
    pub prediction: Option<Prediction>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyDetection {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub severity: Severity,
    pub description: String,
    pub value: f64,
    pub z_score: f64,
}

/// Unified output of one analysis. Every collection is always present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub patterns: Vec<Pattern>,
    pub correlations: Vec<CorrelationPair>,
    pub correlation_matrix: CorrelationMatrix,
    pub predictive_insights: Vec<PredictiveInsight>,
    pub anomalies: Vec<AnomalyDetection>,
    pub insights: Vec<String>,
    pub cache_key: Option<String>,
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Error-shaped result for an analysis that did not complete. Distinct
    /// from an empty success through `error`.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn has_findings(&self) -> bool {
        !self.patterns.is_empty()
            || !self.correlations.is_empty()
            || !self.predictive_insights.is_empty()
            || !self.anomalies.is_empty()
    }
}
