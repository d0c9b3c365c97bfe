use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::TrendDirection;

/// Derived per-session factors, in matrix order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    AvgEmotionIntensity,
    PositiveEmotionRatio,
    SensorySeekingRatio,
    SensoryAvoidingRatio,
    NoiseLevel,
    Temperature,
    LightingQuality,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::AvgEmotionIntensity,
        Metric::PositiveEmotionRatio,
        Metric::SensorySeekingRatio,
        Metric::SensoryAvoidingRatio,
        Metric::NoiseLevel,
        Metric::Temperature,
        Metric::LightingQuality,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::AvgEmotionIntensity => "avgEmotionIntensity",
            Metric::PositiveEmotionRatio => "positiveEmotionRatio",
            Metric::SensorySeekingRatio => "sensorySeekingRatio",
            Metric::SensoryAvoidingRatio => "sensoryAvoidingRatio",
            Metric::NoiseLevel => "noiseLevel",
            Metric::Temperature => "temperature",
            Metric::LightingQuality => "lightingQuality",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::AvgEmotionIntensity => "average emotion intensity",
            Metric::PositiveEmotionRatio => "positive emotion ratio",
            Metric::SensorySeekingRatio => "sensory seeking ratio",
            Metric::SensoryAvoidingRatio => "sensory avoiding ratio",
            Metric::NoiseLevel => "noise level",
            Metric::Temperature => "temperature",
            Metric::LightingQuality => "lighting quality",
        }
    }

    pub fn from_name(name: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn is_ratio(&self) -> bool {
        matches!(
            self,
            Metric::PositiveEmotionRatio
                | Metric::SensorySeekingRatio
                | Metric::SensoryAvoidingRatio
                | Metric::LightingQuality
        )
    }

    /// Direction in which a trend on this metric is a concern.
    pub fn adverse_direction(&self) -> Option<TrendDirection> {
        match self {
            Metric::PositiveEmotionRatio => Some(TrendDirection::Decreasing),
            Metric::SensoryAvoidingRatio
            | Metric::SensorySeekingRatio
            | Metric::NoiseLevel => Some(TrendDirection::Increasing),
            Metric::AvgEmotionIntensity | Metric::Temperature | Metric::LightingQuality => None,
        }
    }
}

/// Derived metric vector for one session. `None` means the session carried
/// nothing to derive the value from.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub avg_emotion_intensity: Option<f64>,
    pub positive_emotion_ratio: f64,
    pub sensory_seeking_ratio: f64,
    pub sensory_avoiding_ratio: f64,
    pub noise_level: Option<f64>,
    pub temperature: Option<f64>,
    pub lighting_quality: Option<f64>,
}

impl SessionMetrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        let value = match metric {
            Metric::AvgEmotionIntensity => self.avg_emotion_intensity,
            Metric::PositiveEmotionRatio => Some(self.positive_emotion_ratio),
            Metric::SensorySeekingRatio => Some(self.sensory_seeking_ratio),
            Metric::SensoryAvoidingRatio => Some(self.sensory_avoiding_ratio),
            Metric::NoiseLevel => self.noise_level,
            Metric::Temperature => self.temperature,
            Metric::LightingQuality => self.lighting_quality,
        };
        value.filter(|v| v.is_finite())
    }
}
