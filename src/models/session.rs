use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EmotionRecord, SensoryRecord};

/// Classroom conditions captured alongside a tracking session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalSnapshot {
    pub noise_level: Option<f64>,
    pub temperature: Option<f64>,
    pub lighting: Option<String>,
    pub classroom_activity: Option<String>,
    pub crowd_size: Option<u32>,
}

impl EnvironmentalSnapshot {
    /// Lighting label mapped onto [0,1]. Unknown labels score 0.6.
    pub fn lighting_score(&self) -> Option<f64> {
        let label = self.lighting.as_deref()?.trim().to_lowercase();
        if label.is_empty() {
            return None;
        }
        let score = match label.as_str() {
            "natural" => 1.0,
            "bright" => 0.7,
            "dim" => 0.5,
            "fluorescent" => 0.4,
            "dark" => 0.2,
            _ => 0.6,
        };
        Some(score)
    }
}

/// One tracking entry: everything observed for a subject at one sitting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub subject_id: String,
    pub timestamp: DateTime<Utc>,
    pub emotions: Vec<EmotionRecord>,
    pub sensory_inputs: Vec<SensoryRecord>,
    pub environment: Option<EnvironmentalSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lighting_score_maps_known_labels() {
        let mut env = EnvironmentalSnapshot {
            lighting: Some("Natural".into()),
            ..Default::default()
        };
        assert_eq!(env.lighting_score(), Some(1.0));

        env.lighting = Some("flickering".into());
        assert_eq!(env.lighting_score(), Some(0.6));

        env.lighting = None;
        assert_eq!(env.lighting_score(), None);
    }
}
