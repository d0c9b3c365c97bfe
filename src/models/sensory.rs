use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical class of a sensory response label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ResponseClass {
    Seeking,
    Avoiding,
    Neutral,
}

impl ResponseClass {
    /// Substring match, case-insensitive. "Seeking input", "sensory-seeking"
    /// and "seeks pressure" all land on `Seeking`.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("seek") {
            ResponseClass::Seeking
        } else if lower.contains("avoid") {
            ResponseClass::Avoiding
        } else {
            ResponseClass::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseClass::Seeking => "seeking",
            ResponseClass::Avoiding => "avoiding",
            ResponseClass::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensoryRecord {
    pub id: String,
    pub subject_id: Option<String>,
    /// visual, auditory, tactile, vestibular, proprioceptive, ...
    pub channel: String,
    pub response: String,
    pub response_class: ResponseClass,
    pub intensity: Option<u8>,
    pub timestamp: DateTime<Utc>,
    pub context: Option<String>,
}

impl SensoryRecord {
    pub fn channel_key(&self) -> String {
        self.channel.trim().to_lowercase()
    }
}
