use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Labels counted as positive when computing the positive-emotion ratio.
pub const POSITIVE_EMOTIONS: [&str; 8] = [
    "happy", "calm", "excited", "content", "joyful", "relaxed", "proud", "focused",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmotionRecord {
    pub id: String,
    pub subject_id: Option<String>,
    pub emotion: String,
    /// 1–10, validated by the caller.
    pub intensity: u8,
    pub timestamp: DateTime<Utc>,
    pub triggers: Vec<String>,
    pub context: Option<String>,
}

impl EmotionRecord {
    /// Lowercased label, the grouping key for pattern detection.
    pub fn label_key(&self) -> String {
        self.emotion.trim().to_lowercase()
    }

    pub fn is_positive(&self) -> bool {
        let key = self.label_key();
        POSITIVE_EMOTIONS.contains(&key.as_str())
    }

    pub fn has_triggers(&self) -> bool {
        self.triggers.iter().any(|t| !t.trim().is_empty())
    }
}
