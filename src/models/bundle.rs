//! Input bundle and ingestion normalization.
//!
//! Dashboards hand over records in a few historical shapes (`sensoryType`
//! vs `type`, `studentId` vs `subjectId`, missing trigger lists). The `Raw*`
//! types accept all of them and [`DataBundle::from_raw`] maps them onto the
//! canonical records once, so the analysis stages never see the variants.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{EmotionRecord, EnvironmentalSnapshot, ResponseClass, SensoryRecord, SessionRecord};

const UNKNOWN_SUBJECT: &str = "unknown";
const UNKNOWN_CHANNEL: &str = "unknown";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEmotionRecord {
    pub id: Option<String>,
    #[serde(alias = "studentId")]
    pub subject_id: Option<String>,
    pub emotion: String,
    pub intensity: f64,
    pub timestamp: DateTime<Utc>,
    pub triggers: Option<Vec<String>>,
    #[serde(alias = "notes")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSensoryRecord {
    pub id: Option<String>,
    #[serde(alias = "studentId")]
    pub subject_id: Option<String>,
    pub channel: Option<String>,
    pub sensory_type: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub response: Option<String>,
    pub response_type: Option<String>,
    pub intensity: Option<f64>,
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "notes")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSessionRecord {
    pub id: Option<String>,
    #[serde(alias = "studentId")]
    pub subject_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub emotions: Option<Vec<RawEmotionRecord>>,
    #[serde(default)]
    pub sensory_inputs: Option<Vec<RawSensoryRecord>>,
    #[serde(alias = "environmentalData")]
    pub environment: Option<EnvironmentalSnapshot>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataBundle {
    #[serde(default)]
    pub entries: Vec<RawSessionRecord>,
    #[serde(default)]
    pub emotions: Vec<RawEmotionRecord>,
    #[serde(default)]
    pub sensory_inputs: Vec<RawSensoryRecord>,
}

/// The canonical data bundle every analysis consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataBundle {
    pub entries: Vec<SessionRecord>,
    pub emotions: Vec<EmotionRecord>,
    pub sensory_inputs: Vec<SensoryRecord>,
}

impl DataBundle {
    pub fn from_raw(raw: RawDataBundle) -> Self {
        let entries = raw
            .entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| normalize_session(entry, idx))
            .collect();
        let emotions = raw
            .emotions
            .into_iter()
            .enumerate()
            .map(|(idx, record)| normalize_emotion(record, None, &format!("emotion-{idx}")))
            .collect();
        let sensory_inputs = raw
            .sensory_inputs
            .into_iter()
            .enumerate()
            .map(|(idx, record)| normalize_sensory(record, None, &format!("sensory-{idx}")))
            .collect();

        Self {
            entries,
            emotions,
            sensory_inputs,
        }
    }

    /// Parse a dashboard export, tolerating the legacy field names.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawDataBundle =
            serde_json::from_str(json).context("failed to parse data bundle")?;
        Ok(Self::from_raw(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.emotions.is_empty() && self.sensory_inputs.is_empty()
    }

    /// Every subject id mentioned anywhere in the bundle, sorted.
    pub fn subject_ids(&self) -> BTreeSet<String> {
        let mut ids: BTreeSet<String> = self
            .entries
            .iter()
            .map(|entry| entry.subject_id.clone())
            .filter(|id| id != UNKNOWN_SUBJECT)
            .collect();
        ids.extend(self.emotions.iter().filter_map(|r| r.subject_id.clone()));
        ids.extend(self.sensory_inputs.iter().filter_map(|r| r.subject_id.clone()));
        ids
    }

    /// Newest timestamp across all three collections.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries
            .iter()
            .map(|e| e.timestamp)
            .chain(self.emotions.iter().map(|e| e.timestamp))
            .chain(self.sensory_inputs.iter().map(|s| s.timestamp))
            .max()
    }

    /// Restrict every collection to the `days` before the newest record.
    pub fn within_days(&self, days: u32) -> Self {
        let Some(latest) = self.latest_timestamp() else {
            return Self::default();
        };
        let cutoff = latest - Duration::days(i64::from(days));

        Self {
            entries: self
                .entries
                .iter()
                .filter(|e| e.timestamp >= cutoff)
                .cloned()
                .collect(),
            emotions: self
                .emotions
                .iter()
                .filter(|e| e.timestamp >= cutoff)
                .cloned()
                .collect(),
            sensory_inputs: self
                .sensory_inputs
                .iter()
                .filter(|s| s.timestamp >= cutoff)
                .cloned()
                .collect(),
        }
    }
}

fn normalize_session(raw: RawSessionRecord, idx: usize) -> SessionRecord {
    let id = raw.id.unwrap_or_else(|| format!("entry-{idx}"));
    let subject_id = raw.subject_id.unwrap_or_else(|| UNKNOWN_SUBJECT.to_string());

    let emotions = raw
        .emotions
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(n, e)| normalize_emotion(e, Some(&subject_id), &format!("{id}-emotion-{n}")))
        .collect();
    let sensory_inputs = raw
        .sensory_inputs
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(n, s)| normalize_sensory(s, Some(&subject_id), &format!("{id}-sensory-{n}")))
        .collect();

    SessionRecord {
        id,
        subject_id,
        timestamp: raw.timestamp,
        emotions,
        sensory_inputs,
        environment: raw.environment,
    }
}

fn normalize_emotion(
    raw: RawEmotionRecord,
    parent_subject: Option<&str>,
    fallback_id: &str,
) -> EmotionRecord {
    EmotionRecord {
        id: raw.id.unwrap_or_else(|| fallback_id.to_string()),
        subject_id: raw.subject_id.or_else(|| parent_subject.map(String::from)),
        emotion: raw.emotion.trim().to_string(),
        intensity: clamp_intensity(raw.intensity),
        timestamp: raw.timestamp,
        triggers: raw
            .triggers
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        context: raw.context,
    }
}

fn normalize_sensory(
    raw: RawSensoryRecord,
    parent_subject: Option<&str>,
    fallback_id: &str,
) -> SensoryRecord {
    let channel = raw
        .channel
        .or(raw.sensory_type)
        .or(raw.kind)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| UNKNOWN_CHANNEL.to_string());
    let response = raw.response.or(raw.response_type).unwrap_or_default();
    let response_class = ResponseClass::from_label(&response);

    SensoryRecord {
        id: raw.id.unwrap_or_else(|| fallback_id.to_string()),
        subject_id: raw.subject_id.or_else(|| parent_subject.map(String::from)),
        channel,
        response,
        response_class,
        intensity: raw.intensity.map(clamp_intensity),
        timestamp: raw.timestamp,
        context: raw.context,
    }
}

fn clamp_intensity(value: f64) -> u8 {
    if !value.is_finite() {
        return 1;
    }
    value.round().clamp(1.0, 10.0) as u8
}
