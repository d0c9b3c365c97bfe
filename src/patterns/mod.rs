//! Recurring-motif detection over emotion and sensory streams.
//!
//! Insufficient data is a normal outcome here: each detector returns an
//! empty list rather than an error when its minimum sample is not met.

pub mod emotion;
pub mod scoring;
pub mod sensory;

pub use emotion::detect_emotion_patterns;
pub use sensory::detect_sensory_patterns;

use chrono::{DateTime, Duration, Utc};

/// Records inside the `days` window ending at the newest record. Anchoring
/// on the data rather than the clock keeps repeated runs identical.
pub(crate) fn within_lookback<T, F>(records: &[T], timestamp: F, days: u32) -> Vec<&T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let Some(latest) = records.iter().map(&timestamp).max() else {
        return Vec::new();
    };
    let cutoff = latest - Duration::days(i64::from(days));
    records.iter().filter(|r| timestamp(r) >= cutoff).collect()
}

pub(crate) fn slug(label: &str) -> String {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
