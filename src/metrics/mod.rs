mod types;

pub use types::{Metric, SessionMetrics};

use chrono::{DateTime, Utc};

use crate::models::{ResponseClass, SessionRecord};

/// Derive the metric vector for a single session.
pub fn session_metrics(session: &SessionRecord) -> SessionMetrics {
    let avg_emotion_intensity = if session.emotions.is_empty() {
        None
    } else {
        let total: f64 = session.emotions.iter().map(|e| f64::from(e.intensity)).sum();
        Some(total / session.emotions.len() as f64)
    };

    let positive = session.emotions.iter().filter(|e| e.is_positive()).count();
    let seeking = session
        .sensory_inputs
        .iter()
        .filter(|s| s.response_class == ResponseClass::Seeking)
        .count();
    let avoiding = session
        .sensory_inputs
        .iter()
        .filter(|s| s.response_class == ResponseClass::Avoiding)
        .count();

    let environment = session.environment.as_ref();

    SessionMetrics {
        session_id: session.id.clone(),
        timestamp: session.timestamp,
        avg_emotion_intensity,
        positive_emotion_ratio: ratio(positive, session.emotions.len()),
        sensory_seeking_ratio: ratio(seeking, session.sensory_inputs.len()),
        sensory_avoiding_ratio: ratio(avoiding, session.sensory_inputs.len()),
        noise_level: environment.and_then(|e| e.noise_level),
        temperature: environment.and_then(|e| e.temperature),
        lighting_quality: environment.and_then(|e| e.lighting_score()),
    }
}

/// Metric vectors for every session, oldest first. Ties keep session id
/// order so the output never depends on input order.
pub fn chronological_metrics(sessions: &[SessionRecord]) -> Vec<SessionMetrics> {
    let mut metrics: Vec<SessionMetrics> = sessions.iter().map(session_metrics).collect();
    metrics.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    metrics
}

/// A metric's present values with their timestamps and session ids.
pub fn metric_series(
    metrics: &[SessionMetrics],
    metric: Metric,
) -> Vec<(String, DateTime<Utc>, f64)> {
    metrics
        .iter()
        .filter_map(|m| {
            m.get(metric)
                .map(|value| (m.session_id.clone(), m.timestamp, value))
        })
        .collect()
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64).clamp(0.0, 1.0)
}
