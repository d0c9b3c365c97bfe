use anyhow::Result;
use chrono::Duration;

use crate::config::AnalyticsConfiguration;
use crate::metrics::{chronological_metrics, metric_series, Metric, SessionMetrics};
use crate::models::{AnomalyDetection, SessionRecord, Severity};
use crate::stats::{z_score, Summary};
use crate::utils::title_case;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "sensory_pulse::predictive";

use crate::log_debug;

/// Flag sessions whose metrics sit more than the effective z threshold away
/// from the baseline formed by the other sessions in the window.
pub fn detect_anomalies(
    sessions: &[SessionRecord],
    config: &AnalyticsConfiguration,
) -> Result<Vec<AnomalyDetection>> {
    let metrics = baseline_window(chronological_metrics(sessions), config);
    let threshold = config.effective_anomaly_threshold();
    let anomaly = &config.anomaly;
    let mut detections: Vec<(usize, AnomalyDetection)> = Vec::new();

    for (metric_idx, metric) in Metric::ALL.into_iter().enumerate() {
        let series = metric_series(&metrics, metric);
        if series.len() <= anomaly.min_baseline {
            continue;
        }

        for (idx, (session_id, timestamp, value)) in series.iter().enumerate() {
            let others: Vec<f64> = series
                .iter()
                .enumerate()
                .filter(|(other_idx, _)| *other_idx != idx)
                .map(|(_, (_, _, v))| *v)
                .collect();

            let Some(baseline) = Summary::of(&others) else {
                continue;
            };
            let z = z_score(*value, baseline.mean, baseline.std_dev);
            if z.abs() <= threshold {
                continue;
            }

            let severity = if z.abs() >= anomaly.high_multiplier * threshold {
                Severity::High
            } else if z.abs() >= anomaly.medium_multiplier * threshold {
                Severity::Medium
            } else {
                Severity::Low
            };
            let side = if z > 0.0 { "above" } else { "below" };

            detections.push((
                metric_idx,
                AnomalyDetection {
                    session_id: session_id.clone(),
                    timestamp: *timestamp,
                    category: metric.name().to_string(),
                    severity,
                    description: format!(
                        "{} of {:.2} is {:.1} standard deviations {} the baseline mean of {:.2}",
                        title_case(metric.label()),
                        value,
                        z.abs(),
                        side,
                        baseline.mean
                    ),
                    value: *value,
                    z_score: z,
                },
            ));
        }
    }

    detections.sort_by(|a, b| {
        a.1.timestamp
            .cmp(&b.1.timestamp)
            .then_with(|| a.0.cmp(&b.0))
            .then_with(|| a.1.session_id.cmp(&b.1.session_id))
    });

    log_debug!(
        "anomaly scan: {} flagged across {} sessions (threshold {:.2})",
        detections.len(),
        metrics.len(),
        threshold
    );

    Ok(detections.into_iter().map(|(_, d)| d).collect())
}

/// Sessions inside `anomaly.baseline_window_days` of the newest session, or
/// all of them when no window is configured.
fn baseline_window(
    metrics: Vec<SessionMetrics>,
    config: &AnalyticsConfiguration,
) -> Vec<SessionMetrics> {
    let Some(days) = config.anomaly.baseline_window_days else {
        return metrics;
    };
    let Some(latest) = metrics.last().map(|m| m.timestamp) else {
        return metrics;
    };
    let cutoff = latest - Duration::days(i64::from(days));
    metrics.into_iter().filter(|m| m.timestamp >= cutoff).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertSensitivity;
    use crate::models::EnvironmentalSnapshot;
    use chrono::{TimeZone, Utc};

    fn noisy_session(day: u32, noise: f64) -> SessionRecord {
        SessionRecord {
            id: format!("s{day:02}"),
            subject_id: "s1".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 4, day, 9, 0, 0).unwrap(),
            emotions: Vec::new(),
            sensory_inputs: Vec::new(),
            environment: Some(EnvironmentalSnapshot {
                noise_level: Some(noise),
                ..Default::default()
            }),
        }
    }

    fn clustered_with_spike() -> Vec<SessionRecord> {
        let cluster = [5.0, 4.5, 5.5, 5.0, 4.4, 5.6, 5.0, 4.6, 5.4];
        let mut sessions: Vec<_> = cluster
            .iter()
            .enumerate()
            .map(|(i, v)| noisy_session(i as u32 + 1, *v))
            .collect();
        sessions.push(noisy_session(10, 9.0));
        sessions
    }

    #[test]
    fn spike_is_flagged_high() {
        let anomalies = detect_anomalies(&clustered_with_spike(), &AnalyticsConfiguration::default()).unwrap();
        assert_eq!(anomalies.len(), 1);
        let spike = &anomalies[0];
        assert_eq!(spike.session_id, "s10");
        assert_eq!(spike.category, "noiseLevel");
        assert_eq!(spike.severity, Severity::High);
        assert!(spike.z_score > 6.0);
        assert!(spike.description.contains("above"));
    }

    #[test]
    fn lower_sensitivity_downgrades_severity() {
        let mut config = AnalyticsConfiguration::default();
        config.alert_sensitivity = AlertSensitivity::Low;
        config.anomaly.high_multiplier = 10.0;
        let anomalies = detect_anomalies(&clustered_with_spike(), &config).unwrap();
        assert_eq!(anomalies[0].severity, Severity::Medium);
    }

    #[test]
    fn small_baselines_are_not_scored() {
        let sessions = vec![noisy_session(1, 5.0), noisy_session(2, 5.0), noisy_session(3, 50.0)];
        assert!(detect_anomalies(&sessions, &AnalyticsConfiguration::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn baseline_window_excludes_old_sessions() {
        let mut sessions = clustered_with_spike();
        sessions.iter_mut().take(7).for_each(|s| {
            s.timestamp = Utc.with_ymd_and_hms(2023, 1, 1, 9, 0, 0).unwrap();
        });
        let mut config = AnalyticsConfiguration::default();
        config.anomaly.baseline_window_days = Some(30);
        // Only three sessions remain in the window: two baseline values for
        // each candidate, under the minimum of three.
        assert!(detect_anomalies(&sessions, &config).unwrap().is_empty());
    }
}
