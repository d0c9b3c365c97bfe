use anyhow::Result;

use crate::config::{AnalyticsConfiguration, PredictionThresholds};
use crate::metrics::{chronological_metrics, metric_series, Metric};
use crate::models::{Prediction, PredictiveInsight, SessionRecord, Severity, TrendDirection};
use crate::stats::{linear_trend, std_dev, LinearTrend};
use crate::utils::title_case;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "sensory_pulse::predictive";

use crate::log_debug;

/// One insight per metric with at least `prediction.min_sessions` values.
/// Metrics below the minimum are skipped without comment.
pub fn predict_trends(
    sessions: &[SessionRecord],
    config: &AnalyticsConfiguration,
) -> Result<Vec<PredictiveInsight>> {
    let thresholds = &config.prediction;
    let metrics = chronological_metrics(sessions);
    let mut insights = Vec::new();

    for metric in Metric::ALL {
        let values: Vec<f64> = metric_series(&metrics, metric)
            .into_iter()
            .map(|(_, _, value)| value)
            .collect();
        if values.len() < thresholds.min_sessions {
            log_debug!(
                "no trend for {}: {} samples, need {}",
                metric.name(),
                values.len(),
                thresholds.min_sessions
            );
            continue;
        }

        let trend = linear_trend(&values, thresholds.stable_epsilon)?;
        insights.push(build_insight(metric, &values, &trend, thresholds));
    }

    Ok(insights)
}

fn build_insight(
    metric: Metric,
    values: &[f64],
    trend: &LinearTrend,
    thresholds: &PredictionThresholds,
) -> PredictiveInsight {
    let n = values.len();
    let severity = trend_severity(metric, values, trend, thresholds);
    let sample_factor = n as f64 / (n + thresholds.min_sessions) as f64;
    let confidence = (trend.r_squared * sample_factor).clamp(0.0, 1.0);
    let projected_value = project_next(metric, trend, n);

    let label = metric.label();
    let title = match trend.direction {
        TrendDirection::Stable => format!("{} holding steady", title_case(label)),
        direction => format!("{} {}", title_case(label), direction.as_str()),
    };
    let description = format!(
        "Across the last {n} sessions the {label} has been {} ({:+.3} per session, R\u{b2} = {:.2}); the next session is projected at {:.2}",
        trend.direction.as_str(),
        trend.slope,
        trend.r_squared,
        projected_value
    );

    PredictiveInsight {
        metric: metric.name().to_string(),
        title,
        description,
        confidence,
        severity,
        prediction: Some(Prediction {
            trend: trend.direction,
            accuracy: trend.r_squared,
            slope: trend.slope,
            projected_value,
        }),
        recommendations: trend_recommendations(metric, trend.direction, severity),
    }
}

/// Escalates only for movement in the metric's adverse direction. The rate
/// is the slope in series standard deviations per session.
fn trend_severity(
    metric: Metric,
    values: &[f64],
    trend: &LinearTrend,
    thresholds: &PredictionThresholds,
) -> Severity {
    if metric.adverse_direction() != Some(trend.direction) {
        return Severity::Low;
    }
    let spread = std_dev(values);
    if spread <= f64::EPSILON {
        return Severity::Low;
    }
    let rate = trend.slope.abs() / spread;
    if rate >= thresholds.high_rate {
        Severity::High
    } else if rate >= thresholds.medium_rate {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn project_next(metric: Metric, trend: &LinearTrend, n: usize) -> f64 {
    let projected = trend.value_at(n as f64);
    if metric.is_ratio() {
        projected.clamp(0.0, 1.0)
    } else if metric == Metric::AvgEmotionIntensity {
        projected.clamp(1.0, 10.0)
    } else {
        projected
    }
}

fn trend_recommendations(
    metric: Metric,
    direction: TrendDirection,
    severity: Severity,
) -> Vec<String> {
    if metric.adverse_direction() != Some(direction) {
        return match direction {
            TrendDirection::Stable => Vec::new(),
            _ => vec![format!("Keep monitoring the {}", metric.label())],
        };
    }

    let mut recommendations = match metric {
        Metric::PositiveEmotionRatio => vec![
            "Positive emotions are becoming less frequent; review recent changes in routine or staffing".to_string(),
        ],
        Metric::SensoryAvoidingRatio => vec![
            "Sensory avoidance is rising; audit the environment for new stressors".to_string(),
        ],
        Metric::SensorySeekingRatio => vec![
            "Sensory seeking is rising; schedule more frequent sensory breaks".to_string(),
        ],
        Metric::NoiseLevel => vec![
            "Classroom noise is trending up; consider quieter work zones".to_string(),
        ],
        _ => Vec::new(),
    };
    if severity == Severity::High {
        recommendations.push("Share this trend with the support team at the next review".to_string());
    }
    recommendations
}
