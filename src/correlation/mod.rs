//! Factor-by-factor correlation across derived session metrics.

pub mod describe;

use anyhow::Result;

use crate::config::AnalyticsConfiguration;
use crate::metrics::{session_metrics, Metric, SessionMetrics};
use crate::models::{CorrelationMatrix, CorrelationPair, SessionRecord, Significance};
use crate::stats::{classify_significance, pearson_correlation};

use describe::{describe_pair, recommend_for_pair};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "sensory_pulse::correlation";

use crate::log_debug;

/// Build the correlation matrix. Fewer than `correlation.min_sessions`
/// sessions yields an empty matrix; fewer than
/// `correlation.min_sessions_for_significance` leaves `significant_pairs`
/// empty even though coefficients are computed.
pub fn build_correlation_matrix(
    sessions: &[SessionRecord],
    config: &AnalyticsConfiguration,
) -> Result<CorrelationMatrix> {
    let thresholds = &config.correlation;
    if sessions.len() < thresholds.min_sessions {
        log_debug!(
            "skipping correlation matrix: {} sessions, need {}",
            sessions.len(),
            thresholds.min_sessions
        );
        return Ok(CorrelationMatrix::default());
    }

    let metrics: Vec<SessionMetrics> = sessions.iter().map(session_metrics).collect();

    // Factors with fewer than two values cannot correlate with anything.
    let factors: Vec<Metric> = Metric::ALL
        .into_iter()
        .filter(|metric| metrics.iter().filter(|m| m.get(*metric).is_some()).count() >= 2)
        .collect();

    let size = factors.len();
    let mut matrix = vec![vec![0.0; size]; size];
    let mut pairs = Vec::new();

    for i in 0..size {
        matrix[i][i] = 1.0;
        for j in (i + 1)..size {
            let (xs, ys) = paired_values(&metrics, factors[i], factors[j]);
            if xs.len() < 2 {
                continue;
            }

            let coefficient = pearson_correlation(&xs, &ys)?;
            matrix[i][j] = coefficient;
            matrix[j][i] = coefficient;

            let significance = classify_significance(coefficient.abs(), xs.len(), thresholds);
            if significance != Significance::Low {
                pairs.push(CorrelationPair {
                    factor_a: factors[i].name().to_string(),
                    factor_b: factors[j].name().to_string(),
                    coefficient,
                    significance,
                    sample_count: xs.len(),
                    description: describe_pair(factors[i], factors[j], coefficient, xs.len()),
                    recommendations: recommend_for_pair(factors[i], factors[j], coefficient),
                });
            }
        }
    }

    let significant_pairs = if sessions.len() >= thresholds.min_sessions_for_significance {
        // Stable sort keeps factor order for equal magnitudes.
        pairs.sort_by(|a, b| b.coefficient.abs().total_cmp(&a.coefficient.abs()));
        pairs
    } else {
        log_debug!(
            "holding back {} correlation pairs: {} sessions, need {}",
            pairs.len(),
            sessions.len(),
            thresholds.min_sessions_for_significance
        );
        Vec::new()
    };

    Ok(CorrelationMatrix {
        factors: factors.iter().map(|f| f.name().to_string()).collect(),
        matrix,
        significant_pairs,
    })
}

/// Values of two factors from the sessions where both are present.
fn paired_values(metrics: &[SessionMetrics], a: Metric, b: Metric) -> (Vec<f64>, Vec<f64>) {
    metrics
        .iter()
        .filter_map(|m| Some((m.get(a)?, m.get(b)?)))
        .unzip()
}
