//! Statistical primitives shared by every analysis stage.
//!
//! Degenerate inputs (zero variance, zero stddev) resolve to 0 rather than
//! NaN so downstream scores stay inside their documented ranges.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::config::CorrelationThresholds;
use crate::models::{Significance, TrendDirection};

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            count: values.len(),
            mean: mean(values),
            std_dev: std_dev(values),
            min,
            max,
        })
    }
}

/// Pearson's r, clamped to [-1, 1].
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Result<f64> {
    if xs.len() != ys.len() {
        bail!(
            "pearson correlation needs equal-length series ({} vs {})",
            xs.len(),
            ys.len()
        );
    }
    if xs.len() < 2 {
        bail!("pearson correlation needs at least 2 samples, got {}", xs.len());
    }

    let mean_x = mean(xs);
    let mean_y = mean(ys);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return Ok(0.0);
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    if !r.is_finite() {
        return Ok(0.0);
    }
    Ok(r.clamp(-1.0, 1.0))
}

/// Band a coefficient by strength and sample size.
pub fn classify_significance(
    abs_r: f64,
    sample_count: usize,
    thresholds: &CorrelationThresholds,
) -> Significance {
    let abs_r = abs_r.abs();
    if abs_r >= thresholds.high && sample_count >= thresholds.high_min_samples {
        Significance::High
    } else if abs_r >= thresholds.moderate {
        Significance::Moderate
    } else {
        Significance::Low
    }
}

pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= f64::EPSILON {
        return 0.0;
    }
    (value - mean) / std_dev
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub direction: TrendDirection,
}

impl LinearTrend {
    /// Value of the fitted line at index `x`.
    pub fn value_at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Ordinary least squares over (index, value). `epsilon` is the dead zone
/// inside which the trend is reported as stable.
pub fn linear_trend(values: &[f64], epsilon: f64) -> Result<LinearTrend> {
    if values.len() < 2 {
        bail!("linear trend needs at least 2 points, got {}", values.len());
    }

    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = mean(values);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy <= f64::EPSILON || sxx <= 0.0 {
        0.0
    } else {
        ((sxy * sxy) / (sxx * syy)).clamp(0.0, 1.0)
    };

    let direction = if slope.abs() < epsilon {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    Ok(LinearTrend {
        slope,
        intercept,
        r_squared,
        direction,
    })
}
