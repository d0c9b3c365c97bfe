/// Pattern confidence from sample size and how far the observed share
/// clears the concern threshold. Always in [0,1].
pub fn compute_confidence(
    sample_size: usize,
    min_data_points: usize,
    share: f64,
    threshold: f64,
) -> f64 {
    let sample_score = score_sample_size(sample_size, min_data_points);
    let margin_score = score_margin(share, threshold);

    (sample_score * (0.5 + 0.5 * margin_score)).clamp(0.0, 1.0)
}

/// n / (n + min): 0.5 at the minimum, approaching 1 as data accumulates.
/// Never decreases as n grows.
fn score_sample_size(sample_size: usize, min_data_points: usize) -> f64 {
    let denominator = sample_size + min_data_points;
    if denominator == 0 {
        return 0.0;
    }
    sample_size as f64 / denominator as f64
}

/// Fraction of the remaining headroom above the threshold that the share
/// occupies.
fn score_margin(share: f64, threshold: f64) -> f64 {
    let headroom = 1.0 - threshold;
    if headroom <= f64::EPSILON {
        return 0.0;
    }
    ((share - threshold) / headroom).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_grows_with_sample_size() {
        let small = compute_confidence(5, 3, 0.5, 0.2);
        let large = compute_confidence(50, 3, 0.5, 0.2);
        assert!(large >= small);
        assert!(small > 0.0);
    }

    #[test]
    fn confidence_grows_with_margin() {
        let narrow = compute_confidence(10, 3, 0.25, 0.2);
        let wide = compute_confidence(10, 3, 0.9, 0.2);
        assert!(wide > narrow);
    }

    #[test]
    fn confidence_stays_in_unit_interval() {
        assert_eq!(compute_confidence(0, 0, 0.5, 0.2), 0.0);
        let full = compute_confidence(1_000_000, 1, 1.0, 0.2);
        assert!(full <= 1.0 && full > 0.99);
        assert_eq!(compute_confidence(10, 3, 0.5, 1.0), 10.0 / 13.0 * 0.5);
    }
}
