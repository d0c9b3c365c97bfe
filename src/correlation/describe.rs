use crate::metrics::Metric;
use crate::utils::title_case;

pub fn strength_word(coefficient: f64) -> &'static str {
    let r = coefficient.abs();
    if r >= 0.7 {
        "strong"
    } else if r >= 0.4 {
        "moderate"
    } else {
        "weak"
    }
}

pub fn describe_pair(a: Metric, b: Metric, coefficient: f64, samples: usize) -> String {
    let direction = if coefficient >= 0.0 { "positive" } else { "negative" };
    let movement = if coefficient >= 0.0 {
        "tend to rise together"
    } else {
        "tend to move in opposite directions"
    };
    format!(
        "{} and {} show a {} {} correlation (r = {:.2}, n = {}); they {}",
        title_case(a.label()),
        b.label(),
        strength_word(coefficient),
        direction,
        coefficient,
        samples,
        movement
    )
}

/// Recommendations for factor pairs with a known classroom lever. Pairs are
/// matched regardless of order.
pub fn recommend_for_pair(a: Metric, b: Metric, coefficient: f64) -> Vec<String> {
    let positive = coefficient >= 0.0;
    let pair = if a <= b { (a, b) } else { (b, a) };

    match pair {
        (Metric::SensoryAvoidingRatio, Metric::NoiseLevel) if positive => vec![
            "Lower classroom noise or offer ear defenders during loud activities".to_string(),
            "Seat the student away from high-traffic, noisy areas".to_string(),
        ],
        (Metric::PositiveEmotionRatio, Metric::LightingQuality) if positive => vec![
            "Favour natural or softer lighting where possible".to_string(),
        ],
        (Metric::PositiveEmotionRatio, Metric::NoiseLevel) if !positive => vec![
            "Plan quieter periods; positive emotions drop as noise rises".to_string(),
        ],
        (Metric::AvgEmotionIntensity, Metric::NoiseLevel) if positive => vec![
            "Expect stronger reactions on noisy days and pre-teach calming strategies".to_string(),
        ],
        (Metric::AvgEmotionIntensity, Metric::Temperature) => vec![
            "Monitor room temperature alongside emotional intensity".to_string(),
        ],
        (Metric::PositiveEmotionRatio, Metric::SensorySeekingRatio) if positive => vec![
            "Sensory seeking appears regulating; keep sensory breaks available".to_string(),
        ],
        (Metric::PositiveEmotionRatio, Metric::SensoryAvoidingRatio) if !positive => vec![
            "Reducing sensory overload may improve mood; review avoidance triggers".to_string(),
        ],
        _ => vec![format!(
            "Keep tracking {} and {} together to confirm the relationship",
            a.label(),
            b.label()
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_names_strength_and_direction() {
        let text = describe_pair(Metric::NoiseLevel, Metric::SensoryAvoidingRatio, -0.82, 12);
        assert!(text.starts_with("Noise level and sensory avoiding ratio"));
        assert!(text.contains("strong negative"));
        assert!(text.contains("n = 12"));
    }

    #[test]
    fn known_pairs_match_in_either_order() {
        let forward = recommend_for_pair(Metric::NoiseLevel, Metric::SensoryAvoidingRatio, 0.8);
        let reverse = recommend_for_pair(Metric::SensoryAvoidingRatio, Metric::NoiseLevel, 0.8);
        assert_eq!(forward, reverse);
        assert!(forward[0].contains("noise"));
    }
}
