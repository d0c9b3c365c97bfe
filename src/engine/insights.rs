use crate::config::InsightThresholds;
use crate::models::{AnalysisResult, Pattern, PatternCategory, Significance};

/// Plain-language summary lines for a completed run. Never empty.
pub fn synthesize_insights(
    result: &AnalysisResult,
    session_count: usize,
    thresholds: &InsightThresholds,
) -> Vec<String> {
    let mut insights = Vec::new();

    if session_count < thresholds.low_data_sessions {
        insights.push(format!(
            "Only {session_count} tracking session{} so far; at least {} are needed before trends become reliable",
            if session_count == 1 { "" } else { "s" },
            thresholds.low_data_sessions
        ));
    }

    if let Some(best) = strongest_pattern(&result.patterns, thresholds.pattern_confidence_floor) {
        insights.push(format!(
            "Most consistent pattern: {} ({:.0}% confidence). {}",
            best.name,
            best.confidence * 100.0,
            best.description
        ));
    }

    if let Some(sensory) = result.patterns.iter().find(|p| {
        p.category == PatternCategory::Sensory && p.confidence > thresholds.sensory_confidence_floor
    }) {
        insights.push(format!("Sensory profile: {}", sensory.description));
    }

    for pair in result
        .correlations
        .iter()
        .filter(|p| p.significance == Significance::High)
    {
        insights.push(format!("Strong relationship found. {}", pair.description));
    }

    if insights.is_empty() {
        insights.push(
            "No strong patterns yet; keep collecting data to build a clearer picture".to_string(),
        );
    }

    insights
}

/// Highest confidence above `floor`. The earliest pattern wins a tie.
fn strongest_pattern(patterns: &[Pattern], floor: f64) -> Option<&Pattern> {
    patterns
        .iter()
        .filter(|p| p.confidence > floor)
        .fold(None, |best: Option<&Pattern>, candidate| match best {
            Some(current) if current.confidence >= candidate.confidence => Some(current),
            _ => Some(candidate),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(name: &str, category: PatternCategory, confidence: f64) -> Pattern {
        Pattern {
            id: name.to_lowercase(),
            name: name.into(),
            category,
            confidence,
            description: format!("{name} description"),
            frequency: 4,
            recommendations: Vec::new(),
            data_points: 10,
        }
    }

    #[test]
    fn low_data_run_still_gets_an_advisory() {
        let insights = synthesize_insights(&AnalysisResult::empty(), 2, &InsightThresholds::default());
        assert_eq!(insights.len(), 1);
        assert!(insights[0].contains("Only 2 tracking sessions"));
    }

    #[test]
    fn no_findings_with_enough_data_asks_for_more() {
        let insights = synthesize_insights(&AnalysisResult::empty(), 12, &InsightThresholds::default());
        assert_eq!(insights.len(), 1);
        assert!(insights[0].contains("keep collecting data"));
    }

    #[test]
    fn strongest_pattern_and_sensory_profile_are_reported() {
        let mut result = AnalysisResult::empty();
        result.patterns = vec![
            pattern("Frequent anxious", PatternCategory::Emotion, 0.75),
            pattern("Auditory avoiding", PatternCategory::Sensory, 0.65),
            pattern("Frequent calm", PatternCategory::Emotion, 0.9),
        ];
        let insights = synthesize_insights(&result, 12, &InsightThresholds::default());

        assert_eq!(insights.len(), 2);
        assert!(insights[0].starts_with("Most consistent pattern: Frequent calm (90%"));
        assert_eq!(insights[1], "Sensory profile: Auditory avoiding description");
    }
}
