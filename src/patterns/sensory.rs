use std::collections::BTreeMap;

use crate::config::AnalyticsConfiguration;
use crate::models::{Pattern, PatternCategory, ResponseClass, SensoryRecord};

use super::{scoring::compute_confidence, slug, within_lookback};
use crate::utils::title_case;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "sensory_pulse::patterns";

use crate::log_debug;

/// Seeking or avoiding dominance per sensory channel.
pub fn detect_sensory_patterns(
    sensory_inputs: &[SensoryRecord],
    config: &AnalyticsConfiguration,
) -> Vec<Pattern> {
    let records = within_lookback(
        sensory_inputs,
        |s| s.timestamp,
        config.effective_lookback_days(),
    );
    let total = records.len();
    if total < config.min_data_points {
        log_debug!(
            "skipping sensory patterns: {} records in window, need {}",
            total,
            config.min_data_points
        );
        return Vec::new();
    }

    let threshold = config.effective_concern_threshold();
    let mut groups: BTreeMap<(String, ResponseClass), usize> = BTreeMap::new();
    for record in &records {
        if record.response_class == ResponseClass::Neutral {
            continue;
        }
        *groups
            .entry((record.channel_key(), record.response_class))
            .or_insert(0) += 1;
    }

    let mut flagged: Vec<((String, ResponseClass), usize)> = groups
        .into_iter()
        .filter(|(_, count)| *count as f64 / total as f64 > threshold)
        .collect();
    flagged.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    flagged
        .into_iter()
        .map(|((channel, class), count)| {
            let share = count as f64 / total as f64;
            Pattern {
                id: format!("sensory-{}-{}", slug(&channel), class.as_str()),
                name: format!("{} {}", title_case(&channel), class.as_str()),
                category: PatternCategory::Sensory,
                confidence: compute_confidence(total, config.min_data_points, share, threshold),
                description: format!(
                    "{} {} responses made up {count} of {total} sensory observations ({:.0}%)",
                    title_case(&channel),
                    class.as_str(),
                    share * 100.0
                ),
                frequency: count,
                recommendations: sensory_recommendations(&channel, class),
                data_points: total,
            }
        })
        .collect()
}

fn sensory_recommendations(channel: &str, class: ResponseClass) -> Vec<String> {
    match class {
        ResponseClass::Seeking => {
            let activity = match channel {
                "auditory" => "music or rhythm activities",
                "visual" => "visual timers or fidget viewers",
                "tactile" => "fidget tools or textured materials",
                "vestibular" => "movement breaks such as swinging or rocking",
                "proprioceptive" => "heavy-work tasks like carrying books",
                _ => "structured sensory breaks",
            };
            vec![
                format!("Offer scheduled {channel} input through {activity}"),
                format!("Build {channel} breaks into transitions before seeking escalates"),
            ]
        }
        ResponseClass::Avoiding => {
            let support = match channel {
                "auditory" => "noise-cancelling headphones or a quieter workspace",
                "visual" => "reduced lighting and less visual clutter",
                "tactile" => "alternative materials and advance notice before touch",
                "vestibular" => "predictable, low-movement routines",
                "proprioceptive" => "gentle, student-led physical activities",
                _ => "a calmer, lower-stimulus environment",
            };
            vec![
                format!("Reduce {channel} load with {support}"),
                format!("Give the student a way to signal {channel} overload"),
            ]
        }
        ResponseClass::Neutral => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn input(channel: &str, response: &str, day: u32) -> SensoryRecord {
        SensoryRecord {
            id: format!("{channel}-{day}"),
            subject_id: None,
            channel: channel.into(),
            response: response.into(),
            response_class: ResponseClass::from_label(response),
            intensity: Some(5),
            timestamp: Utc.with_ymd_and_hms(2024, 5, day, 10, 0, 0).unwrap(),
            context: None,
        }
    }

    #[test]
    fn avoiding_dominance_is_flagged_per_channel() {
        let records = vec![
            input("Auditory", "avoiding", 1),
            input("auditory", "Avoiding", 2),
            input("auditory", "avoiding", 3),
            input("tactile", "seeking", 4),
            input("visual", "neutral", 5),
            input("visual", "neutral", 6),
        ];
        let patterns = detect_sensory_patterns(&records, &AnalyticsConfiguration::default());

        let auditory = patterns
            .iter()
            .find(|p| p.id == "sensory-auditory-avoiding")
            .unwrap();
        assert_eq!(auditory.frequency, 3);
        assert_eq!(auditory.category, PatternCategory::Sensory);
        assert!(auditory.recommendations[0].contains("headphones"));
        // 1 of 6 tactile seeking stays under the 20% threshold.
        assert!(patterns.iter().all(|p| p.id != "sensory-tactile-seeking"));
        assert!(patterns.iter().all(|p| !p.id.contains("neutral")));
    }

    #[test]
    fn too_few_inputs_yield_nothing() {
        let records = vec![input("auditory", "avoiding", 1), input("auditory", "avoiding", 2)];
        assert!(detect_sensory_patterns(&records, &AnalyticsConfiguration::default()).is_empty());
    }
}
