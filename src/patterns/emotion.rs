use std::collections::BTreeMap;

use chrono::Timelike;

use crate::config::AnalyticsConfiguration;
use crate::models::{EmotionRecord, Pattern, PatternCategory, POSITIVE_EMOTIONS};

use super::{scoring::compute_confidence, slug, within_lookback};
use crate::utils::title_case;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "sensory_pulse::patterns";

use crate::log_debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DayBand {
    Morning,
    Afternoon,
    Evening,
}

impl DayBand {
    fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => DayBand::Morning,
            12..=16 => DayBand::Afternoon,
            _ => DayBand::Evening,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            DayBand::Morning => "morning",
            DayBand::Afternoon => "afternoon",
            DayBand::Evening => "evening",
        }
    }
}

/// Frequent emotions, recurring triggers and time-of-day clustering.
pub fn detect_emotion_patterns(
    emotions: &[EmotionRecord],
    config: &AnalyticsConfiguration,
) -> Vec<Pattern> {
    let records = within_lookback(emotions, |e| e.timestamp, config.effective_lookback_days());
    if records.len() < config.min_data_points {
        log_debug!(
            "skipping emotion patterns: {} records in window, need {}",
            records.len(),
            config.min_data_points
        );
        return Vec::new();
    }

    let threshold = config.effective_concern_threshold();
    let mut patterns = frequent_emotions(&records, threshold, config.min_data_points);
    patterns.extend(recurring_triggers(&records, threshold, config.min_data_points));
    patterns.extend(time_of_day_cluster(&records, threshold, config.min_data_points));

    log_debug!(
        "emotion patterns: {} detected from {} records",
        patterns.len(),
        records.len()
    );
    patterns
}

fn frequent_emotions(
    records: &[&EmotionRecord],
    threshold: f64,
    min_data_points: usize,
) -> Vec<Pattern> {
    let total = records.len();
    let mut groups: BTreeMap<String, Vec<&EmotionRecord>> = BTreeMap::new();
    for record in records {
        let key = record.label_key();
        if key.is_empty() {
            continue;
        }
        groups.entry(key).or_default().push(record);
    }

    let mut flagged: Vec<(String, Vec<&EmotionRecord>)> = groups
        .into_iter()
        .filter(|(_, group)| group.len() as f64 / total as f64 > threshold)
        .collect();
    // Most frequent first, label order breaks ties.
    flagged.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));

    flagged
        .into_iter()
        .map(|(label, group)| {
            let count = group.len();
            let share = count as f64 / total as f64;
            let avg_intensity =
                group.iter().map(|e| f64::from(e.intensity)).sum::<f64>() / count as f64;

            Pattern {
                id: format!("frequent-{}", slug(&label)),
                name: format!("Frequent {label}"),
                category: PatternCategory::Emotion,
                confidence: compute_confidence(total, min_data_points, share, threshold),
                description: format!(
                    "Feeling {label} was recorded in {count} of {total} observations ({:.0}%) with an average intensity of {avg_intensity:.1}",
                    share * 100.0
                ),
                frequency: count,
                recommendations: emotion_recommendations(&label, avg_intensity),
                data_points: total,
            }
        })
        .collect()
}

fn emotion_recommendations(label: &str, avg_intensity: f64) -> Vec<String> {
    if POSITIVE_EMOTIONS.contains(&label) {
        return vec![
            format!("Note which activities and settings accompany feeling {label} and build them into the routine"),
            format!("Use {label} moments to introduce new or challenging tasks"),
        ];
    }

    let mut recommendations = vec![
        format!("Review what typically happens right before the student feels {label}"),
        format!("Prepare a calming strategy the student can reach for when feeling {label}"),
    ];
    if avg_intensity >= 7.0 {
        recommendations.push(format!(
            "{} episodes are intense; plan a quiet space and check in with the support team",
            title_case(label)
        ));
    }
    recommendations
}

fn recurring_triggers(
    records: &[&EmotionRecord],
    threshold: f64,
    min_data_points: usize,
) -> Vec<Pattern> {
    let with_triggers: Vec<&&EmotionRecord> = records.iter().filter(|r| r.has_triggers()).collect();
    let total = with_triggers.len();
    if total < min_data_points {
        return Vec::new();
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in &with_triggers {
        // A trigger listed twice on one record still counts once.
        let mut seen: Vec<String> = record
            .triggers
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        seen.sort();
        seen.dedup();
        for trigger in seen {
            *counts.entry(trigger).or_insert(0) += 1;
        }
    }

    let mut flagged: Vec<(String, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count as f64 / total as f64 > threshold)
        .collect();
    flagged.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    flagged
        .into_iter()
        .map(|(trigger, count)| {
            let share = count as f64 / total as f64;
            Pattern {
                id: format!("trigger-{}", slug(&trigger)),
                name: format!("Recurring trigger: {trigger}"),
                category: PatternCategory::Emotion,
                confidence: compute_confidence(total, min_data_points, share, threshold),
                description: format!(
                    "'{trigger}' was noted as a trigger in {count} of {total} observations that listed triggers ({:.0}%)",
                    share * 100.0
                ),
                frequency: count,
                recommendations: vec![
                    format!("Anticipate '{trigger}' and give the student advance warning"),
                    format!("Agree on a coping plan for situations involving '{trigger}'"),
                ],
                data_points: total,
            }
        })
        .collect()
}

fn time_of_day_cluster(
    records: &[&EmotionRecord],
    threshold: f64,
    min_data_points: usize,
) -> Option<Pattern> {
    let total = records.len();
    let mut bands: BTreeMap<DayBand, usize> = BTreeMap::new();
    for record in records {
        *bands.entry(DayBand::from_hour(record.timestamp.hour())).or_insert(0) += 1;
    }

    let max_count = bands.values().copied().max()?;
    let leaders: Vec<DayBand> = bands
        .iter()
        .filter(|(_, count)| **count == max_count)
        .map(|(band, _)| *band)
        .collect();
    // A tie means there is no single cluster to report.
    if leaders.len() != 1 {
        return None;
    }
    let band = leaders[0];
    let share = max_count as f64 / total as f64;
    if share <= threshold {
        return None;
    }

    Some(Pattern {
        id: format!("time-of-day-{}", band.as_str()),
        name: format!("{} cluster", title_case(band.as_str())),
        category: PatternCategory::Environmental,
        confidence: compute_confidence(total, min_data_points, share, threshold),
        description: format!(
            "{max_count} of {total} emotion observations ({:.0}%) were recorded in the {}",
            share * 100.0,
            band.as_str()
        ),
        frequency: max_count,
        recommendations: vec![
            format!("Look at the {} schedule for demands that may drive these observations", band.as_str()),
            format!("Consider a planned regulation break early in the {}", band.as_str()),
        ],
        data_points: total,
    })
}
