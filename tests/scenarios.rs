mod common;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use common::*;
use sensory_pulse_lib::config::AnalyticsConfiguration;
use sensory_pulse_lib::engine::{AnalysisStages, Orchestrator, StandardStages};
use sensory_pulse_lib::models::{
    AnalysisResult, AnomalyDetection, CorrelationMatrix, DataBundle, EmotionRecord, Pattern,
    PatternCategory, PredictiveInsight, SensoryRecord, SessionRecord, Severity, Significance,
};

#[tokio::test]
async fn empty_input_yields_an_empty_result() {
    let result = Orchestrator::new()
        .analyze(&DataBundle::default(), &AnalyticsConfiguration::default())
        .await;

    assert!(result.patterns.is_empty());
    assert!(result.correlations.is_empty());
    assert!(result.correlation_matrix.is_empty());
    assert!(result.predictive_insights.is_empty());
    assert!(result.anomalies.is_empty());
    assert!(result.insights.is_empty());
    assert!(result.error.is_none());
}

#[tokio::test]
async fn two_sessions_stay_below_the_correlation_gate() {
    let sessions = calm_sessions_with_noise(&[3.0, 8.0]);
    let result = Orchestrator::new()
        .analyze(&bundle_of(sessions), &AnalyticsConfiguration::default())
        .await;

    assert!(result.correlation_matrix.is_empty());
    assert!(result.correlations.is_empty());
    assert!(result
        .insights
        .iter()
        .any(|line| line.contains("Only 2 tracking sessions")));
}

#[tokio::test]
async fn perfectly_linked_noise_and_avoidance_is_high() {
    // Session d has noise d and d of 5 auditory inputs avoiding.
    let sessions: Vec<SessionRecord> = (1..=5u32)
        .map(|day| {
            let inputs = (0..5u32)
                .map(|i| {
                    let response = if i < day { "avoiding" } else { "neutral" };
                    sensory(&format!("in-{day}-{i}"), "auditory", response, day)
                })
                .collect();
            session(day, Vec::new(), inputs, Some(f64::from(day)))
        })
        .collect();

    let mut config = AnalyticsConfiguration::default();
    config.correlation.high_min_samples = 5;
    config.correlation.min_sessions_for_significance = 5;

    let result = Orchestrator::new().analyze(&bundle_of(sessions), &config).await;

    let pair = result
        .correlations
        .iter()
        .find(|p| {
            let names = [p.factor_a.as_str(), p.factor_b.as_str()];
            names.contains(&"noiseLevel") && names.contains(&"sensoryAvoidingRatio")
        })
        .expect("noise/avoidance pair");
    assert!((pair.coefficient - 1.0).abs() < 1e-9);
    assert_eq!(pair.significance, Significance::High);
    assert_eq!(result.correlations, result.correlation_matrix.significant_pairs);
    assert!(result
        .insights
        .iter()
        .any(|line| line.starts_with("Strong relationship found")));
}

#[tokio::test]
async fn frequent_anxious_emotion_is_detected() {
    let labels = [
        "anxious", "happy", "anxious", "calm", "anxious", "sad", "anxious", "excited", "anxious",
        "tired",
    ];
    let emotions: Vec<EmotionRecord> = labels
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            let day = 1 + (idx as u32 % 7);
            let hour = [9, 13, 19][idx % 3];
            emotion(&format!("e{idx}"), label, 6, day, hour)
        })
        .collect();
    let bundle = DataBundle {
        entries: Vec::new(),
        emotions,
        sensory_inputs: Vec::new(),
    };

    let result = Orchestrator::new()
        .analyze(&bundle, &AnalyticsConfiguration::default())
        .await;

    let anxious = result
        .patterns
        .iter()
        .find(|p| p.id == "frequent-anxious")
        .expect("frequent-anxious pattern");
    assert_eq!(anxious.frequency, 5);
    assert_eq!(anxious.data_points, 10);
    assert_eq!(anxious.category, PatternCategory::Emotion);
    assert!(anxious.confidence > 0.0 && anxious.confidence <= 1.0);
    assert!(result.patterns.iter().all(|p| p.id != "frequent-happy"));
}

#[tokio::test]
async fn noise_spike_is_flagged_as_high_anomaly() {
    let levels = [5.0, 4.5, 5.5, 5.0, 4.4, 5.6, 5.0, 4.6, 5.4, 9.0];
    let result = Orchestrator::new()
        .analyze(
            &bundle_of(calm_sessions_with_noise(&levels)),
            &AnalyticsConfiguration::default(),
        )
        .await;

    let spike = result
        .anomalies
        .iter()
        .find(|a| a.category == "noiseLevel" && a.session_id == "session-10")
        .expect("noise anomaly");
    assert_eq!(spike.severity, Severity::High);
    assert_eq!(spike.value, 9.0);
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let levels = [2.0, 6.0, 3.0, 7.0, 4.0, 8.0];
    let bundle = bundle_of(calm_sessions_with_noise(&levels));
    let config = AnalyticsConfiguration::default();
    let orchestrator = Orchestrator::new();

    let first = orchestrator.analyze(&bundle, &config).await;
    let second = orchestrator.analyze(&bundle, &config).await;

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

/// Standard stages except prediction, which always fails.
struct BrokenPrediction;

impl AnalysisStages for BrokenPrediction {
    fn emotion_patterns(
        &self,
        emotions: &[EmotionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<Pattern>> {
        StandardStages.emotion_patterns(emotions, config)
    }

    fn sensory_patterns(
        &self,
        sensory_inputs: &[SensoryRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<Pattern>> {
        StandardStages.sensory_patterns(sensory_inputs, config)
    }

    fn correlate(
        &self,
        sessions: &[SessionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<CorrelationMatrix> {
        StandardStages.correlate(sessions, config)
    }

    fn predict(
        &self,
        _sessions: &[SessionRecord],
        _config: &AnalyticsConfiguration,
    ) -> Result<Vec<PredictiveInsight>> {
        Err(anyhow!("regression diverged"))
    }

    fn anomalies(
        &self,
        sessions: &[SessionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<AnomalyDetection>> {
        StandardStages.anomalies(sessions, config)
    }
}

#[tokio::test]
async fn a_failing_stage_does_not_abort_the_run() {
    let levels = [5.0, 4.5, 5.5, 5.0, 4.4, 5.6, 5.0, 4.6, 5.4, 9.0];
    let bundle = bundle_of(calm_sessions_with_noise(&levels));
    let config = AnalyticsConfiguration::default();

    let healthy: AnalysisResult = Orchestrator::new().analyze(&bundle, &config).await;
    let degraded = Orchestrator::with_stages(Arc::new(BrokenPrediction))
        .analyze(&bundle, &config)
        .await;

    assert!(!healthy.predictive_insights.is_empty());
    assert!(degraded.predictive_insights.is_empty());
    assert!(degraded.error.is_none());
    assert_eq!(degraded.anomalies, healthy.anomalies);
    assert_eq!(degraded.correlation_matrix, healthy.correlation_matrix);
    assert_eq!(degraded.patterns, healthy.patterns);
}

#[test]
fn legacy_field_names_are_normalized() {
    let json = r#"{
        "entries": [{
            "studentId": "student-7",
            "timestamp": "2024-05-01T10:00:00Z",
            "environmentalData": {"noiseLevel": 6.5, "lighting": "natural"},
            "sensoryInputs": [{"type": "Auditory", "responseType": "Avoiding", "timestamp": "2024-05-01T10:05:00Z"}]
        }],
        "emotions": [{"emotion": "Calm", "intensity": 14, "timestamp": "2024-05-01T10:00:00Z", "triggers": null}],
        "sensoryInputs": [{"sensoryType": "visual", "response": "seeking", "timestamp": "2024-05-01T11:00:00Z"}]
    }"#;

    let bundle = DataBundle::from_json(json).unwrap();
    assert_eq!(bundle.entries[0].subject_id, "student-7");
    assert_eq!(bundle.entries[0].sensory_inputs[0].channel_key(), "auditory");
    assert_eq!(bundle.emotions[0].intensity, 10);
    assert!(bundle.emotions[0].triggers.is_empty());
    assert_eq!(bundle.sensory_inputs[0].channel, "visual");
}
