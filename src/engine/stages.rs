use anyhow::Result;

use crate::config::AnalyticsConfiguration;
use crate::correlation::build_correlation_matrix;
use crate::models::{
    AnomalyDetection, CorrelationMatrix, EmotionRecord, Pattern, PredictiveInsight,
    SensoryRecord, SessionRecord,
};
use crate::patterns::{detect_emotion_patterns, detect_sensory_patterns};
use crate::predictive::{detect_anomalies, predict_trends};

const LOG_TARGET: &str = "sensory_pulse::engine";

use crate::log_error;

/// The analysis steps the orchestrator sequences. Each step is fallible on
/// its own; the orchestrator contains failures per step.
pub trait AnalysisStages: Send + Sync {
    fn emotion_patterns(
        &self,
        emotions: &[EmotionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<Pattern>>;

    fn sensory_patterns(
        &self,
        sensory_inputs: &[SensoryRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<Pattern>>;

    fn correlate(
        &self,
        sessions: &[SessionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<CorrelationMatrix>;

    fn predict(
        &self,
        sessions: &[SessionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<PredictiveInsight>>;

    fn anomalies(
        &self,
        sessions: &[SessionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<AnomalyDetection>>;
}

/// The built-in detectors.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardStages;

impl AnalysisStages for StandardStages {
    fn emotion_patterns(
        &self,
        emotions: &[EmotionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<Pattern>> {
        Ok(detect_emotion_patterns(emotions, config))
    }

    fn sensory_patterns(
        &self,
        sensory_inputs: &[SensoryRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<Pattern>> {
        Ok(detect_sensory_patterns(sensory_inputs, config))
    }

    fn correlate(
        &self,
        sessions: &[SessionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<CorrelationMatrix> {
        build_correlation_matrix(sessions, config)
    }

    fn predict(
        &self,
        sessions: &[SessionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<PredictiveInsight>> {
        predict_trends(sessions, config)
    }

    fn anomalies(
        &self,
        sessions: &[SessionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<AnomalyDetection>> {
        detect_anomalies(sessions, config)
    }
}

/// Result of one stage after containment.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    Completed(T),
    Faulted(String),
}

impl<T: Default> StageOutcome<T> {
    /// Log a stage error and keep the message.
    pub fn capture(stage: Stage, result: Result<T>) -> Self {
        match result {
            Ok(value) => StageOutcome::Completed(value),
            Err(err) => {
                log_error!("{} stage failed: {err:#}", stage.as_str());
                StageOutcome::Faulted(format!("{err:#}"))
            }
        }
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, StageOutcome::Faulted(_))
    }

    /// The stage's value, or the empty contribution when it faulted.
    pub fn into_contribution(self) -> T {
        match self {
            StageOutcome::Completed(value) => value,
            StageOutcome::Faulted(_) => T::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    EmotionPatterns,
    SensoryPatterns,
    Correlations,
    Predictions,
    Anomalies,
    Insights,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::EmotionPatterns => "emotion-patterns",
            Stage::SensoryPatterns => "sensory-patterns",
            Stage::Correlations => "correlations",
            Stage::Predictions => "predictions",
            Stage::Anomalies => "anomalies",
            Stage::Insights => "insights",
        }
    }

    /// Progress reported once the stage has finished.
    pub fn progress(&self) -> u8 {
        match self {
            Stage::EmotionPatterns => 15,
            Stage::SensoryPatterns => 30,
            Stage::Correlations => 50,
            Stage::Predictions => 70,
            Stage::Anomalies => 85,
            Stage::Insights => 100,
        }
    }
}
