//! Analysis orchestration: sequences the detectors, contains per-stage
//! failures and assembles the unified result.

pub mod insights;
pub mod stages;

pub use insights::synthesize_insights;
pub use stages::{AnalysisStages, Stage, StageOutcome, StandardStages};

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::AnalyticsConfiguration;
use crate::models::{AnalysisResult, DataBundle};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "sensory_pulse::engine";

use crate::{log_debug, log_info};

/// The run was cancelled at a yield point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("analysis aborted")]
pub struct Aborted;

/// Receives progress and partial results while a run is in flight.
pub trait StageObserver: Send + Sync {
    fn on_progress(&self, _stage: Stage, _percent: u8) {}

    fn on_partial(&self, _partial: &AnalysisResult) {}
}

pub struct NoopObserver;

impl StageObserver for NoopObserver {}

#[derive(Clone)]
pub struct Orchestrator {
    stages: Arc<dyn AnalysisStages>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::with_stages(Arc::new(StandardStages))
    }

    pub fn with_stages(stages: Arc<dyn AnalysisStages>) -> Self {
        Self { stages }
    }

    /// Run every stage to completion without observation or cancellation.
    pub async fn analyze(
        &self,
        bundle: &DataBundle,
        config: &AnalyticsConfiguration,
    ) -> AnalysisResult {
        let never = CancellationToken::new();
        self.analyze_with(bundle, config, &NoopObserver, &never)
            .await
            .unwrap_or_else(|aborted| AnalysisResult::failed(aborted.to_string()))
    }

    pub async fn analyze_with(
        &self,
        bundle: &DataBundle,
        config: &AnalyticsConfiguration,
        observer: &dyn StageObserver,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, Aborted> {
        if bundle.emotions.is_empty() && bundle.sensory_inputs.is_empty() {
            log_debug!("no emotion or sensory records; returning empty result");
            observer.on_progress(Stage::Insights, Stage::Insights.progress());
            return Ok(AnalysisResult::empty());
        }

        let sessions = bundle.entries.as_slice();
        let mut result = AnalysisResult::empty();
        let mut faults = 0usize;

        checkpoint(cancel).await?;
        let emotion = StageOutcome::capture(
            Stage::EmotionPatterns,
            self.stages.emotion_patterns(&bundle.emotions, config),
        );
        faults += usize::from(emotion.is_faulted());
        result.patterns.extend(emotion.into_contribution());
        observer.on_progress(Stage::EmotionPatterns, Stage::EmotionPatterns.progress());

        checkpoint(cancel).await?;
        let sensory = StageOutcome::capture(
            Stage::SensoryPatterns,
            self.stages.sensory_patterns(&bundle.sensory_inputs, config),
        );
        faults += usize::from(sensory.is_faulted());
        result.patterns.extend(sensory.into_contribution());
        observer.on_progress(Stage::SensoryPatterns, Stage::SensoryPatterns.progress());
        observer.on_partial(&result);

        if sessions.len() > 2 {
            checkpoint(cancel).await?;
            let matrix =
                StageOutcome::capture(Stage::Correlations, self.stages.correlate(sessions, config));
            faults += usize::from(matrix.is_faulted());
            let matrix = matrix.into_contribution();
            result.correlations = matrix.significant_pairs.clone();
            result.correlation_matrix = matrix;
            observer.on_progress(Stage::Correlations, Stage::Correlations.progress());
            observer.on_partial(&result);
        }

        if sessions.len() > 1 {
            checkpoint(cancel).await?;
            let predictions =
                StageOutcome::capture(Stage::Predictions, self.stages.predict(sessions, config));
            faults += usize::from(predictions.is_faulted());
            result.predictive_insights = predictions.into_contribution();
            observer.on_progress(Stage::Predictions, Stage::Predictions.progress());

            checkpoint(cancel).await?;
            let anomalies =
                StageOutcome::capture(Stage::Anomalies, self.stages.anomalies(sessions, config));
            faults += usize::from(anomalies.is_faulted());
            result.anomalies = anomalies.into_contribution();
            observer.on_progress(Stage::Anomalies, Stage::Anomalies.progress());
            observer.on_partial(&result);
        }

        checkpoint(cancel).await?;
        result.insights = synthesize_insights(&result, sessions.len(), &config.insights);
        observer.on_progress(Stage::Insights, Stage::Insights.progress());

        log_info!(
            "analysis finished: {} patterns, {} correlations, {} insights, {} anomalies, {} faulted stages",
            result.patterns.len(),
            result.correlations.len(),
            result.predictive_insights.len(),
            result.anomalies.len(),
            faults
        );

        Ok(result)
    }
}

/// Yield to the scheduler, then honour cancellation.
async fn checkpoint(cancel: &CancellationToken) -> Result<(), Aborted> {
    tokio::task::yield_now().await;
    if cancel.is_cancelled() {
        Err(Aborted)
    } else {
        Ok(())
    }
}
