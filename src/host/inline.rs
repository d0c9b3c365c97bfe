use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::cache::AnalysisCache;
use crate::engine::Orchestrator;
use crate::models::AnalysisResult;

use super::{serve, AnalysisHost, AnalysisRequest, HostError, InFlight};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "sensory_pulse::host";

use crate::log_warn;

/// Runs analyses on the caller's task, one at a time. Waiting requests are
/// served in arrival order by the fair slot lock.
#[derive(Clone)]
pub struct InlineHost {
    orchestrator: Orchestrator,
    cache: Arc<AnalysisCache>,
    timeout: Duration,
    slot: Arc<Mutex<()>>,
    in_flight: Arc<AtomicUsize>,
}

impl InlineHost {
    pub fn new(orchestrator: Orchestrator, cache: Arc<AnalysisCache>, timeout: Duration) -> Self {
        Self {
            orchestrator,
            cache,
            timeout,
            slot: Arc::new(Mutex::new(())),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn cache(&self) -> &Arc<AnalysisCache> {
        &self.cache
    }
}

impl AnalysisHost for InlineHost {
    async fn run_analysis(&self, request: AnalysisRequest) -> Result<AnalysisResult, HostError> {
        let _flight = InFlight::enter(&self.in_flight);
        let _slot = self.slot.lock().await;

        serve(&self.cache, request, true, |bundle, config, sink| async move {
            let cancel = CancellationToken::new();
            let run = self.orchestrator.analyze_with(&bundle, &config, &sink, &cancel);
            match tokio::time::timeout(self.timeout, run).await {
                Ok(outcome) => outcome.map_err(HostError::from),
                Err(_) => {
                    cancel.cancel();
                    let after_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                    log_warn!("Inline analysis exceeded {after_ms} ms");
                    Err(HostError::Timeout { after_ms })
                }
            }
        })
        .await
    }

    fn is_idle(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostMessage;
    use crate::models::{DataBundle, EmotionRecord};
    use chrono::{TimeZone, Utc};

    fn bundle(label: &str) -> DataBundle {
        let emotions = (1..=3)
            .map(|day| EmotionRecord {
                id: format!("{label}-{day}"),
                subject_id: Some("s9".into()),
                emotion: label.into(),
                intensity: 6,
                timestamp: Utc.with_ymd_and_hms(2024, 8, day, 14, 0, 0).unwrap(),
                triggers: Vec::new(),
                context: None,
            })
            .collect();
        DataBundle {
            entries: Vec::new(),
            emotions,
            sensory_inputs: Vec::new(),
        }
    }

    #[tokio::test]
    async fn second_identical_request_is_served_from_cache() {
        let host = InlineHost::new(Orchestrator::new(), Arc::new(AnalysisCache::default()), Duration::from_secs(5));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let first = host.run_analysis(AnalysisRequest::new(bundle("happy"))).await.unwrap();
        let second = host
            .run_analysis(AnalysisRequest::new(bundle("happy")).with_messages(tx))
            .await
            .unwrap();

        assert_eq!(first, second);
        match rx.try_recv().unwrap() {
            HostMessage::Complete { from_cache, .. } => assert!(from_cache),
            other => panic!("unexpected message {other:?}"),
        }
        assert!(rx.try_recv().is_err());
        assert_eq!(host.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn explicit_cache_key_is_used() {
        let host = InlineHost::new(Orchestrator::new(), Arc::new(AnalysisCache::default()), Duration::from_secs(5));
        let result = host
            .run_analysis(AnalysisRequest::new(bundle("sad")).with_cache_key("student-s9"))
            .await
            .unwrap();
        assert_eq!(result.cache_key.as_deref(), Some("student-s9"));
        assert!(host.cache().has("student-s9"));
    }
}
