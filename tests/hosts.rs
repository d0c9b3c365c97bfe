mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use common::*;
use sensory_pulse_lib::cache::AnalysisCache;
use sensory_pulse_lib::config::{AnalyticsConfiguration, HostSettings};
use sensory_pulse_lib::engine::{AnalysisStages, Orchestrator, StandardStages};
use sensory_pulse_lib::host::{
    AnalysisHost, AnalysisRequest, BackgroundHost, ExecutionHost, HostError, HostMessage,
    InlineHost,
};
use sensory_pulse_lib::models::{
    AnomalyDetection, CorrelationMatrix, DataBundle, EmotionRecord, Pattern, PredictiveInsight,
    SensoryRecord, SessionRecord,
};
use tokio::sync::mpsc::UnboundedReceiver;

const WORKER_THREAD: &str = "sensory-pulse-analysis";

/// Delegates to the standard stages. Emotion detection first records the
/// id of the first record, then sleeps for `delay` (plus `worker_delay` on
/// the worker thread), and panics there if `panic_on_worker` is set.
#[derive(Default)]
struct ProbeStages {
    delay: Duration,
    worker_delay: Duration,
    panic_on_worker: bool,
    seen: Mutex<Vec<String>>,
}

fn on_worker() -> bool {
    std::thread::current().name() == Some(WORKER_THREAD)
}

impl AnalysisStages for ProbeStages {
    fn emotion_patterns(
        &self,
        emotions: &[EmotionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<Pattern>> {
        if let Some(first) = emotions.first() {
            self.seen.lock().unwrap().push(first.id.clone());
        }
        if on_worker() {
            if self.panic_on_worker {
                panic!("worker-only failure");
            }
            std::thread::sleep(self.worker_delay);
        }
        std::thread::sleep(self.delay);
        StandardStages.emotion_patterns(emotions, config)
    }

    fn sensory_patterns(
        &self,
        sensory_inputs: &[SensoryRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<Pattern>> {
        std::thread::sleep(self.delay);
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
        sessions: &[SessionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<PredictiveInsight>> {
        StandardStages.predict(sessions, config)
    }

    fn anomalies(
        &self,
        sessions: &[SessionRecord],
        config: &AnalyticsConfiguration,
    ) -> Result<Vec<AnomalyDetection>> {
        StandardStages.anomalies(sessions, config)
    }
}

fn emotion_bundle(tag: &str) -> DataBundle {
    DataBundle {
        entries: Vec::new(),
        emotions: (1..=4)
            .map(|day| emotion(&format!("{tag}-{day}"), "calm", 4, day, 9))
            .collect(),
        sensory_inputs: Vec::new(),
    }
}

fn drain(rx: &mut UnboundedReceiver<HostMessage>) -> Vec<HostMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

#[tokio::test]
async fn background_timeout_writes_nothing_to_the_cache() {
    let cache = Arc::new(AnalysisCache::default());
    let stages = Arc::new(ProbeStages {
        delay: Duration::from_millis(150),
        ..Default::default()
    });
    let host = BackgroundHost::spawn(
        Orchestrator::with_stages(stages),
        Arc::clone(&cache),
        Duration::from_millis(20),
    )
    .unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let outcome = host
        .run_analysis(AnalysisRequest::new(emotion_bundle("slow")).with_messages(tx))
        .await;

    assert_eq!(outcome, Err(HostError::Timeout { after_ms: 20 }));
    assert!(cache.is_empty());

    let terminal: Vec<_> = drain(&mut rx).into_iter().filter(|m| m.is_terminal()).collect();
    assert_eq!(terminal.len(), 1);
    assert!(matches!(terminal[0], HostMessage::Error { timed_out: true, .. }));
}

#[tokio::test]
async fn abandoned_background_job_sends_nothing_after_the_error() {
    let stages = Arc::new(ProbeStages {
        delay: Duration::from_millis(150),
        ..Default::default()
    });
    let host = BackgroundHost::spawn(
        Orchestrator::with_stages(stages),
        Arc::new(AnalysisCache::default()),
        Duration::from_millis(20),
    )
    .unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let outcome = host
        .run_analysis(AnalysisRequest::new(emotion_bundle("late")).with_messages(tx))
        .await;
    assert!(matches!(outcome, Err(HostError::Timeout { .. })));

    // Let the worker finish its slow stage and reach the next checkpoint.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let messages = drain(&mut rx);
    assert_eq!(messages.len(), 1);
    assert!(matches!(messages[0], HostMessage::Error { timed_out: true, .. }));
}

#[tokio::test]
async fn inline_retry_after_timeout_is_the_only_voice() {
    let stages = Arc::new(ProbeStages {
        worker_delay: Duration::from_millis(150),
        ..Default::default()
    });
    let host = ExecutionHost::new(
        Orchestrator::with_stages(stages),
        Arc::new(AnalysisCache::default()),
        &HostSettings { timeout_ms: 20 },
    );
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    host.run_with_inline_retry(AnalysisRequest::new(emotion_bundle("twice")).with_messages(tx))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    let messages = drain(&mut rx);
    assert_eq!(messages.iter().filter(|m| m.is_terminal()).count(), 1);
    assert!(matches!(
        messages.last(),
        Some(HostMessage::Complete { from_cache: false, .. })
    ));
}

#[tokio::test]
async fn inline_timeout_is_reported_the_same_way() {
    let cache = Arc::new(AnalysisCache::default());
    let stages = Arc::new(ProbeStages {
        delay: Duration::from_millis(100),
        ..Default::default()
    });
    let host = InlineHost::new(
        Orchestrator::with_stages(stages),
        Arc::clone(&cache),
        Duration::from_millis(20),
    );

    let outcome = host.run_analysis(AnalysisRequest::new(emotion_bundle("slow"))).await;

    assert!(matches!(outcome, Err(HostError::Timeout { .. })));
    assert!(cache.is_empty());
    assert!(host.is_idle());
}

#[tokio::test]
async fn inline_requests_complete_in_arrival_order() {
    let stages = Arc::new(ProbeStages::default());
    let host = InlineHost::new(
        Orchestrator::with_stages(Arc::clone(&stages) as Arc<dyn AnalysisStages>),
        Arc::new(AnalysisCache::default()),
        Duration::from_secs(5),
    );

    let (a, b, c) = tokio::join!(
        host.run_analysis(AnalysisRequest::new(emotion_bundle("a"))),
        host.run_analysis(AnalysisRequest::new(emotion_bundle("b"))),
        host.run_analysis(AnalysisRequest::new(emotion_bundle("c"))),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(*stages.seen.lock().unwrap(), vec!["a-1", "b-1", "c-1"]);
}

#[tokio::test]
async fn messages_stream_progress_then_one_completion() {
    let host = ExecutionHost::inline(
        Orchestrator::new(),
        Arc::new(AnalysisCache::default()),
        &HostSettings::default(),
    );
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let request = AnalysisRequest::new(bundle_of(calm_sessions_with_noise(&[3.0, 5.0, 4.0, 6.0])))
        .with_messages(tx);
    let request_id = request.id;

    host.run_analysis(request).await.unwrap();
    let messages = drain(&mut rx);

    assert!(messages.iter().all(|m| m.request_id() == request_id));
    assert!(matches!(messages.first(), Some(HostMessage::Progress { .. })));
    assert!(messages.iter().any(|m| matches!(m, HostMessage::Partial { .. })));
    assert_eq!(messages.iter().filter(|m| m.is_terminal()).count(), 1);
    assert!(matches!(
        messages.last(),
        Some(HostMessage::Complete { from_cache: false, .. })
    ));
}

#[tokio::test]
async fn failed_background_run_is_retried_inline() {
    let cache = Arc::new(AnalysisCache::default());
    let stages = Arc::new(ProbeStages {
        panic_on_worker: true,
        ..Default::default()
    });
    let host = ExecutionHost::new(
        Orchestrator::with_stages(stages),
        Arc::clone(&cache),
        &HostSettings::default(),
    );
    assert_eq!(host.strategy(), "background");
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let result = host
        .run_with_inline_retry(AnalysisRequest::new(emotion_bundle("retry")).with_messages(tx))
        .await
        .unwrap();

    assert!(result.cache_key.is_some());
    assert_eq!(cache.len(), 1);
    let terminal: Vec<_> = drain(&mut rx).into_iter().filter(|m| m.is_terminal()).collect();
    assert_eq!(terminal.len(), 1);
    assert!(matches!(terminal[0], HostMessage::Complete { .. }));
    assert!(host.is_idle());
}

#[tokio::test]
async fn subject_tag_invalidates_cached_results() {
    let cache = Arc::new(AnalysisCache::default());
    let host = ExecutionHost::inline(Orchestrator::new(), Arc::clone(&cache), &HostSettings::default());

    host.run_analysis(AnalysisRequest::new(emotion_bundle("x"))).await.unwrap();
    host.run_analysis(
        AnalysisRequest::new(emotion_bundle("x")).with_config(AnalyticsConfiguration::default().with_lookback(7)),
    )
    .await
    .unwrap();

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.invalidate_by_tag(&format!("subject:{SUBJECT}")), 2);
    assert!(cache.is_empty());
}
