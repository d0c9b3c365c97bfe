//! Execution hosts: where an analysis runs, how long it may take and how its
//! result reaches the cache and the caller.

pub mod background;
pub mod inline;
pub mod messages;
pub mod precompute;

pub use background::BackgroundHost;
pub use inline::InlineHost;
pub use messages::{HostMessage, MessageSink};
pub use precompute::CacheWarmer;

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::cache::{analysis_key, AnalysisCache};
use crate::config::{AnalyticsConfiguration, HostSettings};
use crate::engine::{Aborted, Orchestrator};
use crate::models::{AnalysisResult, DataBundle};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "sensory_pulse::host";

use crate::{log_debug, log_warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("analysis timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
    #[error("analysis worker unavailable: {0}")]
    WorkerUnavailable(String),
    #[error("analysis worker failed: {0}")]
    WorkerFailed(String),
    #[error("analysis aborted")]
    Aborted,
}

impl From<Aborted> for HostError {
    fn from(_: Aborted) -> Self {
        HostError::Aborted
    }
}

impl HostError {
    /// Failures a second attempt on another strategy may recover from.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, HostError::Aborted)
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub id: Uuid,
    pub bundle: DataBundle,
    pub config: Option<AnalyticsConfiguration>,
    pub cache_key: Option<String>,
    pub messages: Option<UnboundedSender<HostMessage>>,
}

impl AnalysisRequest {
    pub fn new(bundle: DataBundle) -> Self {
        Self {
            id: Uuid::new_v4(),
            bundle,
            config: None,
            cache_key: None,
            messages: None,
        }
    }

    pub fn with_config(mut self, config: AnalyticsConfiguration) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_messages(mut self, tx: UnboundedSender<HostMessage>) -> Self {
        self.messages = Some(tx);
        self
    }
}

pub trait AnalysisHost {
    fn run_analysis(
        &self,
        request: AnalysisRequest,
    ) -> impl Future<Output = Result<AnalysisResult, HostError>> + Send;

    /// No request is queued or running.
    fn is_idle(&self) -> bool;
}

/// Counts a request as in flight until dropped.
pub(crate) struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    pub(crate) fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Cache lookup, execution and write-through shared by both strategies.
/// The cache is written only when `run` completes. When `report_errors` is
/// false a failure is returned without a terminal message so the caller can
/// retry under the same request id. Either way the sink handed to `run` is
/// closed once `serve` returns.
pub(crate) async fn serve<F, Fut>(
    cache: &AnalysisCache,
    request: AnalysisRequest,
    report_errors: bool,
    run: F,
) -> Result<AnalysisResult, HostError>
where
    F: FnOnce(DataBundle, AnalyticsConfiguration, MessageSink) -> Fut,
    Fut: Future<Output = Result<AnalysisResult, HostError>>,
{
    let sink = MessageSink::new(request.id, request.messages.clone());
    let fail = |err: HostError| {
        if report_errors {
            sink.error(&err);
        } else {
            sink.close();
        }
        Err(err)
    };

    let config = request.config.unwrap_or_default();
    let key = match request.cache_key {
        Some(key) => key,
        None => match analysis_key(&request.bundle, &config) {
            Ok(key) => key,
            Err(err) => return fail(HostError::WorkerFailed(format!("{err:#}"))),
        },
    };

    if let Some(mut cached) = cache.get(&key) {
        log_debug!("cache hit for request {}", request.id);
        cached.cache_key = Some(key);
        sink.complete(&cached, true);
        return Ok(cached);
    }

    let tags: Vec<String> = request
        .bundle
        .subject_ids()
        .into_iter()
        .map(|id| format!("subject:{id}"))
        .collect();

    match run(request.bundle, config, sink.clone()).await {
        Ok(mut result) => {
            result.cache_key = Some(key.clone());
            cache.set(key, result.clone(), tags);
            sink.complete(&result, false);
            Ok(result)
        }
        Err(err) => {
            log_warn!("request {} failed: {err}", request.id);
            fail(err)
        }
    }
}

/// Background execution with an inline fallback, or inline only.
pub enum ExecutionHost {
    Background {
        worker: BackgroundHost,
        fallback: InlineHost,
    },
    Inline(InlineHost),
}

impl ExecutionHost {
    /// Prefers a background worker; runs inline when the worker cannot start.
    pub fn new(orchestrator: Orchestrator, cache: Arc<AnalysisCache>, settings: &HostSettings) -> Self {
        let timeout = Duration::from_millis(settings.timeout_ms);
        let fallback = InlineHost::new(orchestrator.clone(), Arc::clone(&cache), timeout);
        match BackgroundHost::spawn(orchestrator, cache, timeout) {
            Ok(worker) => ExecutionHost::Background { worker, fallback },
            Err(err) => {
                log_warn!("falling back to inline analysis: {err}");
                ExecutionHost::Inline(fallback)
            }
        }
    }

    pub fn inline(orchestrator: Orchestrator, cache: Arc<AnalysisCache>, settings: &HostSettings) -> Self {
        ExecutionHost::Inline(InlineHost::new(
            orchestrator,
            cache,
            Duration::from_millis(settings.timeout_ms),
        ))
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            ExecutionHost::Background { .. } => "background",
            ExecutionHost::Inline(_) => "inline",
        }
    }

    pub fn cache(&self) -> &Arc<AnalysisCache> {
        match self {
            ExecutionHost::Background { worker, .. } => worker.cache(),
            ExecutionHost::Inline(host) => host.cache(),
        }
    }

    /// Run on the background worker and retry inline once when it times out
    /// or fails. The request still ends with exactly one terminal message.
    pub async fn run_with_inline_retry(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisResult, HostError> {
        match self {
            ExecutionHost::Background { worker, fallback } => {
                match worker.execute(request.clone(), false).await {
                    Err(err) if err.is_retryable() => {
                        log_warn!("background analysis failed ({err}); retrying inline");
                        fallback.run_analysis(request).await
                    }
                    Err(err) => {
                        MessageSink::new(request.id, request.messages).error(&err);
                        Err(err)
                    }
                    Ok(result) => Ok(result),
                }
            }
            ExecutionHost::Inline(host) => host.run_analysis(request).await,
        }
    }
}

impl AnalysisHost for ExecutionHost {
    async fn run_analysis(&self, request: AnalysisRequest) -> Result<AnalysisResult, HostError> {
        match self {
            ExecutionHost::Background { worker, .. } => worker.run_analysis(request).await,
            ExecutionHost::Inline(host) => host.run_analysis(request).await,
        }
    }

    fn is_idle(&self) -> bool {
        match self {
            ExecutionHost::Background { worker, fallback } => worker.is_idle() && fallback.is_idle(),
            ExecutionHost::Inline(host) => host.is_idle(),
        }
    }
}
