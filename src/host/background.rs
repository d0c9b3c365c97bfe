use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use tokio::runtime::{Builder, Runtime};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::cache::AnalysisCache;
use crate::engine::Orchestrator;
use crate::models::AnalysisResult;

use super::{serve, AnalysisHost, AnalysisRequest, HostError, InFlight};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "sensory_pulse::host";

use crate::{log_debug, log_error, log_info, log_warn};

type AnalysisJob = Box<dyn FnOnce(&Runtime) + Send + 'static>;

enum WorkerCommand {
    Execute(AnalysisJob),
    Shutdown,
}

struct WorkerInner {
    sender: mpsc::Sender<WorkerCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for WorkerInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(WorkerCommand::Shutdown) {
                log_error!("Failed to send shutdown to analysis worker: {err}");
            }
            if let Err(join_err) = handle.join() {
                log_error!("Failed to join analysis worker: {join_err:?}");
            }
        }
    }
}

fn build_runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Runs analyses one at a time on a dedicated thread with its own
/// current-thread runtime. Jobs are queued in submission order.
#[derive(Clone)]
pub struct BackgroundHost {
    inner: Arc<WorkerInner>,
    orchestrator: Orchestrator,
    cache: Arc<AnalysisCache>,
    timeout: Duration,
    in_flight: Arc<AtomicUsize>,
}

impl BackgroundHost {
    pub fn spawn(
        orchestrator: Orchestrator,
        cache: Arc<AnalysisCache>,
        timeout: Duration,
    ) -> Result<Self, HostError> {
        let (command_tx, command_rx) = mpsc::channel::<WorkerCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        let worker = thread::Builder::new()
            .name("sensory-pulse-analysis".into())
            .spawn(move || {
                let mut runtime = match build_runtime() {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        let _ = ready_tx.send(Err(format!("failed to build worker runtime: {err}")));
                        return;
                    }
                };
                if ready_tx.send(Ok(())).is_err() {
                    log_error!("Analysis worker receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        WorkerCommand::Execute(job) => {
                            if panic::catch_unwind(AssertUnwindSafe(|| job(&runtime))).is_err() {
                                log_error!("Analysis job panicked; rebuilding worker runtime");
                                runtime = match build_runtime() {
                                    Ok(fresh) => fresh,
                                    Err(err) => {
                                        log_error!("Failed to rebuild worker runtime: {err}");
                                        break;
                                    }
                                };
                            }
                        }
                        WorkerCommand::Shutdown => break,
                    }
                }

                log_info!("Analysis worker shutting down");
            })
            .map_err(|err| HostError::WorkerUnavailable(format!("failed to spawn worker thread: {err}")))?;

        ready_rx
            .recv()
            .map_err(|_| HostError::WorkerUnavailable("worker exited before signaling readiness".into()))?
            .map_err(HostError::WorkerUnavailable)?;

        log_debug!("Analysis worker started (timeout {} ms)", timeout.as_millis());

        Ok(Self {
            inner: Arc::new(WorkerInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            orchestrator,
            cache,
            timeout,
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn cache(&self) -> &Arc<AnalysisCache> {
        &self.cache
    }

    pub(crate) async fn execute(
        &self,
        request: AnalysisRequest,
        report_errors: bool,
    ) -> Result<AnalysisResult, HostError> {
        let _flight = InFlight::enter(&self.in_flight);
        serve(&self.cache, request, report_errors, |bundle, config, sink| async move {
            let cancel = CancellationToken::new();
            let job_cancel = cancel.clone();
            let orchestrator = self.orchestrator.clone();
            let (reply_tx, reply_rx) = oneshot::channel();

            let job: AnalysisJob = Box::new(move |runtime: &Runtime| {
                let outcome = runtime.block_on(async {
                    orchestrator
                        .analyze_with(&bundle, &config, &sink, &job_cancel)
                        .await
                });
                if reply_tx.send(outcome.map_err(HostError::from)).is_err() {
                    log_debug!("Caller dropped before receiving analysis result");
                }
            });

            self.inner
                .sender
                .send(WorkerCommand::Execute(job))
                .map_err(|err| HostError::WorkerUnavailable(format!("failed to queue analysis: {err}")))?;

            match tokio::time::timeout(self.timeout, reply_rx).await {
                Ok(Ok(reply)) => reply,
                Ok(Err(_)) => Err(HostError::WorkerFailed(
                    "analysis job terminated without a result".into(),
                )),
                Err(_) => {
                    cancel.cancel();
                    let after_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                    log_warn!("Analysis exceeded {after_ms} ms; cancelling job");
                    Err(HostError::Timeout { after_ms })
                }
            }
        })
        .await
    }
}

impl AnalysisHost for BackgroundHost {
    async fn run_analysis(&self, request: AnalysisRequest) -> Result<AnalysisResult, HostError> {
        self.execute(request, true).await
    }

    fn is_idle(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0
    }
}
