use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::AnalyticsConfiguration;
use crate::models::DataBundle;

use super::{AnalysisHost, AnalysisRequest};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "sensory_pulse::warmer";

use crate::{log_debug, log_info, log_warn};

/// Precomputes the recent, default and long-term windows while the host has
/// nothing else to do.
pub struct CacheWarmer {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Default for CacheWarmer {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheWarmer {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// `poll_every` is how often an idle check is made.
    pub fn start<H>(
        &mut self,
        host: Arc<H>,
        bundle: DataBundle,
        config: AnalyticsConfiguration,
        poll_every: Duration,
    ) -> Result<()>
    where
        H: AnalysisHost + Send + Sync + 'static,
    {
        if self.is_running() {
            bail!("cache warmer already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(warm_loop(host, bundle, config, poll_every, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("cache warmer task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

async fn warm_loop<H>(
    host: Arc<H>,
    bundle: DataBundle,
    config: AnalyticsConfiguration,
    poll_every: Duration,
    cancel_token: CancellationToken,
) where
    H: AnalysisHost + Send + Sync + 'static,
{
    let mut pending: VecDeque<u32> = config.time_windows.all().into_iter().collect();
    let mut ticker = tokio::time::interval(poll_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while let Some(days) = pending.front().copied() {
        tokio::select! {
            _ = ticker.tick() => {
                if !host.is_idle() {
                    log_debug!("host busy; deferring {days}-day window");
                    continue;
                }

                let request = AnalysisRequest::new(bundle.clone()).with_config(config.with_lookback(days));
                tokio::select! {
                    outcome = host.run_analysis(request) => {
                        match outcome {
                            Ok(_) => log_debug!("warmed {days}-day window"),
                            Err(err) => log_warn!("warming {days}-day window failed: {err}"),
                        }
                        pending.pop_front();
                    }
                    _ = cancel_token.cancelled() => break,
                }
            }
            _ = cancel_token.cancelled() => break,
        }
    }

    log_info!("cache warmer finished ({} windows left)", pending.len());
}
