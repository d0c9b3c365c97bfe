use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::engine::{Stage, StageObserver};
use crate::models::AnalysisResult;

use super::HostError;

/// Envelope streamed to the caller while a request runs. Exactly one
/// `complete` or `error` closes each request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostMessage {
    #[serde(rename_all = "camelCase")]
    Progress {
        request_id: Uuid,
        stage: String,
        percent: u8,
    },
    #[serde(rename_all = "camelCase")]
    Partial {
        request_id: Uuid,
        result: AnalysisResult,
    },
    #[serde(rename_all = "camelCase")]
    Complete {
        request_id: Uuid,
        result: AnalysisResult,
        from_cache: bool,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        request_id: Uuid,
        message: String,
        timed_out: bool,
    },
}

impl HostMessage {
    pub fn request_id(&self) -> Uuid {
        match self {
            HostMessage::Progress { request_id, .. }
            | HostMessage::Partial { request_id, .. }
            | HostMessage::Complete { request_id, .. }
            | HostMessage::Error { request_id, .. } => *request_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, HostMessage::Complete { .. } | HostMessage::Error { .. })
    }
}

/// Forwards stage events for one request. A closed or absent receiver is
/// ignored. Clones share one sender; the terminal message or `close` takes
/// it, so a job still running after its request ended stays silent.
#[derive(Debug, Clone)]
pub struct MessageSink {
    request_id: Uuid,
    tx: Arc<Mutex<Option<UnboundedSender<HostMessage>>>>,
}

impl MessageSink {
    pub fn new(request_id: Uuid, tx: Option<UnboundedSender<HostMessage>>) -> Self {
        Self {
            request_id,
            tx: Arc::new(Mutex::new(tx)),
        }
    }

    fn sender(&self) -> MutexGuard<'_, Option<UnboundedSender<HostMessage>>> {
        match self.tx.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn send(&self, message: HostMessage) {
        if let Some(tx) = self.sender().as_ref() {
            let _ = tx.send(message);
        }
    }

    /// Send `message` as the last one this sink will ever deliver.
    fn finish(&self, message: HostMessage) {
        if let Some(tx) = self.sender().take() {
            let _ = tx.send(message);
        }
    }

    /// Stop forwarding without a terminal message.
    pub fn close(&self) {
        self.sender().take();
    }

    pub fn is_closed(&self) -> bool {
        self.sender().is_none()
    }

    pub fn complete(&self, result: &AnalysisResult, from_cache: bool) {
        self.finish(HostMessage::Complete {
            request_id: self.request_id,
            result: result.clone(),
            from_cache,
        });
    }

    pub fn error(&self, err: &HostError) {
        self.finish(HostMessage::Error {
            request_id: self.request_id,
            message: err.to_string(),
            timed_out: matches!(err, HostError::Timeout { .. }),
        });
    }
}

impl StageObserver for MessageSink {
    fn on_progress(&self, stage: Stage, percent: u8) {
        self.send(HostMessage::Progress {
            request_id: self.request_id,
            stage: stage.as_str().to_string(),
            percent,
        });
    }

    fn on_partial(&self, partial: &AnalysisResult) {
        self.send(HostMessage::Partial {
            request_id: self.request_id,
            result: partial.clone(),
        });
    }
}
