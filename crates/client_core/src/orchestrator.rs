//! Turns validated sample lists into visualization requests and tracks the
//! single request status of a session.
//!
//! Every submission takes the next value of a monotonic sequence counter.
//! A response is only published if its sequence number is still the latest
//! one issued when it arrives; anything older is dropped. Transport calls
//! are never aborted.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};
use shared::{
    domain::{PresetId, RequestSeq, ResultId},
    protocol::{VisualizationResponse, VisualizeRequest},
};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{error::VisualizeError, ResultSource, SessionEvent, VisualizationApi};

#[derive(Debug, Clone)]
pub struct PublishedResult {
    pub id: ResultId,
    pub source: ResultSource,
    pub response: Arc<VisualizationResponse>,
    pub received_at: DateTime<Utc>,
}

impl PublishedResult {
    pub fn len(&self) -> usize {
        self.response.len()
    }

    pub fn is_empty(&self) -> bool {
        self.response.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum RequestStatus {
    Idle,
    Loading { seq: RequestSeq },
    Error(VisualizeError),
    Ready(PublishedResult),
}

#[derive(Debug, Clone)]
pub struct RequestState {
    pub status: RequestStatus,
    /// Most recent published result. Stays visible while a newer request
    /// is loading or after it failed.
    pub displayed: Option<PublishedResult>,
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self.status, RequestStatus::Loading { .. })
    }

    pub fn error(&self) -> Option<&VisualizeError> {
        match &self.status {
            RequestStatus::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl Default for RequestState {
    fn default() -> Self {
        Self {
            status: RequestStatus::Idle,
            displayed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Published(ResultId),
    Failed(VisualizeError),
    Superseded(RequestSeq),
}

pub struct RequestOrchestrator {
    api: Arc<dyn VisualizationApi>,
    latest_seq: AtomicU64,
    next_result_id: AtomicU64,
    state: watch::Sender<RequestState>,
    events: broadcast::Sender<SessionEvent>,
}

impl RequestOrchestrator {
    pub fn new(api: Arc<dyn VisualizationApi>, events: broadcast::Sender<SessionEvent>) -> Arc<Self> {
        let (state, _) = watch::channel(RequestState::default());
        Arc::new(Self {
            api,
            latest_seq: AtomicU64::new(0),
            next_result_id: AtomicU64::new(0),
            state,
            events,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    pub fn latest_seq(&self) -> RequestSeq {
        RequestSeq(self.latest_seq.load(Ordering::SeqCst))
    }

    /// Starts a request in the background and returns immediately. The
    /// loading state is published before this returns.
    pub fn spawn_submit(self: &Arc<Self>, texts: Vec<String>) -> JoinHandle<SubmitOutcome> {
        let seq = self.begin(texts.len());
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.complete(seq, texts).await })
    }

    pub async fn submit(&self, texts: Vec<String>) -> SubmitOutcome {
        let seq = self.begin(texts.len());
        self.complete(seq, texts).await
    }

    /// Publishes a result that needs no network call. Supersedes any
    /// request still in flight.
    pub fn publish_precomputed(
        &self,
        preset_id: PresetId,
        response: Arc<VisualizationResponse>,
    ) -> ResultId {
        self.next_seq();
        let published = self.make_result(ResultSource::Preset(preset_id), response);
        let result_id = published.id;
        let source = published.source.clone();
        self.state.send_modify(|state| {
            state.status = RequestStatus::Ready(published.clone());
            state.displayed = Some(published);
        });
        info!(result_id = result_id.0, "published precomputed result");
        let _ = self
            .events
            .send(SessionEvent::ResultPublished { result_id, source });
        result_id
    }

    /// Invalidates any request still in flight and drops a loading or error
    /// status back to idle. The displayed result is kept.
    pub fn supersede(&self) -> RequestSeq {
        let seq = self.next_seq();
        let changed = self.state.send_if_modified(|state| {
            if matches!(
                state.status,
                RequestStatus::Loading { .. } | RequestStatus::Error(_)
            ) {
                state.status = RequestStatus::Idle;
                true
            } else {
                false
            }
        });
        if changed {
            info!(seq = seq.0, "superseded pending request");
        }
        seq
    }

    fn next_seq(&self) -> RequestSeq {
        RequestSeq(self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn begin(&self, sample_count: usize) -> RequestSeq {
        let seq = self.next_seq();
        self.state.send_modify(|state| {
            state.status = RequestStatus::Loading { seq };
        });
        info!(seq = seq.0, sample_count, "visualization request started");
        let _ = self.events.send(SessionEvent::RequestStarted { seq, sample_count });
        seq
    }

    async fn complete(&self, seq: RequestSeq, texts: Vec<String>) -> SubmitOutcome {
        let request = VisualizeRequest::from_texts(texts);
        let outcome = self.api.visualize(&request).await;

        let mut resolved = None;
        let accepted = self.state.send_if_modified(|state| {
            // Checked under the watch lock so a concurrent `begin` cannot
            // slip between the comparison and the write.
            if self.latest_seq.load(Ordering::SeqCst) != seq.0 {
                return false;
            }
            match outcome {
                Ok(response) => {
                    let result = self.make_result(ResultSource::Request(seq), Arc::new(response));
                    state.status = RequestStatus::Ready(result.clone());
                    state.displayed = Some(result.clone());
                    resolved = Some(Ok(result));
                }
                Err(err) => {
                    state.status = RequestStatus::Error(err.clone());
                    resolved = Some(Err(err));
                }
            }
            true
        });

        match resolved {
            Some(Ok(result)) if accepted => {
                info!(
                    seq = seq.0,
                    result_id = result.id.0,
                    items = result.len(),
                    "visualization result published"
                );
                let _ = self.events.send(SessionEvent::ResultPublished {
                    result_id: result.id,
                    source: result.source,
                });
                SubmitOutcome::Published(result.id)
            }
            Some(Err(error)) if accepted => {
                warn!(seq = seq.0, %error, "visualization request failed");
                let _ = self.events.send(SessionEvent::RequestFailed {
                    seq,
                    error: error.clone(),
                });
                SubmitOutcome::Failed(error)
            }
            _ => {
                warn!(seq = seq.0, "discarding response for superseded request");
                let _ = self.events.send(SessionEvent::ResponseDiscarded { seq });
                SubmitOutcome::Superseded(seq)
            }
        }
    }

    fn make_result(
        &self,
        source: ResultSource,
        response: Arc<VisualizationResponse>,
    ) -> PublishedResult {
        PublishedResult {
            id: ResultId(self.next_result_id.fetch_add(1, Ordering::SeqCst) + 1),
            source,
            response,
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
