//! The one visualization session of an interactive run.
//!
//! The session owns the sample set and the request orchestrator. Sample
//! state and request state are published on separate watch channels, each
//! with a single writer; [`SessionWatch`] joins them for readers.

use std::{sync::Arc, time::Duration};

use shared::domain::PresetId;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{
    error::ValidationError,
    orchestrator::{PublishedResult, RequestOrchestrator, RequestState, SubmitOutcome},
    presets::PresetCatalog,
    sample_set::{Provenance, SampleSetController, SampleSetSnapshot, DEFAULT_EDIT_DEBOUNCE},
    SessionEvent, VisualizationApi,
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub samples: SampleSetSnapshot,
    pub request: RequestState,
}

impl SessionSnapshot {
    pub fn provenance(&self) -> &Provenance {
        &self.samples.provenance
    }

    pub fn displayed(&self) -> Option<&PublishedResult> {
        self.request.displayed.as_ref()
    }
}

pub struct SessionWatch {
    samples: watch::Receiver<SampleSetSnapshot>,
    request: watch::Receiver<RequestState>,
}

impl SessionWatch {
    pub fn current(&self) -> SessionSnapshot {
        SessionSnapshot {
            samples: self.samples.borrow().clone(),
            request: self.request.borrow().clone(),
        }
    }

    /// Waits for either half of the session to change. Returns `None` once
    /// the session has been dropped.
    pub async fn changed(&mut self) -> Option<SessionSnapshot> {
        tokio::select! {
            changed = self.samples.changed() => changed.ok()?,
            changed = self.request.changed() => changed.ok()?,
        }
        Some(SessionSnapshot {
            samples: self.samples.borrow_and_update().clone(),
            request: self.request.borrow_and_update().clone(),
        })
    }
}

pub struct VisualizationSession {
    catalog: Arc<PresetCatalog>,
    samples: SampleSetController,
    orchestrator: Arc<RequestOrchestrator>,
    samples_tx: watch::Sender<SampleSetSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl VisualizationSession {
    pub fn new(
        catalog: Arc<PresetCatalog>,
        api: Arc<dyn VisualizationApi>,
        edit_debounce: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let samples = SampleSetController::new(edit_debounce);
        let (samples_tx, _) = watch::channel(samples.snapshot());
        Self {
            catalog,
            samples,
            orchestrator: RequestOrchestrator::new(api, events.clone()),
            samples_tx,
            events,
        }
    }

    /// Creates the session and loads the first bundled preset, if any.
    pub fn start(catalog: Arc<PresetCatalog>, api: Arc<dyn VisualizationApi>) -> Self {
        let mut session = Self::new(catalog, api, DEFAULT_EDIT_DEBOUNCE);
        if let Some(first) = session.catalog.first().map(|preset| preset.id.clone()) {
            session.select_preset(&first);
        }
        session
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    pub fn orchestrator(&self) -> &Arc<RequestOrchestrator> {
        &self.orchestrator
    }

    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            samples: self.samples_tx.subscribe(),
            request: self.orchestrator.subscribe(),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            samples: self.samples.snapshot(),
            request: self.orchestrator.state(),
        }
    }

    pub fn draft(&self, index: usize) -> Option<&str> {
        self.samples.draft(index)
    }

    /// Loads a preset's samples. A bundled result is shown immediately
    /// without a request; unknown ids are ignored.
    pub fn select_preset(&mut self, id: &PresetId) -> bool {
        let Some(preset) = self.catalog.get(id) else {
            warn!(preset_id = %id, "ignoring unknown preset");
            return false;
        };
        self.samples.load_preset(preset);
        self.publish_samples();
        info!(preset_id = %id, samples = preset.texts.len(), "preset selected");
        let _ = self.events.send(SessionEvent::PresetSelected(id.clone()));
        match &preset.precomputed {
            Some(result) => {
                self.orchestrator
                    .publish_precomputed(preset.id.clone(), Arc::clone(result));
            }
            None => {
                self.orchestrator.supersede();
            }
        }
        true
    }

    pub fn edit_sample(&mut self, index: usize, text: impl Into<String>) -> bool {
        self.samples.edit_sample(index, text)
    }

    pub fn apply_ready_edits(&mut self) -> usize {
        let applied = self.samples.apply_ready_commits();
        if applied > 0 {
            self.publish_samples();
        }
        applied
    }

    /// Waits for the next debounced edit to commit and publishes it. Pends
    /// while nothing is being edited.
    pub async fn next_commit(&mut self) -> usize {
        let applied = self.samples.next_commit().await;
        if applied > 0 {
            self.publish_samples();
        }
        applied
    }

    /// Waits for every pending edit to pass its quiet period and commit.
    pub async fn settle_edits(&mut self) -> usize {
        let applied = self.samples.settle().await;
        if applied > 0 {
            self.publish_samples();
        }
        applied
    }

    pub fn add_sample(&mut self) {
        self.samples.add_sample();
        self.publish_samples();
    }

    pub fn remove_sample(&mut self, index: usize) -> bool {
        let removed = self.samples.remove_sample(index);
        if removed {
            self.publish_samples();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.publish_samples();
    }

    /// Validates the current samples and starts a request in the
    /// background. Pending drafts are committed first so the payload
    /// matches what is on screen.
    pub fn submit(&mut self) -> Result<JoinHandle<SubmitOutcome>, ValidationError> {
        if self.samples.flush_pending_edits() > 0 {
            self.publish_samples();
        }
        let texts = match self.samples.validated_texts() {
            Ok(texts) => texts,
            Err(err) => {
                warn!(%err, "submission rejected before sending");
                let _ = self.events.send(SessionEvent::ValidationFailed(err.clone()));
                return Err(err);
            }
        };
        Ok(self.orchestrator.spawn_submit(texts))
    }

    fn publish_samples(&self) {
        self.samples_tx.send_replace(self.samples.snapshot());
        let _ = self.events.send(SessionEvent::SamplesChanged);
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
