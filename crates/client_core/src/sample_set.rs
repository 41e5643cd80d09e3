//! Editable, ordered set of text samples and the provenance that governs it.

use std::{collections::HashMap, time::Duration};

use shared::domain::PresetId;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    debounce::DebounceTimer,
    error::{ValidationError, MAX_SAMPLES, MIN_SAMPLES},
    presets::Preset,
};

pub const MAX_SAMPLE_CHARS: usize = 100;
pub const DEFAULT_EDIT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Which origin currently governs the whole sample set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Preset(PresetId),
    Custom,
}

impl Provenance {
    pub fn active_preset(&self) -> Option<&PresetId> {
        match self {
            Provenance::Preset(id) => Some(id),
            Provenance::Custom => None,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Provenance::Custom)
    }
}

/// Stable identity of one input slot; survives removal of other slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSlot {
    pub id: SlotId,
    pub text: String,
}

impl SampleSlot {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSetSnapshot {
    pub slots: Vec<SampleSlot>,
    pub provenance: Provenance,
}

impl SampleSetSnapshot {
    pub fn texts(&self) -> Vec<String> {
        self.slots.iter().map(|slot| slot.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn counter_label(&self, index: usize) -> Option<String> {
        self.slots
            .get(index)
            .map(|slot| format!("{}/{MAX_SAMPLE_CHARS} characters", slot.char_count()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldCommit {
    slot: SlotId,
    generation: u64,
    text: String,
}

/// Latest draft scheduled for a slot. A delivered commit only applies if
/// its generation still matches.
#[derive(Debug)]
struct PendingEdit {
    generation: u64,
    text: String,
}

pub struct SampleSetController {
    slots: Vec<SampleSlot>,
    provenance: Provenance,
    next_slot: u64,
    edit_debounce: Duration,
    next_generation: u64,
    pending: HashMap<SlotId, PendingEdit>,
    timers: HashMap<SlotId, DebounceTimer<FieldCommit>>,
    commit_tx: mpsc::UnboundedSender<FieldCommit>,
    commit_rx: mpsc::UnboundedReceiver<FieldCommit>,
}

impl SampleSetController {
    pub fn new(edit_debounce: Duration) -> Self {
        let (commit_tx, commit_rx) = mpsc::unbounded_channel();
        let mut controller = Self {
            slots: Vec::new(),
            provenance: Provenance::Custom,
            next_slot: 0,
            edit_debounce,
            next_generation: 0,
            pending: HashMap::new(),
            timers: HashMap::new(),
            commit_tx,
            commit_rx,
        };
        controller.reset_slots(std::iter::empty::<String>());
        controller
    }

    pub fn snapshot(&self) -> SampleSetSnapshot {
        SampleSetSnapshot {
            slots: self.slots.clone(),
            provenance: self.provenance.clone(),
        }
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(|slot| slot.text.as_str())
    }

    /// Text currently shown in the field: the uncommitted draft if a commit
    /// is pending, otherwise the canonical value.
    pub fn draft(&self, index: usize) -> Option<&str> {
        let slot = self.slots.get(index)?;
        let pending = self.pending.get(&slot.id).map(|edit| edit.text.as_str());
        Some(pending.unwrap_or(slot.text.as_str()))
    }

    pub fn has_pending_edits(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Replaces the whole set with the preset's samples and marks it as
    /// preset-governed. Outstanding edits are cancelled.
    pub fn load_preset(&mut self, preset: &Preset) {
        self.cancel_all_edits();
        self.reset_slots(preset.texts.iter().cloned());
        self.provenance = Provenance::Preset(preset.id.clone());
    }

    /// Records a keystroke. The canonical text only changes once the field
    /// has been quiet for the debounce window.
    pub fn edit_sample(&mut self, index: usize, text: impl Into<String>) -> bool {
        let Some(slot_id) = self.slots.get(index).map(|slot| slot.id) else {
            return false;
        };
        self.next_generation += 1;
        let commit = FieldCommit {
            slot: slot_id,
            generation: self.next_generation,
            text: truncate_chars(text.into(), MAX_SAMPLE_CHARS),
        };
        self.pending.insert(
            slot_id,
            PendingEdit {
                generation: commit.generation,
                text: commit.text.clone(),
            },
        );
        let quiet_period = self.edit_debounce;
        let commit_tx = self.commit_tx.clone();
        self.timers
            .entry(slot_id)
            .or_insert_with(|| DebounceTimer::new(quiet_period, commit_tx))
            .schedule(commit);
        true
    }

    /// Applies every commit whose quiet period has already elapsed.
    pub fn apply_ready_commits(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(commit) = self.commit_rx.try_recv() {
            if self.is_current(&commit) && self.apply_commit(commit) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next debounced commit to fire and applies it. Returns
    /// the number of slots whose text changed (0 or 1). Never resolves while
    /// no edit is pending, so it can sit in a `select!` loop.
    pub async fn next_commit(&mut self) -> usize {
        loop {
            let Some(commit) = self.commit_rx.recv().await else {
                return 0;
            };
            if self.is_current(&commit) {
                return usize::from(self.apply_commit(commit));
            }
        }
    }

    /// Waits until no edit is pending, applying commits as they fire.
    pub async fn settle(&mut self) -> usize {
        let mut applied = self.apply_ready_commits();
        while !self.pending.is_empty() {
            let Some(commit) = self.commit_rx.recv().await else {
                break;
            };
            if self.is_current(&commit) && self.apply_commit(commit) {
                applied += 1;
            }
        }
        applied
    }

    /// Commits every pending draft immediately, skipping the rest of its
    /// quiet period.
    pub fn flush_pending_edits(&mut self) -> usize {
        let mut applied = self.apply_ready_commits();
        for (_, mut timer) in self.timers.drain() {
            timer.cancel();
        }
        let drafts: Vec<(SlotId, PendingEdit)> = self.pending.drain().collect();
        for (slot, edit) in drafts {
            let commit = FieldCommit {
                slot,
                generation: edit.generation,
                text: edit.text,
            };
            if self.apply_commit(commit) {
                applied += 1;
            }
        }
        applied
    }

    pub fn add_sample(&mut self) {
        let slot = self.new_slot(String::new());
        self.slots.push(slot);
        self.mark_custom();
    }

    /// Removes the slot at `index` unless that would leave fewer than the
    /// minimum number of slots.
    pub fn remove_sample(&mut self, index: usize) -> bool {
        if self.slots.len() <= MIN_SAMPLES || index >= self.slots.len() {
            return false;
        }
        let removed = self.slots.remove(index);
        self.pending.remove(&removed.id);
        if let Some(mut timer) = self.timers.remove(&removed.id) {
            timer.cancel();
        }
        self.mark_custom();
        true
    }

    pub fn clear(&mut self) {
        self.cancel_all_edits();
        self.reset_slots(std::iter::empty::<String>());
        self.provenance = Provenance::Custom;
    }

    /// Non-blank samples in display order, checked against the submission
    /// bounds.
    pub fn validated_texts(&self) -> Result<Vec<String>, ValidationError> {
        let texts: Vec<String> = self
            .slots
            .iter()
            .filter(|slot| !slot.is_blank())
            .map(|slot| slot.text.clone())
            .collect();
        if texts.len() < MIN_SAMPLES {
            return Err(ValidationError::NotEnoughSamples {
                required: MIN_SAMPLES,
                actual: texts.len(),
            });
        }
        if texts.len() > MAX_SAMPLES {
            return Err(ValidationError::TooManySamples {
                max: MAX_SAMPLES,
                actual: texts.len(),
            });
        }
        Ok(texts)
    }

    /// Consumes the pending entry when `commit` is the latest draft for its
    /// slot. Superseded or cancelled commits are rejected.
    fn is_current(&mut self, commit: &FieldCommit) -> bool {
        match self.pending.get(&commit.slot) {
            Some(edit) if edit.generation == commit.generation => {
                self.pending.remove(&commit.slot);
                true
            }
            _ => {
                debug!(generation = commit.generation, "dropping superseded edit");
                false
            }
        }
    }

    fn apply_commit(&mut self, commit: FieldCommit) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.id == commit.slot) else {
            debug!("dropping edit for a slot that no longer exists");
            return false;
        };
        if slot.text == commit.text {
            return false;
        }
        slot.text = commit.text;
        debug!(chars = slot.char_count(), "committed sample edit");
        self.mark_custom();
        true
    }

    fn mark_custom(&mut self) {
        if let Provenance::Preset(preset_id) = &self.provenance {
            debug!(%preset_id, "sample set diverged from preset");
            self.provenance = Provenance::Custom;
        }
    }

    fn cancel_all_edits(&mut self) {
        self.pending.clear();
        for (_, mut timer) in self.timers.drain() {
            timer.cancel();
        }
        while self.commit_rx.try_recv().is_ok() {}
    }

    fn reset_slots<I>(&mut self, texts: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut slots: Vec<SampleSlot> = texts
            .into_iter()
            .map(|text| self.new_slot(truncate_chars(text, MAX_SAMPLE_CHARS)))
            .collect();
        while slots.len() < MIN_SAMPLES {
            slots.push(self.new_slot(String::new()));
        }
        self.slots = slots;
    }

    fn new_slot(&mut self, text: String) -> SampleSlot {
        self.next_slot += 1;
        SampleSlot {
            id: SlotId(self.next_slot),
            text,
        }
    }
}

impl Default for SampleSetController {
    fn default() -> Self {
        Self::new(DEFAULT_EDIT_DEBOUNCE)
    }
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text,
    }
}

#[cfg(test)]
#[path = "tests/sample_set_tests.rs"]
mod tests;
