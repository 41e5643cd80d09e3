//! Raw embedding list: one row per item with an expandable vector preview.

use shared::domain::ResultId;

use crate::{
    orchestrator::PublishedResult,
    view_state::{ViewHandle, ViewKind, ViewStateHub},
};

pub const DIMENSION_PAGE: usize = 10;
pub const LABEL_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRow {
    pub index: usize,
    pub label: String,
    pub dimensions: usize,
    pub highlighted: bool,
    pub expanded: bool,
    /// Leading vector components, only filled for the expanded row.
    pub values: Vec<f64>,
}

pub struct EmbeddingListView {
    handle: ViewHandle,
    expanded: Option<usize>,
    display_count: usize,
    result_id: Option<ResultId>,
}

impl EmbeddingListView {
    pub fn new(hub: &ViewStateHub) -> Self {
        Self {
            handle: hub.subscribe(ViewKind::EmbeddingList),
            expanded: None,
            display_count: DIMENSION_PAGE,
            result_id: None,
        }
    }

    pub fn handle(&self) -> &ViewHandle {
        &self.handle
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn display_count(&self) -> usize {
        self.display_count
    }

    pub fn toggle_expand(&mut self, index: usize) {
        self.expanded = match self.expanded {
            Some(current) if current == index => None,
            _ => Some(index),
        };
    }

    pub fn show_more(&mut self, dimensions: usize) {
        self.display_count = (self.display_count + DIMENSION_PAGE).min(dimensions);
    }

    pub fn show_less(&mut self) {
        self.display_count = self
            .display_count
            .saturating_sub(DIMENSION_PAGE)
            .max(DIMENSION_PAGE);
    }

    pub fn rows(&mut self, result: &PublishedResult) -> Vec<EmbeddingRow> {
        if self.result_id != Some(result.id) {
            self.result_id = Some(result.id);
            self.expanded = None;
        }
        let state = self.handle.state();
        result
            .response
            .results
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let expanded = self.expanded == Some(index);
                EmbeddingRow {
                    index,
                    label: preview_label(&item.label),
                    dimensions: item.embedding.len(),
                    highlighted: state.is_hovered(index),
                    expanded,
                    values: if expanded {
                        item.embedding
                            .iter()
                            .take(self.display_count)
                            .copied()
                            .collect()
                    } else {
                        Vec::new()
                    },
                }
            })
            .collect()
    }
}

fn preview_label(label: &str) -> String {
    match label.char_indices().nth(LABEL_PREVIEW_CHARS) {
        Some((byte_index, _)) => format!("{}...", &label[..byte_index]),
        None => label.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/list_view_tests.rs"]
mod tests;
