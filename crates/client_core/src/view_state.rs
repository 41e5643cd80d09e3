//! Hover and display-option state shared by every view of one result.
//!
//! [`ViewStateHub`] is a watch-backed observable: whichever view receives a
//! pointer event writes through its [`ViewHandle`], and every other handle
//! observes the new value on its next read without any extra plumbing.

use std::sync::Arc;

use shared::{
    domain::{Algorithm, Dimension, ResultId},
    protocol::{Coordinates2D, Coordinates3D},
};
use tokio::sync::watch;
use tracing::debug;

use crate::{
    normalization::{NormalizationCache, NormalizedBatch},
    orchestrator::PublishedResult,
};

pub const POINT_RADIUS: f64 = 0.1;
pub const HOVERED_POINT_RADIUS: f64 = 0.15;

/// Which tab pair is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveView {
    pub dimension: Dimension,
    pub algorithm: Algorithm,
}

impl Default for ActiveView {
    fn default() -> Self {
        Self {
            dimension: Dimension::TwoD,
            algorithm: Algorithm::Pca,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub hovered_index: Option<usize>,
    pub labels_visible: bool,
    pub camera_locked: bool,
    pub active: ActiveView,
    /// Number of points in the bound result; hover indices beyond it are
    /// rejected.
    pub point_count: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            hovered_index: None,
            labels_visible: true,
            camera_locked: false,
            active: ActiveView::default(),
            point_count: 0,
        }
    }
}

impl ViewState {
    pub fn is_hovered(&self, index: usize) -> bool {
        self.hovered_index == Some(index)
    }

    /// A hovered point always shows its label; others follow the toggle.
    pub fn shows_label(&self, index: usize) -> bool {
        self.labels_visible || self.is_hovered(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Chart2d,
    Scene3d,
    EmbeddingList,
}

#[derive(Clone)]
pub struct ViewStateHub {
    tx: Arc<watch::Sender<ViewState>>,
}

impl Default for ViewStateHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStateHub {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ViewState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> ViewState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self, kind: ViewKind) -> ViewHandle {
        ViewHandle {
            kind,
            hub: self.clone(),
            rx: self.tx.subscribe(),
        }
    }

    /// Idempotent: writing the current value notifies nobody. Indices
    /// outside the bound point set are ignored.
    pub fn set_hover(&self, index: Option<usize>) -> bool {
        self.tx.send_if_modified(|state| {
            if let Some(index) = index {
                if index >= state.point_count {
                    return false;
                }
            }
            if state.hovered_index == index {
                return false;
            }
            state.hovered_index = index;
            debug!(hovered = ?index, "hover changed");
            true
        })
    }

    pub fn toggle_labels(&self) -> bool {
        let mut visible = false;
        self.tx.send_modify(|state| {
            state.labels_visible = !state.labels_visible;
            visible = state.labels_visible;
        });
        visible
    }

    pub fn toggle_camera_lock(&self) -> bool {
        let mut locked = false;
        self.tx.send_modify(|state| {
            state.camera_locked = !state.camera_locked;
            locked = state.camera_locked;
        });
        locked
    }

    pub fn select_dimension(&self, dimension: Dimension) -> bool {
        self.select_view(ActiveView {
            dimension,
            ..self.current().active
        })
    }

    pub fn select_algorithm(&self, algorithm: Algorithm) -> bool {
        self.select_view(ActiveView {
            algorithm,
            ..self.current().active
        })
    }

    /// Switching tabs keeps the display toggles but clears hover, since the
    /// new tab shows a different point set.
    pub fn select_view(&self, active: ActiveView) -> bool {
        self.tx.send_if_modified(|state| {
            if state.active == active {
                return false;
            }
            state.active = active;
            state.hovered_index = None;
            true
        })
    }

    /// Rebinds the hub to a newly displayed result.
    pub fn bind_points(&self, point_count: usize) {
        self.tx.send_modify(|state| {
            state.point_count = point_count;
            state.hovered_index = None;
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointPosition {
    Planar(Coordinates2D),
    Spatial(Coordinates3D),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPoint {
    pub index: usize,
    pub label: String,
    pub position: PointPosition,
    pub highlighted: bool,
    pub show_label: bool,
    pub radius: f64,
}

/// One rendered view's connection to the hub.
pub struct ViewHandle {
    kind: ViewKind,
    hub: ViewStateHub,
    rx: watch::Receiver<ViewState>,
}

impl ViewHandle {
    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn state(&self) -> ViewState {
        *self.rx.borrow()
    }

    pub fn hover(&self, index: Option<usize>) -> bool {
        self.hub.set_hover(index)
    }

    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Marks the current value as seen and returns it.
    pub fn refresh(&mut self) -> ViewState {
        *self.rx.borrow_and_update()
    }

    pub async fn changed(&mut self) -> Option<ViewState> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// The list view is always on screen; the chart and the scene follow
    /// the dimension tab.
    pub fn is_active(&self) -> bool {
        let dimension = self.state().active.dimension;
        match self.kind {
            ViewKind::Chart2d => dimension == Dimension::TwoD,
            ViewKind::Scene3d => dimension == Dimension::ThreeD,
            ViewKind::EmbeddingList => true,
        }
    }

    /// Only the 3D scene has rotation input, and the camera lock only
    /// applies there.
    pub fn accepts_rotation_drag(&self) -> bool {
        match self.kind {
            ViewKind::Scene3d => !self.state().camera_locked,
            ViewKind::Chart2d | ViewKind::EmbeddingList => false,
        }
    }

    pub fn render(&self, batch: &NormalizedBatch) -> Vec<RenderedPoint> {
        let state = self.state();
        batch
            .points
            .iter()
            .map(|point| {
                let highlighted = state.is_hovered(point.index);
                let position = match self.kind {
                    ViewKind::Scene3d => PointPosition::Spatial(point.scene_3d),
                    ViewKind::Chart2d | ViewKind::EmbeddingList => {
                        PointPosition::Planar(point.normalized_2d)
                    }
                };
                let show_label = match self.kind {
                    ViewKind::EmbeddingList => true,
                    ViewKind::Chart2d | ViewKind::Scene3d => state.shows_label(point.index),
                };
                RenderedPoint {
                    index: point.index,
                    label: point.label.clone(),
                    position,
                    highlighted,
                    show_label,
                    radius: if highlighted {
                        HOVERED_POINT_RADIUS
                    } else {
                        POINT_RADIUS
                    },
                }
            })
            .collect()
    }
}

/// Ties the hub to the displayed result and the memoized batches for it.
pub struct InteractiveView {
    hub: ViewStateHub,
    cache: NormalizationCache,
    bound: Option<ResultId>,
}

impl Default for InteractiveView {
    fn default() -> Self {
        Self::new(ViewStateHub::new())
    }
}

impl InteractiveView {
    pub fn new(hub: ViewStateHub) -> Self {
        Self {
            hub,
            cache: NormalizationCache::new(),
            bound: None,
        }
    }

    pub fn hub(&self) -> &ViewStateHub {
        &self.hub
    }

    pub fn bound_result(&self) -> Option<ResultId> {
        self.bound
    }

    /// Normalized batch for the active algorithm of `displayed`. A change of
    /// result rebinds the hub, which clears any stale hover.
    pub fn batch_for(&mut self, displayed: Option<&PublishedResult>) -> Option<Arc<NormalizedBatch>> {
        let Some(result) = displayed else {
            if self.bound.take().is_some() {
                self.cache.invalidate();
                self.hub.bind_points(0);
            }
            return None;
        };
        if self.bound != Some(result.id) {
            self.bound = Some(result.id);
            self.hub.bind_points(result.len());
        }
        let algorithm = self.hub.current().active.algorithm;
        Some(
            self.cache
                .get_or_compute(result.id, &result.response.results, algorithm),
        )
    }
}

#[cfg(test)]
#[path = "tests/view_state_tests.rs"]
mod tests;
