//! Rescales reduced coordinates of arbitrary magnitude into a fixed range so
//! every algorithm renders at a comparable, stable size.
//!
//! [`normalize`] is pure: the same items and algorithm always produce a
//! bit-identical [`NormalizedBatch`], which is what lets
//! [`NormalizationCache`] memoize by result identity.

use std::{collections::HashMap, sync::Arc};

use shared::{
    domain::{Algorithm, ResultId},
    protocol::{Coordinates2D, Coordinates3D, ItemResult},
};

/// Value assigned on an axis where every raw value is identical.
pub const DEGENERATE_AXIS_VALUE: f64 = 0.5;
/// Half-width of the symmetric range used by the 3D scene.
pub const SCENE_EXTENT: f64 = 2.0;
/// Padding applied on each side of the 2D chart's data domain.
pub const CHART_DOMAIN_PADDING: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |range, value| match range {
            None => Some(Self {
                min: value,
                max: value,
            }),
            Some(Self { min, max }) => Some(Self {
                min: min.min(value),
                max: max.max(value),
            }),
        })
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return DEGENERATE_AXIS_VALUE;
        }
        (value - self.min) / (self.max - self.min)
    }

    pub fn padded(&self, padding: f64) -> Self {
        Self {
            min: self.min - padding,
            max: self.max + padding,
        }
    }
}

/// Maps a unit-range value into `[-SCENE_EXTENT, SCENE_EXTENT]`.
pub fn to_scene_range(unit: f64) -> f64 {
    unit * (2.0 * SCENE_EXTENT) - SCENE_EXTENT
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPoint {
    /// Position of the item in the response, which is also its submission order.
    pub index: usize,
    pub label: String,
    pub raw_2d: Coordinates2D,
    pub raw_3d: Coordinates3D,
    pub normalized_2d: Coordinates2D,
    pub normalized_3d: Coordinates3D,
    pub scene_3d: Coordinates3D,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    pub algorithm: Algorithm,
    pub points: Vec<NormalizedPoint>,
    pub ranges_2d: Option<[AxisRange; 2]>,
    pub ranges_3d: Option<[AxisRange; 3]>,
}

impl NormalizedBatch {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<&NormalizedPoint> {
        self.points.iter().find(|point| point.index == index)
    }

    /// Chart axis domains over the normalized data, padded so edge points
    /// are not drawn on the frame.
    pub fn chart_domain(&self) -> Option<(AxisRange, AxisRange)> {
        let x = AxisRange::from_values(self.points.iter().map(|p| p.normalized_2d.x))?;
        let y = AxisRange::from_values(self.points.iter().map(|p| p.normalized_2d.y))?;
        Some((
            x.padded(CHART_DOMAIN_PADDING),
            y.padded(CHART_DOMAIN_PADDING),
        ))
    }
}

/// Normalizes the 2D and 3D coordinates of `algorithm` independently per
/// axis. Items without a reduction for `algorithm` are skipped but keep
/// their original index.
pub fn normalize(items: &[ItemResult], algorithm: Algorithm) -> NormalizedBatch {
    let reduced: Vec<(usize, &ItemResult, Coordinates2D, Coordinates3D)> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            item.reduction(algorithm)
                .map(|reduction| (index, item, reduction.coordinates_2d, reduction.coordinates_3d))
        })
        .collect();

    let ranges_2d = AxisRange::from_values(reduced.iter().map(|(_, _, c, _)| c.x)).zip(
        AxisRange::from_values(reduced.iter().map(|(_, _, c, _)| c.y)),
    );
    let ranges_3d = AxisRange::from_values(reduced.iter().map(|(_, _, _, c)| c.x))
        .zip(AxisRange::from_values(reduced.iter().map(|(_, _, _, c)| c.y)))
        .zip(AxisRange::from_values(reduced.iter().map(|(_, _, _, c)| c.z)));

    let (Some((x2, y2)), Some(((x3, y3), z3))) = (ranges_2d, ranges_3d) else {
        return NormalizedBatch {
            algorithm,
            points: Vec::new(),
            ranges_2d: None,
            ranges_3d: None,
        };
    };

    let points = reduced
        .into_iter()
        .map(|(index, item, raw_2d, raw_3d)| {
            let normalized_3d = Coordinates3D {
                x: x3.normalize(raw_3d.x),
                y: y3.normalize(raw_3d.y),
                z: z3.normalize(raw_3d.z),
            };
            NormalizedPoint {
                index,
                label: item.label.clone(),
                raw_2d,
                raw_3d,
                normalized_2d: Coordinates2D {
                    x: x2.normalize(raw_2d.x),
                    y: y2.normalize(raw_2d.y),
                },
                normalized_3d,
                scene_3d: Coordinates3D {
                    x: to_scene_range(normalized_3d.x),
                    y: to_scene_range(normalized_3d.y),
                    z: to_scene_range(normalized_3d.z),
                },
            }
        })
        .collect();

    NormalizedBatch {
        algorithm,
        points,
        ranges_2d: Some([x2, y2]),
        ranges_3d: Some([x3, y3, z3]),
    }
}

/// Memoizes batches for the currently displayed result.
#[derive(Debug, Default)]
pub struct NormalizationCache {
    result_id: Option<ResultId>,
    batches: HashMap<Algorithm, Arc<NormalizedBatch>>,
}

impl NormalizationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &mut self,
        result_id: ResultId,
        items: &[ItemResult],
        algorithm: Algorithm,
    ) -> Arc<NormalizedBatch> {
        if self.result_id != Some(result_id) {
            self.batches.clear();
            self.result_id = Some(result_id);
        }
        Arc::clone(
            self.batches
                .entry(algorithm)
                .or_insert_with(|| Arc::new(normalize(items, algorithm))),
        )
    }

    pub fn cached_algorithms(&self) -> usize {
        self.batches.len()
    }

    pub fn invalidate(&mut self) {
        self.result_id = None;
        self.batches.clear();
    }
}

#[cfg(test)]
#[path = "tests/normalization_tests.rs"]
mod tests;
