//! Bundled sample sets that can be explored without a network round trip.

use std::sync::Arc;

use serde::Deserialize;
use shared::{
    domain::PresetId, error::ResponseShapeError, protocol::VisualizationResponse,
};
use thiserror::Error;

const BUNDLED_PRESETS: [(&str, &str); 4] = [
    (
        "petsFinanceFruitsVehicles",
        include_str!("../presets/petsFinanceFruitsVehicles.json"),
    ),
    (
        "emotionsColorsShapes",
        include_str!("../presets/emotionsColorsShapes.json"),
    ),
    (
        "weatherEmotions",
        include_str!("../presets/weatherEmotions.json"),
    ),
    (
        "mixedSentences",
        include_str!("../presets/mixedSentences.json"),
    ),
];

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset bundle {name} is not valid JSON: {source}")]
    Decode {
        name: String,
        source: serde_json::Error,
    },
    #[error("preset {id} carries an invalid precomputed result: {source}")]
    InvalidResult {
        id: PresetId,
        source: ResponseShapeError,
    },
    #[error("preset {id} has no samples")]
    Empty { id: PresetId },
    #[error("duplicate preset id {id}")]
    Duplicate { id: PresetId },
}

/// On-disk shape of a preset bundle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetBundle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub texts: Vec<String>,
    #[serde(default)]
    pub visualization_data: Option<VisualizationResponse>,
}

#[derive(Debug, Clone)]
pub struct Preset {
    pub id: PresetId,
    pub display_name: String,
    pub texts: Vec<String>,
    pub precomputed: Option<Arc<VisualizationResponse>>,
}

impl Preset {
    pub fn has_precomputed_result(&self) -> bool {
        self.precomputed.is_some()
    }
}

impl TryFrom<PresetBundle> for Preset {
    type Error = PresetError;

    fn try_from(bundle: PresetBundle) -> Result<Self, Self::Error> {
        let id = PresetId(bundle.id);
        if let Some(result) = &bundle.visualization_data {
            result
                .validate()
                .map_err(|source| PresetError::InvalidResult {
                    id: id.clone(),
                    source,
                })?;
        }
        // Bundles without an explicit sample list fall back to the labels of
        // their precomputed result.
        let texts = if bundle.texts.is_empty() {
            bundle
                .visualization_data
                .as_ref()
                .map(VisualizationResponse::labels)
                .unwrap_or_default()
        } else {
            bundle.texts
        };
        if texts.is_empty() {
            return Err(PresetError::Empty { id });
        }
        Ok(Self {
            id,
            display_name: bundle.name,
            texts,
            precomputed: bundle.visualization_data.map(Arc::new),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
}

impl PresetCatalog {
    pub fn bundled() -> Result<Self, PresetError> {
        let bundles = BUNDLED_PRESETS
            .iter()
            .map(|(name, raw)| {
                serde_json::from_str::<PresetBundle>(raw).map_err(|source| PresetError::Decode {
                    name: (*name).to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_bundles(bundles)
    }

    pub fn from_bundles(bundles: Vec<PresetBundle>) -> Result<Self, PresetError> {
        let mut presets: Vec<Preset> = Vec::with_capacity(bundles.len());
        for bundle in bundles {
            let preset = Preset::try_from(bundle)?;
            if presets.iter().any(|existing| existing.id == preset.id) {
                return Err(PresetError::Duplicate { id: preset.id });
            }
            presets.push(preset);
        }
        Ok(Self { presets })
    }

    pub fn get(&self, id: &PresetId) -> Option<&Preset> {
        self.presets.iter().find(|preset| &preset.id == id)
    }

    pub fn first(&self) -> Option<&Preset> {
        self.presets.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/presets_tests.rs"]
mod tests;
