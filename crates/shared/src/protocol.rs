use serde::{Deserialize, Serialize};

use crate::{domain::Algorithm, error::ResponseShapeError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInput {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizeRequest {
    pub texts: Vec<TextInput>,
}

impl VisualizeRequest {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts
                .into_iter()
                .map(|text| TextInput { text: text.into() })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates2D {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reduction {
    pub algorithm: Algorithm,
    pub coordinates_2d: Coordinates2D,
    pub coordinates_3d: Coordinates3D,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub label: String,
    pub embedding: Vec<f64>,
    pub reductions: Vec<Reduction>,
}

impl ItemResult {
    pub fn reduction(&self, algorithm: Algorithm) -> Option<&Reduction> {
        self.reductions
            .iter()
            .find(|reduction| reduction.algorithm == algorithm)
    }
}

/// Success body of `POST /visualize`; bundled preset results use the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationResponse {
    pub results: Vec<ItemResult>,
}

impl VisualizationResponse {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn embedding_dimensions(&self) -> Option<usize> {
        self.results.first().map(|item| item.embedding.len())
    }

    pub fn labels(&self) -> Vec<String> {
        self.results.iter().map(|item| item.label.clone()).collect()
    }

    /// Checks the per-response invariants: exactly one reduction per
    /// algorithm on every item and a shared embedding length.
    pub fn validate(&self) -> Result<(), ResponseShapeError> {
        let expected_dimensions = self.embedding_dimensions();
        for (index, item) in self.results.iter().enumerate() {
            if Some(item.embedding.len()) != expected_dimensions {
                return Err(ResponseShapeError::EmbeddingLengthMismatch {
                    index,
                    expected: expected_dimensions.unwrap_or_default(),
                    actual: item.embedding.len(),
                });
            }
            for algorithm in Algorithm::ALL {
                let count = item
                    .reductions
                    .iter()
                    .filter(|reduction| reduction.algorithm == algorithm)
                    .count();
                if count != 1 {
                    return Err(ResponseShapeError::ReductionCount {
                        index,
                        algorithm,
                        count,
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
