use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(ResultId);
id_newtype!(RequestSeq);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetId(pub String);

impl PresetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dimensionality reduction technique applied by the visualization endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Pca,
    Tsne,
    Umap,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Pca, Algorithm::Tsne, Algorithm::Umap];

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Pca => "pca",
            Algorithm::Tsne => "tsne",
            Algorithm::Umap => "umap",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Algorithm::Pca => "Principal Component Analysis (PCA)",
            Algorithm::Tsne => "t-SNE",
            Algorithm::Umap => "UMAP",
        }
    }

    pub fn description(self, dimension: Dimension) -> Option<&'static str> {
        match (dimension, self) {
            (Dimension::TwoD, _) => None,
            (Dimension::ThreeD, Algorithm::Pca) => Some(
                "PCA in 3D shows the three principal directions of variance in the data.",
            ),
            (Dimension::ThreeD, Algorithm::Tsne) => Some(
                "t-SNE in 3D creates clusters that preserve local similarities between points.",
            ),
            (Dimension::ThreeD, Algorithm::Umap) => Some(
                "UMAP in 3D balances preserving both local and global structure of the data.",
            ),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dimension {
    #[default]
    #[serde(rename = "2d")]
    TwoD,
    #[serde(rename = "3d")]
    ThreeD,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::TwoD => "2d",
            Dimension::ThreeD => "3d",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
