use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Algorithm;

/// Error body returned by the visualization endpoint on non-2xx responses.
///
/// `detail` is a plain string for handler failures and a list of field
/// errors for request validation failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub detail: serde_json::Value,
}

impl ApiErrorBody {
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) if text.trim().is_empty() => None,
            serde_json::Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseShapeError {
    #[error("item {index} has {actual} embedding dimensions, expected {expected}")]
    EmbeddingLengthMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("item {index} has {count} reductions for {algorithm}, expected exactly one")]
    ReductionCount {
        index: usize,
        algorithm: Algorithm,
        count: usize,
    },
    #[error("response has {actual} items for {expected} submitted texts")]
    ItemCountMismatch { expected: usize, actual: usize },
}
