use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{PresetId, RequestSeq, ResultId},
    protocol::{VisualizationResponse, VisualizeRequest},
};

pub mod api;
pub mod debounce;
pub mod error;
pub mod list_view;
pub mod normalization;
pub mod orchestrator;
pub mod presets;
pub mod sample_set;
pub mod session;
pub mod view_state;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

pub use api::HttpVisualizationApi;
pub use error::{ValidationError, VisualizeError};
pub use list_view::EmbeddingListView;
pub use normalization::{normalize, NormalizationCache, NormalizedBatch};
pub use orchestrator::{PublishedResult, RequestOrchestrator, RequestState, RequestStatus};
pub use presets::{Preset, PresetCatalog};
pub use sample_set::{Provenance, SampleSetController};
pub use session::{SessionSnapshot, VisualizationSession};
pub use view_state::{InteractiveView, ViewHandle, ViewKind, ViewState, ViewStateHub};

/// Remote collaborator that embeds and reduces a batch of texts.
#[async_trait]
pub trait VisualizationApi: Send + Sync {
    async fn visualize(
        &self,
        request: &VisualizeRequest,
    ) -> std::result::Result<VisualizationResponse, VisualizeError>;
}

pub struct MissingVisualizationApi;

#[async_trait]
impl VisualizationApi for MissingVisualizationApi {
    async fn visualize(
        &self,
        _request: &VisualizeRequest,
    ) -> std::result::Result<VisualizationResponse, VisualizeError> {
        Err(VisualizeError::api(
            None,
            "visualization endpoint is unavailable",
        ))
    }
}

/// Supplies the bearer token attached to each visualization call.
///
/// `Ok(None)` means no identity is available; callers treat that the same
/// as a failed acquisition.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<Option<String>>;
}

pub struct MissingTokenProvider;

#[async_trait]
impl TokenProvider for MissingTokenProvider {
    async fn bearer_token(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<Option<String>> {
        Ok(Some(self.token.clone()))
    }
}

/// Adapts a plain `() -> Option<token>` callback from an identity layer.
pub struct FnTokenProvider<F>(pub F);

#[async_trait]
impl<F> TokenProvider for FnTokenProvider<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    async fn bearer_token(&self) -> Result<Option<String>> {
        Ok((self.0)())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultSource {
    Preset(PresetId),
    Request(RequestSeq),
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    PresetSelected(PresetId),
    SamplesChanged,
    ValidationFailed(ValidationError),
    RequestStarted {
        seq: RequestSeq,
        sample_count: usize,
    },
    ResultPublished {
        result_id: ResultId,
        source: ResultSource,
    },
    RequestFailed {
        seq: RequestSeq,
        error: VisualizeError,
    },
    ResponseDiscarded {
        seq: RequestSeq,
    },
}
