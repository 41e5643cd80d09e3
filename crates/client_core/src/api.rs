//! HTTP adapter for the remote visualization endpoint.

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::{ApiErrorBody, ResponseShapeError},
    protocol::{HealthResponse, VisualizationResponse, VisualizeRequest},
};
use tracing::{debug, warn};
use url::Url;

use crate::{error::VisualizeError, TokenProvider, VisualizationApi};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Validates an endpoint base address and strips any trailing slash so
/// paths can be appended with a single separator.
pub fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    let parsed = Url::parse(raw).with_context(|| format!("invalid API base URL: {raw}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(anyhow!("unsupported API base URL scheme: {other}")),
    }
    if parsed.host_str().is_none() {
        return Err(anyhow!("API base URL has no host: {raw}"));
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

pub struct HttpVisualizationApi {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpVisualizationApi {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenProvider>) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, tokens, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        tokens: Arc<dyn TokenProvider>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthResponse, VisualizeError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VisualizeError::api(
                Some(status.as_u16()),
                error_message(&response.text().await.unwrap_or_default()),
            ));
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| VisualizeError::MalformedResponse(err.to_string()))
    }

    async fn bearer_token(&self) -> Result<String, VisualizeError> {
        match self.tokens.bearer_token().await {
            Ok(Some(token)) if !token.trim().is_empty() => Ok(token),
            Ok(_) => Err(VisualizeError::Auth(
                "no session token available; sign in again".to_string(),
            )),
            Err(err) => Err(VisualizeError::Auth(format!("{err:#}"))),
        }
    }
}

#[async_trait]
impl VisualizationApi for HttpVisualizationApi {
    async fn visualize(
        &self,
        request: &VisualizeRequest,
    ) -> Result<VisualizationResponse, VisualizeError> {
        let token = self.bearer_token().await?;
        let response = self
            .http
            .post(format!("{}/visualize", self.base_url))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "visualization request rejected");
            return Err(VisualizeError::api(
                Some(status.as_u16()),
                error_message(&body),
            ));
        }

        let bytes = response.bytes().await?;
        let body: VisualizationResponse = serde_json::from_slice(&bytes)
            .map_err(|err| VisualizeError::MalformedResponse(err.to_string()))?;
        body.validate()?;
        if body.len() != request.len() {
            return Err(ResponseShapeError::ItemCountMismatch {
                expected: request.len(),
                actual: body.len(),
            }
            .into());
        }
        debug!(
            items = body.len(),
            dimensions = body.embedding_dimensions().unwrap_or_default(),
            "decoded visualization response"
        );
        Ok(body)
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|body| body.message())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
