use shared::error::ResponseShapeError;
use thiserror::Error;

pub const MIN_SAMPLES: usize = 3;
pub const MAX_SAMPLES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please enter at least {required} text samples (got {actual})")]
    NotEnoughSamples { required: usize, actual: usize },
    #[error("at most {max} text samples can be visualized at once (got {actual})")]
    TooManySamples { max: usize, actual: usize },
}

/// Failure of a single visualization attempt.
///
/// Cloneable so it can be carried inside published session snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisualizeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("{}", describe_api_failure(.status, .message))]
    Api { status: Option<u16>, message: String },
    #[error("malformed visualization response: {0}")]
    MalformedResponse(String),
}

fn describe_api_failure(status: &Option<u16>, message: &str) -> String {
    match *status {
        Some(status) if message.is_empty() => format!("API request failed with status {status}"),
        Some(status) => format!("API request failed with status {status}: {message}"),
        None => format!("API request failed: {message}"),
    }
}

impl VisualizeError {
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn requires_reauth(&self) -> bool {
        match self {
            VisualizeError::Auth(_) => true,
            VisualizeError::Api {
                status: Some(status),
                ..
            } => matches!(status, 401 | 403),
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            VisualizeError::Api { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<ResponseShapeError> for VisualizeError {
    fn from(value: ResponseShapeError) -> Self {
        Self::MalformedResponse(value.to_string())
    }
}

impl From<reqwest::Error> for VisualizeError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return Self::MalformedResponse(value.to_string());
        }
        Self::Api {
            status: value.status().map(|status| status.as_u16()),
            message: value.to_string(),
        }
    }
}
