use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use shared::{
    domain::Algorithm,
    protocol::{
        Coordinates2D, Coordinates3D, ItemResult, Reduction, VisualizationResponse,
        VisualizeRequest,
    },
};
use tokio::sync::{mpsc, oneshot};

use crate::{error::VisualizeError, VisualizationApi};

pub(crate) type Reply = Result<VisualizationResponse, VisualizeError>;

pub(crate) fn item_with(label: &str, coords: &[(Algorithm, (f64, f64), (f64, f64, f64))]) -> ItemResult {
    ItemResult {
        label: label.to_string(),
        embedding: vec![0.1, 0.2, 0.3, 0.4],
        reductions: coords
            .iter()
            .map(|(algorithm, (x, y), (x3, y3, z3))| Reduction {
                algorithm: *algorithm,
                coordinates_2d: Coordinates2D { x: *x, y: *y },
                coordinates_3d: Coordinates3D {
                    x: *x3,
                    y: *y3,
                    z: *z3,
                },
            })
            .collect(),
    }
}

/// Every algorithm gets the same coordinates; z mirrors x.
pub(crate) fn item(label: &str, x: f64, y: f64) -> ItemResult {
    let coords: Vec<_> = Algorithm::ALL
        .iter()
        .map(|algorithm| (*algorithm, (x, y), (x, y, x)))
        .collect();
    item_with(label, &coords)
}

pub(crate) fn response(points: &[(&str, f64, f64)]) -> VisualizationResponse {
    VisualizationResponse {
        results: points
            .iter()
            .map(|(label, x, y)| item(label, *x, *y))
            .collect(),
    }
}

/// Answers immediately, laying the submitted texts out along a diagonal.
pub(crate) fn echo(request: &VisualizeRequest) -> VisualizationResponse {
    VisualizationResponse {
        results: request
            .texts
            .iter()
            .enumerate()
            .map(|(index, input)| item(&input.text, index as f64, index as f64 * 2.0))
            .collect(),
    }
}

pub(crate) struct PendingCall {
    pub request: VisualizeRequest,
    pub respond: oneshot::Sender<Reply>,
}

/// Hands every call to the test, which decides when and how it completes.
pub(crate) struct ScriptedApi {
    calls: mpsc::UnboundedSender<PendingCall>,
    count: AtomicUsize,
}

impl ScriptedApi {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PendingCall>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                calls,
                count: AtomicUsize::new(0),
            }),
            rx,
        )
    }

    pub(crate) fn call_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisualizationApi for ScriptedApi {
    async fn visualize(&self, request: &VisualizeRequest) -> Reply {
        self.count.fetch_add(1, Ordering::SeqCst);
        let (respond, rx) = oneshot::channel();
        self.calls
            .send(PendingCall {
                request: request.clone(),
                respond,
            })
            .map_err(|_| VisualizeError::api(None, "test harness closed"))?;
        rx.await
            .unwrap_or_else(|_| Err(VisualizeError::api(None, "test harness dropped call")))
    }
}

/// Replies synchronously with [`echo`] and records every payload.
#[derive(Default)]
pub(crate) struct EchoApi {
    requests: std::sync::Mutex<Vec<VisualizeRequest>>,
}

impl EchoApi {
    pub(crate) fn requests(&self) -> Vec<VisualizeRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl VisualizationApi for EchoApi {
    async fn visualize(&self, request: &VisualizeRequest) -> Reply {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        Ok(echo(request))
    }
}
