//! Route handlers.
//!
//! The classifier is loaded before the listener binds, so a handler can never
//! observe a missing model. `ort` sessions need `&mut` to run, so inference
//! serializes on a lock and executes on the blocking thread pool to keep the
//! async executor free.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use pactum_ai::Classifier;
use pactum_core::{
    BatchExplainRequest, BatchExplainResponse, ClassifyRequest, ClassifyResponse, HealthResponse,
    Labels,
};

use crate::error::ApiError;

/// Shared handler state: the immutable label set plus the locked session.
pub struct AppState {
    classifier: Mutex<Classifier>,
    labels: Labels,
}

impl AppState {
    pub fn new(classifier: Classifier) -> Self {
        let labels = classifier.labels().clone();
        Self {
            classifier: Mutex::new(classifier),
            labels,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/classify", post(classify))
        .route("/classify-explain-batch", post(classify_explain_batch))
        .with_state(state)
}

/// Bind and serve until the process is terminated.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "contract classification API listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Contract Classification API is running.".to_string(),
        model_loaded: !state.labels.is_empty(),
    })
}

async fn classify(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    request.validate()?;

    let (predicted_category, confidence_score) = run_blocking(state, move |clf| {
        clf.classify(&request.text)
    })
    .await?;

    Ok(Json(ClassifyResponse {
        predicted_category,
        confidence_score,
    }))
}

async fn classify_explain_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchExplainRequest>,
) -> Result<Json<BatchExplainResponse>, ApiError> {
    request.validate()?;

    let labels = state.labels.clone();
    let count = request.texts.len();
    let dists = run_blocking(state, move |clf| clf.explain_batch(&request.texts)).await?;

    // Alignment invariant: one distribution per input fragment, same order.
    debug_assert_eq!(dists.len(), count);

    let all_probabilities = dists.iter().map(|d| labels.to_map(d)).collect();
    Ok(Json(BatchExplainResponse { all_probabilities }))
}

/// Run one inference closure on the blocking pool, holding the session lock
/// only for the duration of the call.
async fn run_blocking<T, F>(state: Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut Classifier) -> Result<T, pactum_ai::ClassifierError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut clf = state
            .classifier
            .lock()
            .map_err(|_| ApiError::Inference("classifier lock poisoned".into()))?;
        f(&mut clf).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Inference(format!("join error: {e}")))?
}
