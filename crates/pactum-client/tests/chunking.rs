//! End-to-end chunking and fail-safe behavior against a canned mock service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use pactum_client::{ClientError, ExplainClient};
use pactum_core::{
    BatchExplainRequest, BatchExplainResponse, ClassifyRequest, ClassifyResponse, HealthResponse,
    Labels, MIN_TEXT_LEN,
};

struct MockState {
    calls: AtomicUsize,
    sizes: Mutex<Vec<usize>>,
    /// 1-based index of the call that should 500, if any.
    fail_on_call: Option<usize>,
}

/// Canned batch-explain endpoint. Encodes each fragment's numeric suffix
/// ("frag-17" -> 17.0) into the Employment slot so tests can verify ordering
/// end to end.
async fn mock_explain(
    State(state): State<Arc<MockState>>,
    Json(request): Json<BatchExplainRequest>,
) -> Result<Json<BatchExplainResponse>, StatusCode> {
    let call = state.calls.fetch_add(1, Ordering::SeqCst) + 1;
    state.sizes.lock().unwrap().push(request.texts.len());

    if state.fail_on_call == Some(call) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let labels = Labels::default();
    let all_probabilities = request
        .texts
        .iter()
        .map(|text| {
            assert!(!text.trim().is_empty(), "client must filter trivial fragments");
            let marker: f32 = text
                .rsplit('-')
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.0);
            let mut map: HashMap<String, f32> =
                labels.iter().map(|name| (name.to_string(), 0.0)).collect();
            map.insert("Employment".to_string(), marker);
            map
        })
        .collect();

    Ok(Json(BatchExplainResponse { all_probabilities }))
}

/// Canned single-prediction endpoint, enforcing the boundary minimum the way
/// the real service does.
async fn mock_classify(
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, StatusCode> {
    if request.text.chars().count() < MIN_TEXT_LEN {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    Ok(Json(ClassifyResponse {
        predicted_category: "NDA".to_string(),
        confidence_score: 0.93,
    }))
}

async fn mock_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Contract Classification API is running.".to_string(),
        model_loaded: true,
    })
}

async fn spawn_mock(fail_on_call: Option<usize>) -> (String, Arc<MockState>) {
    let state = Arc::new(MockState {
        calls: AtomicUsize::new(0),
        sizes: Mutex::new(vec![]),
        fail_on_call,
    });

    let app = Router::new()
        .route("/classify-explain-batch", post(mock_explain))
        .route("/classify", post(mock_classify))
        .route("/health", get(mock_health))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

fn fragments(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("frag-{i}")).collect()
}

#[tokio::test]
async fn hundred_thirty_fragments_make_three_chunk_calls() {
    let (url, state) = spawn_mock(None).await;
    let client = ExplainClient::new(url);

    let texts = fragments(130);
    let out = client.predict_proba(&texts).await;

    assert_eq!(out.len(), 130);
    assert_eq!(state.calls.load(Ordering::SeqCst), 3);
    assert_eq!(*state.sizes.lock().unwrap(), vec![64, 64, 2]);

    // Employment (index 0) carries the fragment's own index: order survived
    // partitioning and concatenation.
    for (i, dist) in out.iter().enumerate() {
        assert_eq!(dist[0], i as f32, "fragment {i} out of order");
    }
}

#[tokio::test]
async fn failed_middle_chunk_degrades_whole_batch_to_uniform() {
    let (url, state) = spawn_mock(Some(2)).await;
    let client = ExplainClient::new(url);

    let texts = fragments(130);
    let out = client.predict_proba(&texts).await;

    assert_eq!(state.calls.load(Ordering::SeqCst), 2);
    assert_eq!(out.len(), 130);

    let uniform = client.labels().uniform();
    for dist in &out {
        assert_eq!(*dist, uniform);
    }
}

#[tokio::test]
async fn trivial_fragments_are_filtered_and_realigned() {
    let (url, state) = spawn_mock(None).await;
    let client = ExplainClient::new(url);

    let texts = vec![
        String::new(),
        "frag-1".to_string(),
        "   ".to_string(),
        "frag-3".to_string(),
    ];
    let out = client.predict_proba(&texts).await;

    // Only the two non-trivial fragments crossed the wire.
    assert_eq!(*state.sizes.lock().unwrap(), vec![2]);

    let uniform = client.labels().uniform();
    assert_eq!(out.len(), 4);
    assert_eq!(out[0], uniform);
    assert_eq!(out[1][0], 1.0);
    assert_eq!(out[2], uniform);
    assert_eq!(out[3][0], 3.0);
}

#[tokio::test]
async fn all_trivial_chunk_skips_the_network() {
    let (url, state) = spawn_mock(None).await;
    let client = ExplainClient::new(url);

    let texts = vec![String::new(), "  ".to_string(), "\n\t".to_string()];
    let out = client.predict_proba(&texts).await;

    assert_eq!(state.calls.load(Ordering::SeqCst), 0);
    assert_eq!(out, vec![client.labels().uniform(); 3]);
}

#[tokio::test]
async fn unreachable_server_degrades_to_uniform() {
    // Nothing is listening on this port.
    let client = ExplainClient::new("http://127.0.0.1:1".to_string());

    let texts = fragments(5);
    let out = client.predict_proba(&texts).await;

    assert_eq!(out, vec![client.labels().uniform(); 5]);
}

#[tokio::test]
async fn classify_posts_and_parses_response() {
    let (url, _state) = spawn_mock(None).await;
    let client = ExplainClient::new(url);

    let text = "The Receiving Party shall hold all Confidential Information in strict confidence.";
    let resp = client.classify(text).await.unwrap();

    assert_eq!(resp.predicted_category, "NDA");
    assert!((resp.confidence_score - 0.93).abs() < 1e-6);
}

#[tokio::test]
async fn classify_surfaces_server_rejection() {
    let (url, _state) = spawn_mock(None).await;
    let client = ExplainClient::new(url);

    let err = client.classify("too short").await.unwrap_err();
    match err {
        ClientError::Server { status, .. } => assert_eq!(status, 422),
        other => panic!("expected server error, got {other}"),
    }
}

#[tokio::test]
async fn health_reports_model_loaded() {
    let (url, _state) = spawn_mock(None).await;
    let client = ExplainClient::new(url);

    let health = client.health().await.unwrap();
    assert!(health.model_loaded);
    assert!(health.status.contains("running"));
}

#[tokio::test]
async fn empty_input_yields_empty_output() {
    let (url, state) = spawn_mock(None).await;
    let client = ExplainClient::new(url);

    let out = client.predict_proba(&[]).await;
    assert!(out.is_empty());
    assert_eq!(state.calls.load(Ordering::SeqCst), 0);
}
