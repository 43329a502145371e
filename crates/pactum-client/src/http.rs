//! HTTP client for the contract classification API.
//!
//! `predict_proba` is the LIME-facing entry point: it never fails and never
//! misaligns. Large perturbation sets are split into bounded chunks; trivial
//! fragments are filtered before dispatch and re-inserted as uniform
//! distributions by position. If any chunk fails definitively the entire
//! batch degrades to uniform, so a caller that only checks for "no error"
//! can never receive a subtly-misaligned result.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use pactum_core::prob::expand_with_fallback;
use pactum_core::{
    BatchExplainRequest, BatchExplainResponse, ClassifyRequest, ClassifyResponse, HealthResponse,
    Labels, MAX_BATCH_ITEMS,
};

/// Fragments per batch-explain request.
pub const DEFAULT_CHUNK_SIZE: usize = 64;

const SINGLE_TIMEOUT: Duration = Duration::from_secs(60);
const BATCH_TIMEOUT: Duration = Duration::from_secs(180);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("misaligned response: {0}")]
    Misaligned(String),
}

/// Client for the classification API.
///
/// `base_url` should be like `http://localhost:8000` (no trailing slash).
pub struct ExplainClient {
    client: reqwest::Client,
    base_url: String,
    labels: Labels,
    chunk_size: usize,
}

impl ExplainClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            labels: Labels::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the label set (must match the serving model).
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Override the chunk size, clamped to `1..=MAX_BATCH_ITEMS` so a chunk
    /// can never exceed what the service accepts in one request.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_BATCH_ITEMS);
        self
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Single-document prediction via `POST /classify`.
    pub async fn classify(&self, text: &str) -> Result<ClassifyResponse, ClientError> {
        let url = format!("{}/classify", self.base_url);
        let request = ClassifyRequest {
            text: text.to_string(),
        };

        let resp = self
            .client
            .post(&url)
            .timeout(SINGLE_TIMEOUT)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.json().await?)
    }

    /// Service liveness via `GET /health`.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    /// One probability distribution per fragment, in input order, always.
    ///
    /// This is the `predict_proba` surface a LIME-style explainer calls with
    /// its perturbation set. On any definitive chunk failure (network error,
    /// timeout, non-2xx, malformed response) the whole batch returns uniform
    /// distributions: some numbers are better than a crash, and a partially
    /// real result could silently misalign downstream weights.
    pub async fn predict_proba(&self, texts: &[String]) -> Vec<Vec<f32>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.chunk_size) {
            match self.explain_chunk(chunk).await {
                Ok(dists) => out.extend(dists),
                Err(err) => {
                    warn!(%err, "chunk dispatch failed, degrading whole batch to uniform");
                    return vec![self.labels.uniform(); texts.len()];
                }
            }
        }
        info!(fragments = texts.len(), "batch explainability complete");
        out
    }

    /// Dispatch one chunk and re-expand it to its original count and order.
    async fn explain_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>, ClientError> {
        let uniform = self.labels.uniform();

        // Filter trivial fragments locally; the service would also uniform-fill
        // them, but there is no point shipping them over the wire.
        let kept: Vec<usize> = (0..chunk.len())
            .filter(|&i| !chunk[i].trim().is_empty())
            .collect();
        if kept.is_empty() {
            return Ok(vec![uniform; chunk.len()]);
        }

        let request = BatchExplainRequest {
            texts: kept.iter().map(|&i| chunk[i].clone()).collect(),
        };

        let url = format!("{}/classify-explain-batch", self.base_url);
        let resp = self
            .client
            .post(&url)
            .timeout(BATCH_TIMEOUT)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body: BatchExplainResponse = resp.json().await?;
        if body.all_probabilities.len() != kept.len() {
            return Err(ClientError::Misaligned(format!(
                "sent {} fragments, got {} distributions",
                kept.len(),
                body.all_probabilities.len()
            )));
        }

        // Responses correspond to sent fragments by position, so duplicate
        // fragment text cannot collide.
        let mut dists = Vec::with_capacity(kept.len());
        for map in &body.all_probabilities {
            let mut dist = Vec::with_capacity(self.labels.len());
            for name in self.labels.iter() {
                match map.get(name) {
                    Some(&p) => dist.push(p),
                    None => {
                        return Err(ClientError::Misaligned(format!(
                            "distribution missing label {name:?}"
                        )));
                    }
                }
            }
            dists.push(dist);
        }

        Ok(expand_with_fallback(chunk.len(), &kept, dists, &uniform))
    }
}
