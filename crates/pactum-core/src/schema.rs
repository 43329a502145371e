//! Wire schemas for the classification API, plus the boundary validation
//! rules that keep malformed requests away from the inference layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum length for a single-prediction document. LIME fragments in the
/// batch endpoint carry no such minimum.
pub const MIN_TEXT_LEN: usize = 50;

/// Maximum number of fragments in one batch-explain request.
pub const MAX_BATCH_ITEMS: usize = 5000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("text must be at least {MIN_TEXT_LEN} characters, got {0}")]
    TextTooShort(usize),

    #[error("texts must contain at least one item")]
    EmptyBatch,

    #[error("texts must contain at most {MAX_BATCH_ITEMS} items, got {0}")]
    BatchTooLarge(usize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    /// Raw text of the contract to classify.
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub predicted_category: String,
    /// Model confidence in [0,1]; the max of the probability distribution.
    pub confidence_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchExplainRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchExplainResponse {
    /// One label -> probability map per input text, in input order.
    pub all_probabilities: Vec<HashMap<String, f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

impl ClassifyRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.text.chars().count();
        if len < MIN_TEXT_LEN {
            return Err(ValidationError::TextTooShort(len));
        }
        Ok(())
    }
}

impl BatchExplainRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.texts.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }
        if self.texts.len() > MAX_BATCH_ITEMS {
            return Err(ValidationError::BatchTooLarge(self.texts.len()));
        }
        Ok(())
    }
}
