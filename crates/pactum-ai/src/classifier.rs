//! ONNX Runtime inference pipeline for the fine-tuned contract classifier.
//!
//! The model directory must contain `model.onnx` and `tokenizer.json`; if a
//! HuggingFace `config.json` is present its `id2label` map supplies the label
//! order, otherwise the default five contract categories are used.

use std::path::{Path, PathBuf};

use ort::session::Session;
use ort::value::Tensor;
use thiserror::Error;
use tokenizers::Tokenizer;
use tracing::info;

use pactum_core::labels::LabelError;
use pactum_core::prob::{argmax, expand_with_fallback, softmax};
use pactum_core::Labels;

/// Token window of the fine-tuned BERT model. Longer documents are
/// head-truncated by the tokenizer: a lossy, documented approximation.
const MAX_TOKENS: usize = 512;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("inference error: {0}")]
    Inference(#[from] ort::Error),

    #[error("label config error: {0}")]
    Labels(#[from] LabelError),

    #[error("unexpected model output: {0}")]
    BadOutput(String),
}

/// Sequence classifier over a fixed contract category set.
///
/// Loaded once at startup and treated as read-only thereafter; `ort` requires
/// `&mut` for `Session::run`, so callers that share an instance serialize on
/// a lock around it.
#[derive(Debug)]
pub struct Classifier {
    session: Session,
    tokenizer: Tokenizer,
    labels: Labels,
}

impl Classifier {
    /// Load the classifier from a directory containing `model.onnx` and
    /// `tokenizer.json` (and optionally `config.json` for the label order).
    pub fn load(model_dir: &Path) -> Result<Self, ClassifierError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            return Err(ClassifierError::ModelNotFound(model_path));
        }
        if !tokenizer_path.exists() {
            return Err(ClassifierError::ModelNotFound(tokenizer_path));
        }

        let session = Session::builder()?.commit_from_file(&model_path)?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ClassifierError::Tokenizer(format!("load tokenizer: {e}")))?;

        // Head-truncate to the model window.
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| ClassifierError::Tokenizer(format!("set truncation: {e}")))?;

        // Pad all inputs in a batch to the same length.
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            ..Default::default()
        }));

        let labels = match std::fs::read_to_string(model_dir.join("config.json")) {
            Ok(json) => Labels::from_config_json(&json)?,
            Err(_) => Labels::default(),
        };

        info!(
            num_labels = labels.len(),
            model = %model_path.display(),
            "loaded contract classification model"
        );
        Ok(Self {
            session,
            tokenizer,
            labels,
        })
    }

    /// The ordered label set backing every probability vector.
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Top category and its confidence (the max of the distribution).
    pub fn classify(&mut self, text: &str) -> Result<(String, f32), ClassifierError> {
        let probs = self.distribution(text)?;
        let (idx, confidence) = argmax(&probs)
            .ok_or_else(|| ClassifierError::BadOutput("empty probability vector".into()))?;
        let label = self
            .labels
            .get(idx)
            .ok_or_else(|| ClassifierError::BadOutput(format!("label index {idx} out of range")))?
            .to_string();
        Ok((label, confidence))
    }

    /// Full probability distribution over the label set for one text.
    pub fn distribution(&mut self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        let mut results = self.run_batch(&[text])?;
        Ok(results.pop().unwrap_or_default())
    }

    /// One distribution per fragment, in input order.
    ///
    /// Empty and whitespace-only fragments never reach the model; they get a
    /// uniform distribution inline so a malformed fragment can neither fail
    /// the batch nor shift the alignment. Any inference error fails the whole
    /// call: no zero-filled or missing entries are ever emitted.
    pub fn explain_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ClassifierError> {
        let kept: Vec<usize> = (0..texts.len())
            .filter(|&i| !texts[i].trim().is_empty())
            .collect();

        let non_trivial: Vec<&str> = kept.iter().map(|&i| texts[i].as_str()).collect();
        let dists = if non_trivial.is_empty() {
            vec![]
        } else {
            self.run_batch(&non_trivial)?
        };

        Ok(expand_with_fallback(
            texts.len(),
            &kept,
            dists,
            &self.labels.uniform(),
        ))
    }

    /// Tokenize, run one session call over `[batch, seq_len]`, softmax each
    /// logits row.
    fn run_batch(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ClassifierError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch_size = texts.len();
        let num_labels = self.labels.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ClassifierError::Tokenizer(format!("tokenize: {e}")))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Build flat input tensors: [batch_size, seq_len].
        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + j] = id as i64;
            }
            for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + j] = mask as i64;
            }
            for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + j] = tid as i64;
            }
        }

        let shape = [batch_size as i64, seq_len as i64];

        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        // Logits: [batch_size, num_labels].
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        if dims.len() != 2 || dims[0] as usize != batch_size || dims[1] as usize != num_labels {
            return Err(ClassifierError::BadOutput(format!(
                "logits shape {dims:?}, expected [{batch_size}, {num_labels}]"
            )));
        }

        let mut results = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let row = &output_data[i * num_labels..(i + 1) * num_labels];
            results.push(softmax(row));
        }
        Ok(results)
    }
}
