//! The fixed, ordered contract category label set.
//!
//! Index position is the canonical ordering of every probability vector in the
//! system: `probs[i]` is the probability of `labels.get(i)`. The set is read
//! once from the model directory's `config.json` (`id2label`) at startup and
//! never changes for the lifetime of the process.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

/// Contract categories in canonical training order.
pub const DEFAULT_CATEGORIES: &[&str] = &["Employment", "NDA", "Partnership", "SLA", "Vendor"];

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("config JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("id2label has non-numeric key {0:?}")]
    BadKey(String),

    #[error("id2label ids are not contiguous from 0 (got {0} labels, max id {1})")]
    NonContiguous(usize, usize),

    #[error("id2label is empty")]
    Empty,
}

/// Ordered label set for the classifier head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels(Vec<String>);

/// The slice of a HuggingFace `config.json` we care about.
#[derive(Deserialize)]
struct ModelConfig {
    id2label: HashMap<String, String>,
}

impl Default for Labels {
    fn default() -> Self {
        Self(DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect())
    }
}

impl Labels {
    /// Build from an explicit ordered list.
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    /// Parse the `id2label` map out of a HuggingFace model `config.json`.
    ///
    /// Keys are stringified class ids ("0", "1", ...); the resulting order is
    /// by numeric id, which is the order of the model's logit columns.
    pub fn from_config_json(json: &str) -> Result<Self, LabelError> {
        let config: ModelConfig = serde_json::from_str(json)?;
        if config.id2label.is_empty() {
            return Err(LabelError::Empty);
        }

        let mut pairs = Vec::with_capacity(config.id2label.len());
        for (id, name) in config.id2label {
            let idx: usize = id.parse().map_err(|_| LabelError::BadKey(id))?;
            pairs.push((idx, name));
        }
        pairs.sort_by_key(|(idx, _)| *idx);

        let max_id = pairs.last().map(|(idx, _)| *idx).unwrap_or(0);
        if max_id + 1 != pairs.len() {
            return Err(LabelError::NonContiguous(pairs.len(), max_id));
        }

        Ok(Self(pairs.into_iter().map(|(_, name)| name).collect()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Uniform distribution over this label set (1/n per label).
    pub fn uniform(&self) -> Vec<f32> {
        crate::prob::uniform(self.0.len())
    }

    /// Pair an index-aligned probability vector with label names.
    pub fn to_map(&self, probs: &[f32]) -> HashMap<String, f32> {
        self.0
            .iter()
            .zip(probs)
            .map(|(name, &p)| (name.clone(), p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_five_ordered_categories() {
        let labels = Labels::default();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels.get(0), Some("Employment"));
        assert_eq!(labels.get(4), Some("Vendor"));
    }

    #[test]
    fn from_config_orders_by_numeric_id() {
        // Deliberately shuffled keys; "10" would sort before "2" as a string.
        let json = r#"{
            "id2label": {"2": "Partnership", "0": "Employment", "1": "NDA",
                         "4": "Vendor", "3": "SLA"},
            "label2id": {"Employment": 0}
        }"#;
        let labels = Labels::from_config_json(json).unwrap();
        assert_eq!(
            labels.iter().collect::<Vec<_>>(),
            vec!["Employment", "NDA", "Partnership", "SLA", "Vendor"]
        );
    }

    #[test]
    fn from_config_rejects_gaps() {
        let json = r#"{"id2label": {"0": "A", "2": "B"}}"#;
        assert!(matches!(
            Labels::from_config_json(json),
            Err(LabelError::NonContiguous(2, 2))
        ));
    }

    #[test]
    fn from_config_rejects_bad_key() {
        let json = r#"{"id2label": {"zero": "A"}}"#;
        assert!(matches!(
            Labels::from_config_json(json),
            Err(LabelError::BadKey(_))
        ));
    }

    #[test]
    fn uniform_sums_to_one() {
        let labels = Labels::default();
        let u = labels.uniform();
        assert_eq!(u.len(), 5);
        let sum: f32 = u.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn to_map_pairs_by_index() {
        let labels = Labels::default();
        let probs = vec![0.1, 0.2, 0.3, 0.25, 0.15];
        let map = labels.to_map(&probs);
        assert_eq!(map.len(), 5);
        assert_eq!(map["Partnership"], 0.3);
        assert_eq!(map["Vendor"], 0.15);
    }
}
