//! Occlusion-based word importance, the in-process stand-in for LIME.
//!
//! Builds leave-one-word-out perturbations of a document, scores them all in
//! one chunked `predict_proba` call, and ranks each word by how much its
//! removal lowers the probability of the predicted class.

use anyhow::Context;
use tracing::warn;

use pactum_client::ExplainClient;
use pactum_core::prob::argmax;

pub struct WordImportance {
    pub word: String,
    /// Drop in predicted-class probability when this word is removed.
    pub importance: f32,
}

pub struct Explanation {
    pub predicted_category: String,
    pub base_probability: f32,
    pub words: Vec<WordImportance>,
}

/// Fragment 0 is the full document; fragment i+1 drops word i.
fn perturbations(words: &[&str]) -> Vec<String> {
    let mut fragments = Vec::with_capacity(words.len() + 1);
    fragments.push(words.join(" "));
    for i in 0..words.len() {
        let mut reduced = words.to_vec();
        reduced.remove(i);
        fragments.push(reduced.join(" "));
    }
    fragments
}

pub async fn explain_document(
    client: &ExplainClient,
    text: &str,
    top: usize,
) -> anyhow::Result<Explanation> {
    let words: Vec<&str> = text.split_whitespace().collect();
    anyhow::ensure!(!words.is_empty(), "document contains no words");

    let fragments = perturbations(&words);
    let probs = client.predict_proba(&fragments).await;

    // predict_proba upholds len(output) == len(input).
    let base = &probs[0];
    if *base == client.labels().uniform() {
        warn!("base distribution is uniform; the batch may have degraded to the fail-safe");
    }

    let (class_idx, base_probability) =
        argmax(base).context("empty probability distribution")?;
    let predicted_category = client
        .labels()
        .get(class_idx)
        .context("label index out of range")?
        .to_string();

    let mut ranked: Vec<WordImportance> = words
        .iter()
        .enumerate()
        .map(|(i, word)| WordImportance {
            word: word.to_string(),
            importance: base_probability - probs[i + 1][class_idx],
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(top);

    Ok(Explanation {
        predicted_category,
        base_probability,
        words: ranked,
    })
}
