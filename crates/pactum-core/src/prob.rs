//! Probability vector helpers shared by the inference adapter and the
//! explainability client.

/// Uniform distribution over `n` classes.
pub fn uniform(n: usize) -> Vec<f32> {
    if n == 0 {
        return vec![];
    }
    vec![1.0 / n as f32; n]
}

/// Numerically stable softmax over one logits row.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}

/// Index and value of the largest entry. `None` for an empty slice.
pub fn argmax(probs: &[f32]) -> Option<(usize, f32)> {
    probs
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

/// True if every value lies in [0,1] and the sum is 1.0 within `eps`.
pub fn is_distribution(probs: &[f32], eps: f32) -> bool {
    if probs.is_empty() {
        return false;
    }
    let sum: f32 = probs.iter().sum();
    probs.iter().all(|&p| (0.0..=1.0).contains(&p)) && (sum - 1.0).abs() <= eps
}

/// Re-expand a filtered result set to the full fragment count.
///
/// `kept` holds the original indices of the fragments that were actually run,
/// in order; every other slot gets a copy of `fallback`. This is the single
/// alignment primitive behind the batch-explain order invariant.
pub fn expand_with_fallback(
    len: usize,
    kept: &[usize],
    dists: Vec<Vec<f32>>,
    fallback: &[f32],
) -> Vec<Vec<f32>> {
    let mut out = vec![fallback.to_vec(); len];
    for (slot, dist) in kept.iter().zip(dists) {
        out[*slot] = dist;
    }
    out
}
