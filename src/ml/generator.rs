// ============================================================
// Layer 5 — Text Generation
// ============================================================
// Extends a context one sampled token at a time.
//
//   loop max_new_tokens times:
//       crop context to its last block_size ids
//       logits = model(context)[:, -1, :] / temperature
//       probs  = softmax(logits)
//       next   ~ Categorical(probs)
//       context.push(next)
//
// The model only has block_size position embeddings, so once the
// context grows past the window we keep sliding it forward and
// feed only the most recent block_size tokens.
//
// Generation should run on an inference backend (or on
// `model.valid()`), where dropout is off.

use anyhow::{bail, Context, Result};
use burn::{prelude::*, tensor::activation::softmax};
use rand::{distributions::WeightedIndex, prelude::Distribution, Rng};

use crate::ml::model::CharGpt;

/// Sampling knobs for one generation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub max_new_tokens: usize,
    /// Divides the logits before softmax: <1 sharpens, >1 flattens.
    pub temperature:    f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { max_new_tokens: 500, temperature: 1.0 }
    }
}

/// Returns `context` followed by `max_new_tokens` sampled ids.
/// An empty context starts from token 0.
pub fn generate<B: Backend, R: Rng + ?Sized>(
    model:    &CharGpt<B>,
    context:  &[usize],
    sampling: SamplingConfig,
    rng:      &mut R,
    device:   &B::Device,
) -> Result<Vec<usize>> {
    if !(sampling.temperature > 0.0 && sampling.temperature.is_finite()) {
        bail!("temperature must be a positive number, got {}", sampling.temperature);
    }

    let mut tokens = if context.is_empty() { vec![0] } else { context.to_vec() };
    tokens.reserve(sampling.max_new_tokens);
    let block_size = model.block_size();

    for _ in 0..sampling.max_new_tokens {
        let window = &tokens[tokens.len().saturating_sub(block_size)..];
        let ids: Vec<i32> = window.iter().map(|&t| t as i32).collect();
        let input = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), device)
            .reshape([1, window.len()]);

        let logits = model.forward(input);
        let [_, seq_len, vocab_size] = logits.dims();

        // Only the last position predicts the next token
        let last  = logits
            .slice([0..1, seq_len - 1..seq_len, 0..vocab_size])
            .reshape([vocab_size])
            .div_scalar(sampling.temperature);
        let probs: Vec<f64> = softmax(last, 0)
            .into_data()
            .iter::<f64>()
            .collect();

        let dist = WeightedIndex::new(&probs)
            .context("model produced an invalid probability distribution")?;
        tokens.push(dist.sample(rng));
    }

    Ok(tokens)
}
