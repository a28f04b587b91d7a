// ============================================================
// Layer 5 — Character GPT (Burn)
// ============================================================
// A decoder-only transformer over character ids.
//
//   ids [B, T]
//     │  token embedding + position embedding
//     ▼
//   x [B, T, C]
//     │  n_layer × Block:
//     │     x = LayerNorm(x + CausalSelfAttention(x))
//     │     x = LayerNorm(x + FeedForward(x))
//     ▼
//   final LayerNorm → lm_head
//     ▼
//   logits [B, T, vocab_size]
//
// Normalisation is applied AFTER each residual add (post-norm).
// Position embeddings only cover `block_size` positions, so the
// model never accepts a sequence longer than that.
//
// Reference: Burn Book §3 (Building Blocks)
//            Vaswani et al. (2017) Attention Is All You Need

use burn::{
    nn::{
        attention::generate_autoregressive_mask,
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Initializer,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{relu, softmax},
};

/// Width multiplier of the feed-forward hidden layer.
const FFN_EXPANSION: usize = 4;

#[derive(Config, Debug)]
pub struct CharGptConfig {
    pub vocab_size: usize,
    /// Maximum context length (window size).
    pub block_size: usize,
    pub n_embd:     usize,
    pub n_head:     usize,
    pub n_layer:    usize,
    #[config(default = 0.2)]
    pub dropout:    f64,
    /// Standard deviation of the normal weight initialiser.
    #[config(default = 0.02)]
    pub init_std:   f64,
}

impl CharGptConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CharGpt<B> {
        assert!(
            self.n_head > 0 && self.n_embd % self.n_head == 0,
            "n_embd ({}) must be divisible by n_head ({})",
            self.n_embd,
            self.n_head
        );

        let token_embedding = EmbeddingConfig::new(self.vocab_size, self.n_embd)
            .with_initializer(self.weight_init())
            .init(device);
        let position_embedding = EmbeddingConfig::new(self.block_size, self.n_embd)
            .with_initializer(self.weight_init())
            .init(device);
        let blocks = (0..self.n_layer).map(|_| self.init_block(device)).collect();
        let final_norm = LayerNormConfig::new(self.n_embd).init(device);
        let lm_head    = self.linear(self.n_embd, self.vocab_size, true, device);

        CharGpt {
            token_embedding,
            position_embedding,
            blocks,
            final_norm,
            lm_head,
            block_size: self.block_size,
        }
    }

    /// True when a checkpoint written with `other` fits a model built from `self`.
    pub fn same_architecture(&self, other: &CharGptConfig) -> bool {
        self.vocab_size == other.vocab_size
            && self.block_size == other.block_size
            && self.n_embd == other.n_embd
            && self.n_head == other.n_head
            && self.n_layer == other.n_layer
    }

    fn weight_init(&self) -> Initializer {
        Initializer::Normal { mean: 0.0, std: self.init_std }
    }

    // Weights ~ N(0, init_std), bias (when present) zeroed.
    fn linear<B: Backend>(&self, d_in: usize, d_out: usize, bias: bool, device: &B::Device) -> Linear<B> {
        let mut linear = LinearConfig::new(d_in, d_out)
            .with_bias(bias)
            .with_initializer(self.weight_init())
            .init(device);
        if bias {
            linear.bias = Some(Initializer::Zeros.init([d_out], device));
        }
        linear
    }

    fn init_block<B: Backend>(&self, device: &B::Device) -> Block<B> {
        let attention = CausalSelfAttention {
            query:         self.linear(self.n_embd, self.n_embd, false, device),
            key:           self.linear(self.n_embd, self.n_embd, false, device),
            value:         self.linear(self.n_embd, self.n_embd, false, device),
            proj:          self.linear(self.n_embd, self.n_embd, true, device),
            attn_dropout:  DropoutConfig::new(self.dropout).init(),
            resid_dropout: DropoutConfig::new(self.dropout).init(),
            n_head:        self.n_head,
        };
        let feed_forward = FeedForward {
            expand:   self.linear(self.n_embd, FFN_EXPANSION * self.n_embd, true, device),
            contract: self.linear(FFN_EXPANSION * self.n_embd, self.n_embd, true, device),
            dropout:  DropoutConfig::new(self.dropout).init(),
        };
        Block {
            attention,
            feed_forward,
            norm1: LayerNormConfig::new(self.n_embd).init(device),
            norm2: LayerNormConfig::new(self.n_embd).init(device),
        }
    }
}

/// Whether dropout is live. Burn only applies dropout on a backend
/// that records gradients, so the mode follows the backend type:
/// `model.valid()` hands back the same weights in `Eval` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelMode {
    Train,
    Eval,
}

// ─── Attention ────────────────────────────────────────────────────────────────
/// Multi-head causal self-attention. The per-head key/query/value
/// projections are stored as one `n_embd → n_embd` matrix each and
/// split into heads by reshaping.
#[derive(Module, Debug)]
pub struct CausalSelfAttention<B: Backend> {
    pub query:         Linear<B>,
    pub key:           Linear<B>,
    pub value:         Linear<B>,
    pub proj:          Linear<B>,
    pub attn_dropout:  Dropout,
    pub resid_dropout: Dropout,
    pub n_head:        usize,
}

impl<B: Backend> CausalSelfAttention<B> {
    /// x: [batch, seq_len, n_embd] → [batch, seq_len, n_embd]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch_size, seq_len, n_embd] = x.dims();
        let head_size = n_embd / self.n_head;

        // [B, T, C] → [B, n_head, T, head_size]
        let split_heads = |t: Tensor<B, 3>| {
            t.reshape([batch_size, seq_len, self.n_head, head_size])
                .swap_dims(1, 2)
        };
        let q = split_heads(self.query.forward(x.clone()));
        let k = split_heads(self.key.forward(x.clone()));
        let v = split_heads(self.value.forward(x));

        // Scores are scaled by the full embedding width, not head_size.
        let scores = q
            .matmul(k.swap_dims(2, 3))
            .mul_scalar((n_embd as f64).powf(-0.5));

        // true above the diagonal → position i never sees j > i
        let mask = generate_autoregressive_mask::<B>(batch_size, seq_len, &scores.device())
            .reshape([batch_size, 1, seq_len, seq_len])
            .repeat_dim(1, self.n_head);

        let weights = softmax(scores.mask_fill(mask, f32::NEG_INFINITY), 3);
        let weights = self.attn_dropout.forward(weights);

        // [B, n_head, T, head_size] → [B, T, C]
        let out = weights
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch_size, seq_len, n_embd]);

        self.resid_dropout.forward(self.proj.forward(out))
    }
}

// ─── Feed-forward ─────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct FeedForward<B: Backend> {
    pub expand:   Linear<B>,
    pub contract: Linear<B>,
    pub dropout:  Dropout,
}

impl<B: Backend> FeedForward<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let hidden = relu(self.expand.forward(x));
        self.dropout.forward(self.contract.forward(hidden))
    }
}

// ─── Block ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Block<B: Backend> {
    pub attention:    CausalSelfAttention<B>,
    pub feed_forward: FeedForward<B>,
    pub norm1:        LayerNorm<B>,
    pub norm2:        LayerNorm<B>,
}

impl<B: Backend> Block<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = self.norm1.forward(x.clone() + self.attention.forward(x));
        self.norm2.forward(x.clone() + self.feed_forward.forward(x))
    }
}

// ─── Model ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct CharGpt<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub blocks:             Vec<Block<B>>,
    pub final_norm:         LayerNorm<B>,
    pub lm_head:            Linear<B>,
    pub block_size:         usize,
}

impl<B: Backend> CharGpt<B> {
    /// input_ids: [batch, seq_len] → logits: [batch, seq_len, vocab_size]
    ///
    /// # Panics
    /// Panics if seq_len exceeds the block size.
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();
        assert!(
            seq_len <= self.block_size,
            "sequence length {} exceeds block size {}",
            seq_len,
            self.block_size
        );

        let device  = input_ids.device();
        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is order-blind, so every row gets 0..seq_len
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .reshape([1, seq_len])
            .repeat_dim(0, batch_size);
        let pos_emb = self.position_embedding.forward(positions);

        let mut x = tok_emb + pos_emb;
        for block in &self.blocks {
            x = block.forward(x);
        }

        self.lm_head.forward(self.final_norm.forward(x))
    }

    /// Mean next-token cross-entropy over every position of the batch.
    /// Returns the scalar loss and the logits it was computed from.
    pub fn forward_loss(
        &self,
        input_ids: Tensor<B, 2, Int>,
        targets:   Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 3>) {
        let logits = self.forward(input_ids);
        let [batch_size, seq_len, vocab_size] = logits.dims();

        let ce   = CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(
            logits.clone().reshape([batch_size * seq_len, vocab_size]),
            targets.reshape([batch_size * seq_len]),
        );
        (loss, logits)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn mode(&self) -> ModelMode {
        if B::ad_enabled() {
            ModelMode::Train
        } else {
            ModelMode::Eval
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::AutodiffModule;

    type TestBackend = NdArray;

    fn tiny_config() -> CharGptConfig {
        CharGptConfig::new(11, 8, 16, 4, 2).with_dropout(0.0)
    }

    fn ids(tokens: &[i32]) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(tokens, &Default::default())
            .reshape([1, tokens.len()])
    }

    fn floats<const D: usize>(t: Tensor<TestBackend, D>) -> Vec<f32> {
        t.into_data().iter::<f32>().collect()
    }

    #[test]
    fn test_logits_shape() {
        let model  = tiny_config().init::<TestBackend>(&Default::default());
        let input  = Tensor::<TestBackend, 1, Int>::from_ints([1, 2, 3, 4, 5, 6], &Default::default())
            .reshape([2, 3]);
        let logits = model.forward(input);
        assert_eq!(logits.dims(), [2, 3, 11]);
    }

    #[test]
    fn test_biases_start_at_zero() {
        let model = tiny_config().init::<TestBackend>(&Default::default());
        let bias  = model.lm_head.bias.as_ref().map(|b| b.val()).unwrap();
        assert!(floats(bias).iter().all(|&b| b == 0.0));
        assert!(model.blocks[0].attention.query.bias.is_none());
    }

    #[test]
    fn test_weights_are_small() {
        let model  = tiny_config().init::<TestBackend>(&Default::default());
        let weight = floats(model.token_embedding.weight.val());
        let mean   = weight.iter().sum::<f32>() / weight.len() as f32;
        let max    = weight.iter().fold(0.0f32, |m, w| m.max(w.abs()));
        assert!(mean.abs() < 0.01, "mean {mean}");
        // ~7σ for σ = 0.02
        assert!(max < 0.15, "max {max}");
    }

    #[test]
    fn test_future_tokens_do_not_leak() {
        let model = tiny_config().init::<TestBackend>(&Default::default());

        let a = floats(model.forward(ids(&[1, 2, 3, 4, 5, 6])));
        // change only the last position
        let b = floats(model.forward(ids(&[1, 2, 3, 4, 5, 9])));

        let vocab = 11;
        for pos in 0..5 {
            for v in 0..vocab {
                let i = pos * vocab + v;
                assert!(
                    (a[i] - b[i]).abs() < 1e-5,
                    "position {} changed when only a future token was modified",
                    pos
                );
            }
        }
        let last_changed = (5 * vocab..6 * vocab).any(|i| (a[i] - b[i]).abs() > 1e-6);
        assert!(last_changed, "the perturbed position itself should change");
    }

    #[test]
    fn test_loss_near_uniform_at_init() {
        let model    = tiny_config().init::<TestBackend>(&Default::default());
        let (loss, _) = model.forward_loss(ids(&[1, 2, 3, 4]), ids(&[2, 3, 4, 5]));
        let loss: f64 = loss.into_scalar().elem();
        // small weights → close to ln(vocab_size)
        assert!((loss - (11f64).ln()).abs() < 0.5, "loss {loss}");
    }

    #[test]
    #[should_panic]
    fn test_rejects_sequences_longer_than_block() {
        let model = tiny_config().init::<TestBackend>(&Default::default());
        let _ = model.forward(ids(&[0; 9]));
    }

    #[test]
    fn test_mode_follows_backend() {
        let device = Default::default();
        let model  = tiny_config()
            .with_dropout(0.5)
            .init::<Autodiff<TestBackend>>(&device);
        assert_eq!(model.mode(), ModelMode::Train);
        assert_eq!(model.valid().mode(), ModelMode::Eval);
    }

    #[test]
    fn test_dropout_only_in_train_mode() {
        let device = Default::default();
        let model  = tiny_config()
            .with_dropout(0.5)
            .init::<Autodiff<TestBackend>>(&device);
        let input = || {
            Tensor::<Autodiff<TestBackend>, 1, Int>::from_ints([1, 2, 3, 4], &device).reshape([1, 4])
        };

        let eval = model.valid();
        let e1   = floats(eval.forward(ids(&[1, 2, 3, 4])));
        let e2   = floats(eval.forward(ids(&[1, 2, 3, 4])));
        assert_eq!(e1, e2, "evaluation must be deterministic");

        let t1: Vec<f32> = model.forward(input()).into_data().iter::<f32>().collect();
        let t2: Vec<f32> = model.forward(input()).into_data().iter::<f32>().collect();
        assert_ne!(t1, t2, "training forward passes should see different dropout masks");
    }
}
