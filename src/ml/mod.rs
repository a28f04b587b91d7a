// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The transformer, the training loop and text generation.
// The data layer only touches Burn to build tensor batches;
// everything that runs a forward pass lives here.
//
// What's in this layer:
//
//   model.rs     — The decoder-only character transformer
//                  • Token + learned position embeddings
//                  • Masked multi-head self-attention
//                  • Feed-forward networks (ReLU activation)
//                  • Post-norm residual blocks
//                  • Final LayerNorm + vocabulary head
//
//   trainer.rs   — The training loop
//                  Random windows, AdamW steps, periodic
//                  train/val loss estimation in eval mode
//
//   generator.rs — Autoregressive sampling
//                  Crops the context to the window, samples
//                  the next id from softmax(logits / T)
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Radford et al. (2019) Language Models are
//            Unsupervised Multitask Learners

use burn::backend::Autodiff;

/// Decoder-only character transformer
pub mod model;

/// Training loop with periodic loss estimation
pub mod trainer;

/// Autoregressive text generation
pub mod generator;

// ── Backend selection ────────────────────────────────────────────────────────
// CPU (ndarray) by default; `--features wgpu` switches to the GPU.
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;
#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

/// Backend with gradient tracking, used for training.
pub type TrainBackend = Autodiff<InferBackend>;

pub fn default_device() -> <InferBackend as burn::tensor::backend::Backend>::Device {
    Default::default()
}
