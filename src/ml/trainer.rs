// ============================================================
// Layer 5 — Training Loop
// ============================================================
// A fixed number of AdamW steps over randomly sampled windows.
//
//   for iter in 0..max_iters:
//       every eval_interval iters → estimate_loss (eval mode)
//       sample a train batch      → forward_loss
//       backward                  → AdamW step
//
// There is no epoch notion, no early stopping, no learning-rate
// schedule and no gradient clipping: the loop always runs for
// exactly max_iters steps.
//
// Key Burn insight:
//   - Training runs on an AutodiffBackend so dropout is live
//   - model.valid() returns the same weights on the inner
//     backend, where dropout is a no-op and no graph is kept
//   - The training model itself is never switched, so nothing
//     has to be "restored" after an evaluation pass
//
// Reference: Burn Book §5 (Custom Training Loop)
//            Loshchilov & Hutter (2019) AdamW

use anyhow::Result;
use burn::{
    data::dataloader::batcher::Batcher,
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::Rng;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::WindowBatcher,
    dataset::{EncodedCorpus, Split},
    sampler::WindowSampler,
};
use crate::ml::model::{CharGpt, ModelMode};

/// Mean loss on both splits at one point of training.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossEstimate {
    pub step:       usize,
    pub train_loss: f64,
    pub val_loss:   f64,
}

/// What a finished run hands back.
pub struct TrainingReport<B: AutodiffBackend> {
    pub model:       CharGpt<B>,
    /// Loss of the last training batch.
    pub final_loss:  Option<f64>,
    pub evaluations: Vec<LossEstimate>,
}

/// Average the loss over `eval_iters` random batches of each split,
/// with dropout disabled. `model` itself is left untouched.
pub fn estimate_loss<B: AutodiffBackend, R: Rng + ?Sized>(
    model:      &CharGpt<B>,
    corpus:     &EncodedCorpus,
    sampler:    &WindowSampler,
    eval_iters: usize,
    step:       usize,
    rng:        &mut R,
    device:     &B::Device,
) -> Result<LossEstimate> {
    let model_valid = model.valid();
    debug_assert_eq!(model_valid.mode(), ModelMode::Eval);

    let batcher = WindowBatcher::<B::InnerBackend>::new(device.clone());
    let mut mean_loss = |split: Split| -> Result<f64> {
        let mut sum = 0.0f64;
        for _ in 0..eval_iters {
            let batch     = batcher.batch(sampler.sample(corpus.tokens(split), rng)?);
            let (loss, _) = model_valid.forward_loss(batch.inputs, batch.targets);
            sum += loss.into_scalar().elem::<f64>();
        }
        Ok(sum / eval_iters.max(1) as f64)
    };

    let train_loss = mean_loss(Split::Train)?;
    let val_loss   = mean_loss(Split::Validation)?;

    Ok(LossEstimate { step, train_loss, val_loss })
}

/// Train `model` for `cfg.max_iters` steps.
/// `on_eval` is called with every loss estimate as soon as it exists.
pub fn train_model<B, R, F>(
    cfg:         &TrainConfig,
    mut model:   CharGpt<B>,
    corpus:      &EncodedCorpus,
    rng:         &mut R,
    device:      &B::Device,
    mut on_eval: F,
) -> Result<TrainingReport<B>>
where
    B: AutodiffBackend,
    R: Rng + ?Sized,
    F: FnMut(&LossEstimate) -> Result<()>,
{
    let sampler = WindowSampler::new(cfg.block_size, cfg.batch_size)?;
    let batcher = WindowBatcher::<B>::new(device.clone());

    // ── AdamW optimiser ───────────────────────────────────────────────────────
    // Adam update plus decoupled weight decay:
    // θ = θ - lr * (m / (√v + ε) + λθ)
    let mut optim = AdamWConfig::new()
        .with_weight_decay(cfg.weight_decay as f32)
        .init();

    tracing::info!(
        "Training {} parameters for {} steps (batch={}, block={}, lr={})",
        model.num_params(),
        cfg.max_iters,
        cfg.batch_size,
        cfg.block_size,
        cfg.lr,
    );

    let mut evaluations = Vec::new();
    let mut final_loss  = None;

    for iter in 0..cfg.max_iters {
        // ── Periodic evaluation ───────────────────────────────────────────────
        if iter % cfg.eval_interval == 0 {
            let estimate = estimate_loss(&model, corpus, &sampler, cfg.eval_iters, iter, rng, device)?;
            println!(
                "step {:>5} | train_loss={:.4} | val_loss={:.4}",
                estimate.step, estimate.train_loss, estimate.val_loss,
            );
            on_eval(&estimate)?;
            evaluations.push(estimate);
        }

        // ── Training step ─────────────────────────────────────────────────────
        let batch     = batcher.batch(sampler.sample(corpus.tokens(Split::Train), rng)?);
        let (loss, _) = model.forward_loss(batch.inputs, batch.targets);
        final_loss    = Some(loss.clone().into_scalar().elem::<f64>());

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(cfg.lr, model, grads);
    }

    tracing::info!("Training complete!");
    Ok(TrainingReport { model, final_loss, evaluations })
}
