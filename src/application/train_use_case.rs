// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the vocabulary        (Layer 6 - infra)
//   Step 2: Read + encode both splits  (Layer 3/4 - domain/data)
//   Step 3: Seed the RNGs              (Layer 5 - ml)
//   Step 4: Build or resume the model  (Layer 5/6 - ml/infra)
//   Step 5: Run training loop          (Layer 5 - ml)
//   Step 6: Save weights + configs     (Layer 6 - infra)
//   Step 7: Generate a sample          (Layer 5 - ml)
//
// A run without --resume always starts from fresh weights, even
// when a checkpoint already exists; it is overwritten at the end.
// Nothing in the checkpoint directory except metrics.csv changes
// until training has finished, so a failed run leaves the previous
// checkpoint intact.
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use burn::{module::AutodiffModule, prelude::*};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::application::prepare_use_case::{TRAIN_FILE, VAL_FILE, VOCAB_FILE};
use crate::data::dataset::{EncodedCorpus, Split};
use crate::domain::vocabulary::CharTokenizer;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    vocab_store::VocabStore,
};
use crate::ml::{
    default_device,
    generator::{generate, SamplingConfig},
    model::CharGptConfig,
    trainer::{train_model, LossEstimate},
    TrainBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the checkpoint as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:       PathBuf,
    pub checkpoint_dir: PathBuf,
    pub batch_size:     usize,
    /// Window length W: tokens per training example.
    pub block_size:     usize,
    pub lr:             f64,
    pub weight_decay:   f64,
    pub max_iters:      usize,
    pub eval_interval:  usize,
    pub eval_iters:     usize,
    pub n_embd:         usize,
    pub n_head:         usize,
    pub n_layer:        usize,
    pub dropout:        f64,
    /// Length of the sample printed after training.
    pub sample_tokens:  usize,
    pub seed:           Option<u64>,
    pub resume:         bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       PathBuf::from("."),
            checkpoint_dir: PathBuf::from("checkpoints"),
            batch_size:     64,
            block_size:     128,
            lr:             3e-4,
            weight_decay:   0.01,
            max_iters:      1000,
            eval_interval:  200,
            eval_iters:     200,
            n_embd:         384,
            n_head:         8,
            n_layer:        8,
            dropout:        0.2,
            sample_tokens:  500,
            seed:           None,
            resume:         false,
        }
    }
}

impl TrainConfig {
    /// Reject settings the model or loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.block_size == 0 {
            bail!("batch size and block size must be at least 1");
        }
        if self.eval_interval == 0 || self.eval_iters == 0 {
            bail!("eval interval and eval iters must be at least 1");
        }
        if self.n_head == 0 || self.n_embd % self.n_head != 0 {
            bail!(
                "n_embd ({}) must be a positive multiple of n_head ({})",
                self.n_embd,
                self.n_head
            );
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("dropout must be in [0, 1), got {}", self.dropout);
        }
        Ok(())
    }

    pub fn model_config(&self, vocab_size: usize) -> CharGptConfig {
        CharGptConfig::new(vocab_size, self.block_size, self.n_embd, self.n_head, self.n_layer)
            .with_dropout(self.dropout)
    }
}

/// What a run produced, for the CLI to report.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub final_loss:  Option<f64>,
    pub evaluations: Vec<LossEstimate>,
    pub sample:      String,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        let device = default_device();
        println!("Using device: {device:?}");

        // ── Step 1: Vocabulary ────────────────────────────────────────────────
        let vocab     = VocabStore::new(cfg.data_dir.join(VOCAB_FILE)).load()?;
        let tokenizer = CharTokenizer::new(&vocab)?;
        let listing: String = vocab.chars().iter().collect();
        println!("Vocabulary ({} chars): {listing:?}", vocab.len());

        // ── Step 2: Encode both splits ────────────────────────────────────────
        let train_text = read_split(cfg, TRAIN_FILE)?;
        let val_text   = read_split(cfg, VAL_FILE)?;
        let corpus = EncodedCorpus::encode(&tokenizer, &train_text, &val_text)
            .context("Corpus contains characters missing from the vocabulary; re-run 'prepare'")?;
        tracing::info!(
            "Encoded {} train and {} validation tokens",
            corpus.tokens(Split::Train).len(),
            corpus.tokens(Split::Validation).len()
        );

        // ── Step 3: Randomness ────────────────────────────────────────────────
        let mut rng = match cfg.seed {
            Some(seed) => {
                TrainBackend::seed(seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        // ── Step 4: Fresh model or resumed checkpoint ─────────────────────────
        let ckpt      = CheckpointManager::new(&cfg.checkpoint_dir);
        let model_cfg = cfg.model_config(vocab.len());
        let mut model = model_cfg.init::<TrainBackend>(&device);

        if cfg.resume {
            let stored = ckpt.load_model_config()?;
            if !stored.same_architecture(&model_cfg) {
                bail!(
                    "Checkpoint in '{}' was trained with a different architecture \
                     ({stored:?}); requested {model_cfg:?}",
                    cfg.checkpoint_dir.display()
                );
            }
            model = ckpt.load_model(model, &device)?;
            tracing::info!("Resuming from checkpoint in '{}'", cfg.checkpoint_dir.display());
        } else if ckpt.has_model() {
            tracing::warn!(
                "Starting from fresh weights; the checkpoint in '{}' will be overwritten",
                cfg.checkpoint_dir.display()
            );
        } else {
            tracing::info!("Starting from freshly initialised weights");
        }

        // ── Step 5: Train ─────────────────────────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        tracing::info!("Logging loss estimates to '{}'", metrics.csv_path().display());
        let report  = train_model(cfg, model, &corpus, &mut rng, &device, |e| metrics.log(e))?;

        match report.final_loss {
            Some(loss) => println!("Final training loss: {loss:.4}"),
            None       => println!("No training steps were run"),
        }

        // ── Step 6: Persist weights and configs together ──────────────────────
        ckpt.save_checkpoint(&report.model, &model_cfg, cfg)?;
        println!("Model saved to '{}'", ckpt.model_path().display());

        // ── Step 7: Sample from an empty context ──────────────────────────────
        let sampling = SamplingConfig { max_new_tokens: cfg.sample_tokens, ..SamplingConfig::default() };
        let ids      = generate(&report.model.valid(), &[], sampling, &mut rng, &device)?;
        let sample   = tokenizer.decode(&ids)?;
        println!("{sample}");

        Ok(TrainSummary {
            final_loss:  report.final_loss,
            evaluations: report.evaluations,
            sample,
        })
    }
}

fn read_split(cfg: &TrainConfig, name: &str) -> Result<String> {
    let path = cfg.data_dir.join(name);
    fs::read_to_string(&path).with_context(|| {
        format!("Cannot read '{}'. Have you run 'prepare' first?", path.display())
    })
}
