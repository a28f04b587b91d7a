// ============================================================
// Layer 2 — GenerateUseCase
// ============================================================
// Loads a trained checkpoint and continues a prompt:
//
//   Step 1: Load model config + train config   (Layer 6 - infra)
//   Step 2: Load the vocabulary                (Layer 6 - infra)
//   Step 3: Rebuild the model, load weights    (Layer 5/6)
//   Step 4: Encode the prompt                  (Layer 3 - domain)
//   Step 5: Sample new tokens                  (Layer 5 - ml)
//   Step 6: Decode                             (Layer 3 - domain)
//
// Inference runs on the plain backend (no Autodiff), so dropout
// is off and no gradient graph is built.

use anyhow::{bail, Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;

use crate::application::prepare_use_case::VOCAB_FILE;
use crate::domain::vocabulary::CharTokenizer;
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::{
    default_device,
    generator::{generate, SamplingConfig},
    InferBackend,
};

#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub checkpoint_dir: PathBuf,
    /// Where `vocab.txt` lives; defaults to the training run's data dir.
    pub data_dir:       Option<PathBuf>,
    pub prompt:         String,
    pub sampling:       SamplingConfig,
    pub seed:           Option<u64>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from("checkpoints"),
            data_dir:       None,
            prompt:         String::new(),
            sampling:       SamplingConfig::default(),
            seed:           None,
        }
    }
}

pub struct GenerateUseCase {
    config: GenerateConfig,
}

impl GenerateUseCase {
    pub fn new(config: GenerateConfig) -> Self {
        Self { config }
    }

    /// Returns the prompt followed by the generated continuation.
    pub fn execute(&self) -> Result<String> {
        let cfg  = &self.config;
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);

        let model_cfg = ckpt.load_model_config()?;
        let data_dir  = match &cfg.data_dir {
            Some(dir) => dir.clone(),
            None      => ckpt.load_config()?.data_dir,
        };

        let vocab     = VocabStore::new(data_dir.join(VOCAB_FILE)).load()?;
        let tokenizer = CharTokenizer::new(&vocab)?;
        if vocab.len() != model_cfg.vocab_size {
            bail!(
                "Vocabulary in '{}' has {} characters but the checkpoint expects {}",
                data_dir.display(),
                vocab.len(),
                model_cfg.vocab_size
            );
        }

        let device = default_device();
        let model  = ckpt.load_model(model_cfg.init::<InferBackend>(&device), &device)?;

        let context = tokenizer
            .encode(&cfg.prompt)
            .context("Prompt contains characters the model has never seen")?;

        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };

        tracing::info!(
            "Generating {} tokens from a {}-token prompt",
            cfg.sampling.max_new_tokens,
            context.len()
        );
        let ids = generate(&model, &context, cfg.sampling, &mut rng, &device)?;
        Ok(tokenizer.decode(&ids)?)
    }
}
