// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `prepare`, `train` and
// `generate`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    generate_use_case::GenerateConfig,
    prepare_use_case::PrepareConfig,
    train_use_case::TrainConfig,
};
use crate::data::loader::{DecodePolicy, FileOrder};
use crate::ml::generator::SamplingConfig;

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a directory of .gz text files and build the vocabulary
    Prepare(PrepareArgs),

    /// Train the character model on prepared text
    Train(TrainArgs),

    /// Generate text from a trained checkpoint
    Generate(GenerateArgs),
}

/// Arguments for the `prepare` command
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Directory containing the .gz corpus files
    #[arg(long)]
    pub corpus_dir: PathBuf,

    /// Where train_split.txt, val_split.txt and vocab.txt are written
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Fail on invalid UTF-8 instead of dropping the bad bytes
    #[arg(long)]
    pub strict_utf8: bool,

    /// Keep the directory-listing order instead of sorting by name
    #[arg(long)]
    pub listing_order: bool,

    /// Hide the progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig {
            corpus_dir:    a.corpus_dir,
            out_dir:       a.out_dir,
            policy:        if a.strict_utf8 { DecodePolicy::Strict } else { DecodePolicy::Lossy },
            order:         if a.listing_order { FileOrder::Listing } else { FileOrder::Sorted },
            show_progress: !a.no_progress,
        }
    }
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Number of windows per optimiser step
    #[arg(long, alias = "batch_size")]
    pub batch_size: usize,

    /// Directory holding the output of `prepare`
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Directory for weights, configs and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Continue from the checkpoint instead of fresh weights
    #[arg(long)]
    pub resume: bool,

    #[arg(long, default_value_t = 1000)]
    pub max_iters: usize,

    /// Estimate train/val loss every this many steps
    #[arg(long, default_value_t = 200)]
    pub eval_interval: usize,

    /// Batches averaged per loss estimate
    #[arg(long, default_value_t = 200)]
    pub eval_iters: usize,

    /// Context window length in characters
    #[arg(long, default_value_t = 128)]
    pub block_size: usize,

    /// Embedding width; must be divisible by --n-head
    #[arg(long, default_value_t = 384)]
    pub n_embd: usize,

    #[arg(long, default_value_t = 8)]
    pub n_head: usize,

    #[arg(long, default_value_t = 8)]
    pub n_layer: usize,

    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// AdamW learning rate
    #[arg(long, default_value_t = 3e-4)]
    pub lr: f64,

    /// AdamW decoupled weight decay
    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f64,

    /// Characters sampled after training
    #[arg(long, default_value_t = 500)]
    pub sample_tokens: usize,

    /// Seed for weight init and batch sampling
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            block_size:     a.block_size,
            lr:             a.lr,
            weight_decay:   a.weight_decay,
            max_iters:      a.max_iters,
            eval_interval:  a.eval_interval,
            eval_iters:     a.eval_iters,
            n_embd:         a.n_embd,
            n_head:         a.n_head,
            n_layer:        a.n_layer,
            dropout:        a.dropout,
            sample_tokens:  a.sample_tokens,
            seed:           a.seed,
            resume:         a.resume,
        }
    }
}

/// All arguments for the `generate` command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Directory where `train` saved the checkpoint
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Directory holding vocab.txt (defaults to the one used for training)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Text to continue; empty starts from the first vocabulary character
    #[arg(long, default_value = "")]
    pub prompt: String,

    #[arg(long, default_value_t = 500)]
    pub max_new_tokens: usize,

    /// Softmax temperature: below 1 is more conservative
    #[arg(long, default_value_t = 1.0)]
    pub temperature: f64,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<GenerateArgs> for GenerateConfig {
    fn from(a: GenerateArgs) -> Self {
        GenerateConfig {
            checkpoint_dir: a.checkpoint_dir,
            data_dir:       a.data_dir,
            prompt:         a.prompt,
            sampling:       SamplingConfig {
                max_new_tokens: a.max_new_tokens,
                temperature:    a.temperature,
            },
            seed:           a.seed,
        }
    }
}
