// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `prepare`  — splits a .gz corpus and builds the vocabulary
//   2. `train`    — trains the model and saves a checkpoint
//   3. `generate` — samples text from a saved checkpoint
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GenerateArgs, PrepareArgs, TrainArgs};

use crate::application::{
    generate_use_case::GenerateUseCase,
    prepare_use_case::PrepareUseCase,
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "char-gpt",
    version,
    about = "Train a character-level GPT on a gzip text corpus, then sample from it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. The CLI only routes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args)  => run_prepare(args),
            Commands::Train(args)    => run_train(args),
            Commands::Generate(args) => run_generate(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    let report = PrepareUseCase::new(args.into()).execute()?;
    println!(
        "Prepared {} train files ({} chars) and {} validation files ({} chars)",
        report.train_files, report.train_chars, report.val_files, report.val_chars,
    );
    println!("Vocabulary size: {}", report.vocab.len());
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on data in '{}'", args.data_dir.display());
    let summary = TrainUseCase::new(args.into()).execute()?;
    tracing::info!("Ran {} loss estimates", summary.evaluations.len());
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let text = GenerateUseCase::new(args.into()).execute()?;
    println!("{text}");
    Ok(())
}
