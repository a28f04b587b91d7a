// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's
// NamedMpkFileRecorder with FullPrecisionSettings.
//
// What gets saved:
//   1. model.mpk         — all learned parameters
//   2. model_config.json — exact architecture, vocab_size included
//   3. train_config.json — the run's hyperparameters
//
// The model config is needed to rebuild a model of the right
// shape before its weights can be loaded into it, so the three
// files are only replaced together once a run has succeeded.
// Every file is written under a staging name and renamed into
// place; an interrupted save never leaves a half-written file.
// Every run overwrites the previous checkpoint; there is no
// history of snapshots.
//
// Optimizer moments are not saved: a resumed run restarts AdamW
// from zeroed statistics.
//
// File layout:
//   checkpoints/
//     model.mpk
//     model_config.json
//     train_config.json
//     metrics.csv        ← written by MetricsLogger
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{CharGpt, CharGptConfig};

const MODEL_FILE:        &str = "model";
const STAGED_MODEL_FILE: &str = "model-staged";
const MODEL_CONFIG_FILE: &str = "model_config.json";
const CONFIG_FILE:       &str = "train_config.json";
const STAGED_SUFFIX:     &str = ".staged";

type ModelRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Manages the checkpoint files inside one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the weights file, extension included.
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE).with_extension("mpk")
    }

    pub fn has_model(&self) -> bool {
        self.model_path().is_file()
    }

    /// Replace the whole checkpoint: weights, model config and run config.
    /// Files already on disk are left alone until all three are staged.
    pub fn save_checkpoint<B: Backend>(
        &self,
        model:     &CharGpt<B>,
        model_cfg: &CharGptConfig,
        train_cfg: &TrainConfig,
    ) -> Result<()> {
        let staged_model     = self.stage_model(model)?;
        let staged_model_cfg = self.stage_json(MODEL_CONFIG_FILE, model_cfg)?;
        let staged_train_cfg = self.stage_json(CONFIG_FILE, train_cfg)?;

        self.commit(&staged_model, &self.model_path())?;
        self.commit(&staged_model_cfg, &self.dir.join(MODEL_CONFIG_FILE))?;
        self.commit(&staged_train_cfg, &self.dir.join(CONFIG_FILE))?;

        tracing::debug!("Saved checkpoint to '{}'", self.dir.display());
        Ok(())
    }

    /// Write the model weights alone, replacing any earlier weights file.
    pub fn save_model<B: Backend>(&self, model: &CharGpt<B>) -> Result<()> {
        let staged = self.stage_model(model)?;
        self.commit(&staged, &self.model_path())?;
        tracing::debug!("Saved model weights to '{}'", self.model_path().display());
        Ok(())
    }

    /// Load saved weights into `model`, which must have the same architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  CharGpt<B>,
        device: &B::Device,
    ) -> Result<CharGpt<B>> {
        let path = self.dir.join(MODEL_FILE);
        let record = ModelRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you run 'train' first?",
                    self.model_path().display()
                )
            })?;

        tracing::info!("Loaded model weights from '{}'", self.model_path().display());
        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let staged = self.stage_json(CONFIG_FILE, cfg)?;
        self.commit(&staged, &self.dir.join(CONFIG_FILE))
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(CONFIG_FILE)
    }

    pub fn save_model_config(&self, cfg: &CharGptConfig) -> Result<()> {
        let staged = self.stage_json(MODEL_CONFIG_FILE, cfg)?;
        self.commit(&staged, &self.dir.join(MODEL_CONFIG_FILE))
    }

    pub fn load_model_config(&self) -> Result<CharGptConfig> {
        self.read_json(MODEL_CONFIG_FILE)
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))
    }

    // Records the weights under the staging name and returns that file's path.
    fn stage_model<B: Backend>(&self, model: &CharGpt<B>) -> Result<PathBuf> {
        self.ensure_dir()?;

        // The recorder appends the .mpk extension itself
        let stem = self.dir.join(STAGED_MODEL_FILE);
        ModelRecorder::new()
            .record(model.clone().into_record(), stem.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", stem.display()))?;
        Ok(stem.with_extension("mpk"))
    }

    fn stage_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        self.ensure_dir()?;

        let path = self.dir.join(format!("{name}{STAGED_SUFFIX}"));
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        Ok(path)
    }

    fn commit(&self, staged: &Path, target: &Path) -> Result<()> {
        fs::rename(staged, target).with_context(|| {
            format!("Cannot move '{}' into place as '{}'", staged.display(), target.display())
        })
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Have you run 'train' first?",
                path.display()
            )
        })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config file '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn flat_weights(model: &CharGpt<NdArray>) -> Vec<f32> {
        model.lm_head.weight.val().into_data().iter::<f32>().collect()
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_model_round_trip() {
        let tmp     = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(tmp.path().join("ckpt"));
        let device  = Default::default();
        let config  = CharGptConfig::new(7, 4, 8, 2, 1);

        let saved = config.init::<NdArray>(&device);
        assert!(!manager.has_model());
        manager.save_model(&saved).unwrap();
        assert!(manager.has_model());

        // A fresh init draws different weights; loading must overwrite them
        let loaded = manager.load_model(config.init::<NdArray>(&device), &device).unwrap();
        assert_eq!(flat_weights(&saved), flat_weights(&loaded));
    }

    #[test]
    fn test_save_checkpoint_writes_all_files_without_leftovers() {
        let tmp       = tempfile::tempdir().unwrap();
        let manager   = CheckpointManager::new(tmp.path());
        let device    = Default::default();
        let model_cfg = CharGptConfig::new(5, 4, 8, 2, 1);
        let train_cfg = TrainConfig { block_size: 4, n_embd: 8, ..TrainConfig::default() };
        let model     = model_cfg.init::<NdArray>(&device);

        manager.save_checkpoint(&model, &model_cfg, &train_cfg).unwrap();
        // Saving twice replaces the files in place
        manager.save_checkpoint(&model, &model_cfg, &train_cfg).unwrap();

        assert_eq!(
            file_names(tmp.path()),
            vec!["model.mpk", "model_config.json", "train_config.json"]
        );
        assert_eq!(manager.load_config().unwrap(), train_cfg);
        assert!(manager.load_model_config().unwrap().same_architecture(&model_cfg));

        let loaded = manager.load_model(model_cfg.init::<NdArray>(&device), &device).unwrap();
        assert_eq!(flat_weights(&model), flat_weights(&loaded));
    }

    #[test]
    fn test_missing_model_mentions_train() {
        let tmp     = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(tmp.path());
        let device  = Default::default();
        let model   = CharGptConfig::new(3, 4, 8, 2, 1).init::<NdArray>(&device);

        let err = manager.load_model(model, &device).unwrap_err();
        assert!(format!("{err:#}").contains("'train' first"));
    }

    #[test]
    fn test_config_round_trip() {
        let tmp     = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(tmp.path());
        let cfg     = TrainConfig { batch_size: 3, n_layer: 2, seed: Some(9), ..TrainConfig::default() };

        manager.save_config(&cfg).unwrap();
        assert_eq!(manager.load_config().unwrap(), cfg);
        assert_eq!(file_names(tmp.path()), vec!["train_config.json"]);
    }

    #[test]
    fn test_model_config_round_trip() {
        let tmp     = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(tmp.path());
        let cfg     = CharGptConfig::new(42, 16, 32, 4, 2).with_dropout(0.1);

        manager.save_model_config(&cfg).unwrap();
        let loaded = manager.load_model_config().unwrap();
        assert!(loaded.same_architecture(&cfg));
        assert_eq!(loaded.dropout, 0.1);
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(CheckpointManager::new(tmp.path()).load_config().is_err());
    }
}
