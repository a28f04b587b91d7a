// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends every loss estimate to a CSV file.
//
// Output file: checkpoints/metrics.csv
//
//   step,train_loss,val_loss
//   0,4.412300,4.413100
//   200,2.481700,2.502900
//   ...
//
// A resumed run keeps appending to the same file, so `step`
// restarts from 0 after each run.
//
// How to read the metrics:
//   - Both losses start near ln(vocab_size)
//   - val_loss rising while train_loss falls → overfitting
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::ml::trainer::LossEstimate;

const HEADER: &str = "step,train_loss,val_loss";

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Opens `{dir}/metrics.csv`, writing the header if the file is new.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &LossEstimate) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{},{:.6},{:.6}", m.step, m.train_loss, m.val_loss)?;

        tracing::debug!(
            "Logged step {}: train_loss={:.4}, val_loss={:.4}",
            m.step,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
