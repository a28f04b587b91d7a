// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the disk on behalf of the other
// layers:
//
//   checkpoint.rs  — Saving and loading model weights
//                    Uses Burn's NamedMpkFileRecorder at full
//                    precision so a resumed run continues from
//                    exactly the saved weights. Also saves/loads
//                    TrainConfig as JSON so `generate` can
//                    rebuild the model.
//
//   vocab_store.rs — Vocabulary persistence
//                    Writes the sorted character set produced by
//                    `prepare` and reads it back for `train` and
//                    `generate`, so both see the same ids.
//
//   metrics.rs     — Loss logging
//                    Appends every train/val loss estimate to a
//                    CSV file for plotting learning curves.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary file reading and writing
pub mod vocab_store;

/// Loss estimate CSV logger
pub mod metrics;
