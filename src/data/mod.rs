// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from compressed corpus files to tensor batches.
//
//   *.gz files
//       │
//       ▼
//   GzCorpusLoader    → lists files, decompresses, decodes UTF-8
//       │
//       ▼
//   split_train_val   → 90/10 prefix/suffix cut over the file list
//       │
//       ▼
//   (prepare writes train/val text + vocab; train reads them back)
//       │
//       ▼
//   EncodedCorpus     → both splits as flat token streams
//       │
//       ▼
//   WindowSampler     → random fixed-length input/target windows
//       │
//       ▼
//   WindowBatcher     → stacks windows into [N, W] tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Lists and decompresses `.gz` corpus files
pub mod loader;

/// Deterministic prefix/suffix train/validation split
pub mod splitter;

/// The encoded train and validation token streams
pub mod dataset;

/// Uniform random window sampling over a token stream
pub mod sampler;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
