// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal per CLI command:
//
//   prepare  → gzip corpus to split text files + vocabulary
//   train    → fit the model, checkpoint it, print a sample
//   generate → load a checkpoint and continue a prompt
//
// Rules for this layer:
//   - No ML math or model code here
//   - Only workflow coordination and the run's console report
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The corpus preparation workflow
pub mod prepare_use_case;

// The training workflow
pub mod train_use_case;

// The text generation workflow
pub mod generate_use_case;
