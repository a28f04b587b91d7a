// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The corpus builder only needs two things from wherever the
// text lives: an ordered list of files, and the decoded text of
// one file. Keeping that behind a trait lets the prepare use
// case run against the gzip loader in production and against a
// plain in-memory source in tests.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::{Path, PathBuf};

use anyhow::Result;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can enumerate corpus files and decode them.
///
/// Implementations:
///   - GzCorpusLoader → a directory of `.gz` text files
pub trait CorpusSource {
    /// All corpus files, in the order they are split and concatenated.
    fn files(&self) -> Result<Vec<PathBuf>>;

    /// The decoded text content of one file.
    fn read_text(&self, path: &Path) -> Result<String>;
}
