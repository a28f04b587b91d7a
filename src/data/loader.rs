// ============================================================
// Layer 4 — Gzip Corpus Loader
// ============================================================
// Reads a directory of gzip-compressed text files.
//
// Only regular files ending in `.gz` are picked up. The order in
// which they come back matters: the train/validation split is a
// prefix/suffix cut over this list, so it decides which files
// end up in which split.
//
//   FileOrder::Sorted   → by file name (reproducible everywhere)
//   FileOrder::Listing  → whatever `read_dir` yields; this is
//                         platform and filesystem dependent
//
// Decompressed bytes are decoded as UTF-8 according to a
// DecodePolicy:
//
//   DecodePolicy::Lossy   → invalid byte sequences are dropped
//                           and the count is logged
//   DecodePolicy::Strict  → the first invalid sequence fails
//                           the whole run
//
// Reference: flate2 crate documentation (GzDecoder)
//            Rust std `[u8]::utf8_chunks`

use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;

use crate::domain::traits::CorpusSource;

/// How undecodable bytes in a corpus file are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Drop invalid UTF-8 sequences and log how many bytes were lost.
    #[default]
    Lossy,
    /// Refuse files that are not valid UTF-8.
    Strict,
}

/// Order in which corpus files are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileOrder {
    /// Sort by file name.
    #[default]
    Sorted,
    /// Raw directory-listing order.
    Listing,
}

/// Loads `.gz` text files from a directory.
/// Implements the CorpusSource trait from Layer 3.
pub struct GzCorpusLoader {
    dir:    PathBuf,
    policy: DecodePolicy,
    order:  FileOrder,
}

impl GzCorpusLoader {
    pub fn new(dir: impl Into<PathBuf>, policy: DecodePolicy, order: FileOrder) -> Self {
        Self { dir: dir.into(), policy, order }
    }
}

impl CorpusSource for GzCorpusLoader {
    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read corpus directory '{}'", self.dir.display()))?
        {
            let entry = entry?;
            let path  = entry.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("gz") {
                files.push(path);
            }
        }

        if self.order == FileOrder::Sorted {
            files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        }

        tracing::debug!("Found {} .gz files in '{}'", files.len(), self.dir.display());
        Ok(files)
    }

    fn read_text(&self, path: &Path) -> Result<String> {
        let file = fs::File::open(path)
            .with_context(|| format!("Cannot open '{}'", path.display()))?;

        let mut bytes = Vec::new();
        GzDecoder::new(file)
            .read_to_end(&mut bytes)
            .with_context(|| format!("Cannot decompress '{}'", path.display()))?;

        decode_utf8(&bytes, self.policy)
            .with_context(|| format!("Cannot decode '{}' as UTF-8", path.display()))
            .map(|(text, dropped)| {
                if dropped > 0 {
                    tracing::warn!(
                        "Dropped {} undecodable bytes from '{}'",
                        dropped,
                        path.display()
                    );
                }
                text
            })
    }
}

/// Decode `bytes` as UTF-8 under `policy`.
/// Returns the text and the number of bytes that were dropped.
pub fn decode_utf8(bytes: &[u8], policy: DecodePolicy) -> Result<(String, usize)> {
    let mut text    = String::with_capacity(bytes.len());
    let mut dropped = 0usize;

    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());

        let invalid = chunk.invalid();
        if !invalid.is_empty() {
            if policy == DecodePolicy::Strict {
                bail!(
                    "invalid UTF-8 sequence {:02x?} after {} valid bytes",
                    invalid,
                    text.len()
                );
            }
            dropped += invalid.len();
        }
    }

    Ok((text, dropped))
}
