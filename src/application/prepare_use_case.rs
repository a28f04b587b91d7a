// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Turns a directory of compressed text files into the three
// plain files that training reads:
//
//   Step 1: List .gz files             (Layer 4 - data)
//   Step 2: Split file list 90/10      (Layer 4 - data)
//   Step 3: Decompress + append each   (Layer 4 - data)
//           file to its split's output
//   Step 4: Collect distinct chars     (Layer 3 - domain)
//   Step 5: Write the vocabulary       (Layer 6 - infra)
//
// Files are split as whole units, never in the middle: a file's
// text lands entirely in train_split.txt or val_split.txt.
// Text is streamed file by file, so only one decompressed file
// is held in memory at a time.

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    collections::BTreeSet,
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::data::{
    dataset::Split,
    loader::{DecodePolicy, FileOrder, GzCorpusLoader},
    splitter::split_train_val,
};
use crate::domain::{traits::CorpusSource, vocabulary::Vocabulary};
use crate::infra::vocab_store::VocabStore;

pub const TRAIN_FILE: &str = "train_split.txt";
pub const VAL_FILE:   &str = "val_split.txt";
pub const VOCAB_FILE: &str = "vocab.txt";

/// Share of files that go to the training split.
const TRAIN_FRACTION: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct PrepareConfig {
    pub corpus_dir:    PathBuf,
    pub out_dir:       PathBuf,
    pub policy:        DecodePolicy,
    pub order:         FileOrder,
    pub show_progress: bool,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            corpus_dir:    PathBuf::from("corpus"),
            out_dir:       PathBuf::from("."),
            policy:        DecodePolicy::default(),
            order:         FileOrder::default(),
            show_progress: true,
        }
    }
}

/// Counts reported back to the CLI once preparation finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareReport {
    pub train_files: usize,
    pub val_files:   usize,
    pub train_chars: usize,
    pub val_chars:   usize,
    pub vocab:       Vocabulary,
}

pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    /// Read the configured gzip directory and write all outputs.
    pub fn execute(&self) -> Result<PrepareReport> {
        let cfg    = &self.config;
        let loader = GzCorpusLoader::new(&cfg.corpus_dir, cfg.policy, cfg.order);
        tracing::info!("Preparing corpus from '{}'", cfg.corpus_dir.display());
        self.run(&loader)
    }

    /// Same as `execute`, against any corpus source.
    pub fn run(&self, source: &dyn CorpusSource) -> Result<PrepareReport> {
        let cfg   = &self.config;
        let files = source.files()?;
        if files.is_empty() {
            bail!("No .gz files found in '{}'", cfg.corpus_dir.display());
        }

        // ── Step 2: Whole-file 90/10 split ────────────────────────────────────
        let (train_files, val_files) = split_train_val(files, TRAIN_FRACTION);
        tracing::info!(
            "Split: {} train files, {} validation files",
            train_files.len(),
            val_files.len()
        );

        fs::create_dir_all(&cfg.out_dir)
            .with_context(|| format!("Cannot create output directory '{}'", cfg.out_dir.display()))?;

        // ── Steps 3-4: Stream each split and gather its characters ───────────
        let mut chars = BTreeSet::new();
        let train_chars = self.write_split(
            source, Split::Train, &train_files, &cfg.out_dir.join(TRAIN_FILE), &mut chars,
        )?;
        let val_chars = self.write_split(
            source, Split::Validation, &val_files, &cfg.out_dir.join(VAL_FILE), &mut chars,
        )?;

        // ── Step 5: Vocabulary ────────────────────────────────────────────────
        let vocab = Vocabulary::from_chars(chars);
        VocabStore::new(cfg.out_dir.join(VOCAB_FILE)).save(&vocab)?;
        tracing::info!("Vocabulary: {} distinct characters", vocab.len());

        Ok(PrepareReport {
            train_files: train_files.len(),
            val_files:   val_files.len(),
            train_chars,
            val_chars,
            vocab,
        })
    }

    // Appends every file of one split to `out` and returns its char count.
    fn write_split(
        &self,
        source: &dyn CorpusSource,
        split:  Split,
        files:  &[PathBuf],
        out:    &Path,
        chars:  &mut BTreeSet<char>,
    ) -> Result<usize> {
        let file = fs::File::create(out)
            .with_context(|| format!("Cannot create '{}'", out.display()))?;
        let mut writer = BufWriter::new(file);
        let progress   = self.progress_bar(split, files.len())?;

        let mut count = 0usize;
        for path in files {
            let text = source.read_text(path)?;
            writer
                .write_all(text.as_bytes())
                .with_context(|| format!("Cannot write to '{}'", out.display()))?;

            for ch in text.chars() {
                chars.insert(ch);
                count += 1;
            }
            tracing::debug!("Appended '{}' to {} split", path.display(), split);
            progress.inc(1);
        }

        writer.flush()
            .with_context(|| format!("Cannot write to '{}'", out.display()))?;
        progress.finish_and_clear();
        Ok(count)
    }

    fn progress_bar(&self, split: Split, len: usize) -> Result<ProgressBar> {
        if !self.config.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let style = ProgressStyle::with_template("{prefix:>5} [{bar:40}] {pos}/{len} files {elapsed}")?
            .progress_chars("=> ");
        let pb = ProgressBar::new(len as u64).with_style(style);
        pb.set_prefix(split.to_string());
        Ok(pb)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory corpus keyed by file name.
    struct MemorySource {
        files: Vec<(PathBuf, String)>,
    }

    impl MemorySource {
        fn new(texts: &[&str]) -> Self {
            let files = texts
                .iter()
                .enumerate()
                .map(|(i, t)| (PathBuf::from(format!("{i:02}.gz")), t.to_string()))
                .collect();
            Self { files }
        }
    }

    impl CorpusSource for MemorySource {
        fn files(&self) -> Result<Vec<PathBuf>> {
            Ok(self.files.iter().map(|(p, _)| p.clone()).collect())
        }

        fn read_text(&self, path: &Path) -> Result<String> {
            let by_path: HashMap<_, _> = self.files.iter().cloned().collect();
            by_path
                .get(path)
                .cloned()
                .with_context(|| format!("no such file {}", path.display()))
        }
    }

    fn use_case(out_dir: &Path) -> PrepareUseCase {
        PrepareUseCase::new(PrepareConfig {
            out_dir:       out_dir.to_path_buf(),
            show_progress: false,
            ..PrepareConfig::default()
        })
    }

    #[test]
    fn test_ten_files_split_nine_to_one() {
        let tmp   = tempfile::tempdir().unwrap();
        let texts = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j\n"];
        let report = use_case(tmp.path()).run(&MemorySource::new(&texts)).unwrap();

        assert_eq!(report.train_files, 9);
        assert_eq!(report.val_files,   1);
        assert_eq!(fs::read_to_string(tmp.path().join(TRAIN_FILE)).unwrap(), "abcdefghi");
        assert_eq!(fs::read_to_string(tmp.path().join(VAL_FILE)).unwrap(),   "j\n");
        assert_eq!(report.train_chars, 9);
        assert_eq!(report.val_chars,   2);
    }

    #[test]
    fn test_vocabulary_is_exact_char_set_of_corpus() {
        let tmp   = tempfile::tempdir().unwrap();
        let texts = ["hello ", "wörld\n", "zzz", "ok"];
        let report = use_case(tmp.path()).run(&MemorySource::new(&texts)).unwrap();

        let expected: BTreeSet<char> = texts.concat().chars().collect();
        let actual:   BTreeSet<char> = report.vocab.chars().iter().copied().collect();
        assert_eq!(actual, expected);

        let stored = VocabStore::new(tmp.path().join(VOCAB_FILE)).load().unwrap();
        assert_eq!(stored, report.vocab);
    }

    #[test]
    fn test_single_file_goes_to_validation() {
        // floor(0.9 * 1) = 0 training files
        let tmp    = tempfile::tempdir().unwrap();
        let report = use_case(tmp.path()).run(&MemorySource::new(&["only"])).unwrap();

        assert_eq!(report.train_files, 0);
        assert_eq!(report.val_files,   1);
        assert_eq!(fs::read_to_string(tmp.path().join(TRAIN_FILE)).unwrap(), "");
    }

    #[test]
    fn test_empty_corpus_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(use_case(tmp.path()).run(&MemorySource::new(&[])).is_err());
    }

    #[test]
    fn test_execute_reads_gzip_directory_in_sorted_order() {
        use flate2::{write::GzEncoder, Compression};

        let corpus = tempfile::tempdir().unwrap();
        let out    = tempfile::tempdir().unwrap();
        for (name, text) in [("b.gz", "second"), ("a.gz", "first"), ("notes.txt", "skip me")] {
            let mut enc = GzEncoder::new(Vec::new(), Compression::default());
            enc.write_all(text.as_bytes()).unwrap();
            fs::write(corpus.path().join(name), enc.finish().unwrap()).unwrap();
        }

        let report = PrepareUseCase::new(PrepareConfig {
            corpus_dir:    corpus.path().to_path_buf(),
            out_dir:       out.path().to_path_buf(),
            show_progress: false,
            ..PrepareConfig::default()
        })
        .execute()
        .unwrap();

        // floor(0.9 * 2) = 1: "a.gz" trains, "b.gz" validates
        assert_eq!(report.train_files + report.val_files, 2);
        assert_eq!(fs::read_to_string(out.path().join(TRAIN_FILE)).unwrap(), "first");
        assert_eq!(fs::read_to_string(out.path().join(VAL_FILE)).unwrap(),   "second");
    }
}
