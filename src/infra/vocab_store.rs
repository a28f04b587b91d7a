// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Persists the sorted character set as plain text.
//
// Format: every character is followed by '\n', in sorted order.
// The reader walks the file two chars at a time, (char, '\n'),
// so a newline that is itself part of the vocabulary is written
// as "\n\n" and still reads back as one entry:
//
//   vocab {'\n', 'a', 'b'}  →  "\n\na\nb\n"
//
// Splitting on lines would lose that entry, so lines() is never
// used here.

use anyhow::{Context, Result};
use std::{
    fs,
    path::PathBuf,
};
use thiserror::Error;

use crate::domain::vocabulary::Vocabulary;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VocabFileError {
    #[error("entry {index} is {found:?} where a newline separator was expected")]
    MissingSeparator { index: usize, found: char },

    #[error("file ends in the middle of entry {index}")]
    Truncated { index: usize },

    #[error("character {ch:?} appears more than once or out of sorted order")]
    NotSorted { ch: char },
}

/// Render a vocabulary in the on-disk format.
pub fn to_vocab_text(vocab: &Vocabulary) -> String {
    let mut out = String::with_capacity(vocab.len() * 2);
    for &ch in vocab.chars() {
        out.push(ch);
        out.push('\n');
    }
    out
}

/// Parse the on-disk format back into a vocabulary.
pub fn parse_vocab_text(text: &str) -> Result<Vocabulary, VocabFileError> {
    let mut chars = Vec::new();
    let mut iter  = text.chars();

    while let Some(ch) = iter.next() {
        let index = chars.len();
        match iter.next() {
            Some('\n') => {}
            Some(found) => return Err(VocabFileError::MissingSeparator { index, found }),
            None => return Err(VocabFileError::Truncated { index }),
        }
        if chars.last().is_some_and(|&prev| prev >= ch) {
            return Err(VocabFileError::NotSorted { ch });
        }
        chars.push(ch);
    }

    Ok(Vocabulary::from_chars(chars))
}

/// Reads and writes the vocabulary file.
pub struct VocabStore {
    path: PathBuf,
}

impl VocabStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn save(&self, vocab: &Vocabulary) -> Result<()> {
        fs::write(&self.path, to_vocab_text(vocab))
            .with_context(|| format!("Cannot write vocabulary to '{}'", self.path.display()))?;
        tracing::debug!("Saved {} vocabulary entries to '{}'", vocab.len(), self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<Vocabulary> {
        let text = fs::read_to_string(&self.path).with_context(|| {
            format!(
                "Cannot read vocabulary from '{}'. Have you run 'prepare' first?",
                self.path.display()
            )
        })?;

        let vocab = parse_vocab_text(&text)
            .with_context(|| format!("Malformed vocabulary file '{}'", self.path.display()))?;
        tracing::debug!("Loaded {} vocabulary entries", vocab.len());
        Ok(vocab)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_has_separator_after_each_char() {
        let vocab = Vocabulary::from_text("ba");
        assert_eq!(to_vocab_text(&vocab), "a\nb\n");
    }

    #[test]
    fn test_newline_entry_survives() {
        let vocab = Vocabulary::from_text("line one\nline two\n");
        let text  = to_vocab_text(&vocab);
        assert!(text.starts_with("\n\n"));

        let parsed = parse_vocab_text(&text).unwrap();
        assert_eq!(parsed, vocab);
        assert!(parsed.chars().contains(&'\n'));
    }

    #[test]
    fn test_non_ascii_round_trip() {
        let vocab = Vocabulary::from_text("héllo wörld — ñ 日本");
        assert_eq!(parse_vocab_text(&to_vocab_text(&vocab)).unwrap(), vocab);
    }

    #[test]
    fn test_empty_file_is_empty_vocabulary() {
        assert!(parse_vocab_text("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_files() {
        assert_eq!(
            parse_vocab_text("ab\n").unwrap_err(),
            VocabFileError::MissingSeparator { index: 0, found: 'b' }
        );
        assert_eq!(
            parse_vocab_text("a\nb").unwrap_err(),
            VocabFileError::Truncated { index: 1 }
        );
        assert_eq!(
            parse_vocab_text("b\na\n").unwrap_err(),
            VocabFileError::NotSorted { ch: 'a' }
        );
    }

    #[test]
    fn test_store_round_trip_and_missing_file() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(tmp.path().join("vocab.txt"));

        let err = store.load().unwrap_err();
        assert!(format!("{err:#}").contains("'prepare' first"));

        let vocab = Vocabulary::from_text("hello\tworld\n");
        store.save(&vocab).unwrap();
        assert_eq!(store.load().unwrap(), vocab);
    }
}
