// ============================================================
// Layer 4 — Encoded Corpus
// ============================================================
// Both splits held as flat token streams, ready for the window
// sampler. There are no samples or document boundaries here:
// batches are cut out of these streams at random offsets.
//
//   train_split.txt → encode → train: [t0, t1, ..., tN]
//   val_split.txt   → encode → val:   [v0, v1, ..., vM]

use std::fmt;

use crate::domain::vocabulary::{CharTokenizer, TokenizerError};

/// Which half of the corpus a batch is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Validation,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train      => write!(f, "train"),
            Split::Validation => write!(f, "val"),
        }
    }
}

/// The two flat token streams the model trains and evaluates on.
#[derive(Debug, Clone)]
pub struct EncodedCorpus {
    train: Vec<usize>,
    val:   Vec<usize>,
}

impl EncodedCorpus {
    pub fn new(train: Vec<usize>, val: Vec<usize>) -> Self {
        Self { train, val }
    }

    pub fn encode(
        tokenizer:  &CharTokenizer,
        train_text: &str,
        val_text:   &str,
    ) -> Result<Self, TokenizerError> {
        Ok(Self::new(tokenizer.encode(train_text)?, tokenizer.encode(val_text)?))
    }

    pub fn tokens(&self, split: Split) -> &[usize] {
        match split {
            Split::Train      => &self.train,
            Split::Validation => &self.val,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vocabulary::Vocabulary;

    #[test]
    fn test_encodes_both_splits() {
        let tok    = CharTokenizer::new(&Vocabulary::from_text("ab")).unwrap();
        let corpus = EncodedCorpus::encode(&tok, "aab", "ba").unwrap();
        assert_eq!(corpus.tokens(Split::Train), &[0, 0, 1]);
        assert_eq!(corpus.tokens(Split::Validation), &[1, 0]);
        assert_eq!(Split::Validation.to_string(), "val");
    }

    #[test]
    fn test_out_of_vocabulary_text_fails() {
        let tok = CharTokenizer::new(&Vocabulary::from_text("ab")).unwrap();
        assert!(EncodedCorpus::encode(&tok, "abc", "").is_err());
    }
}
