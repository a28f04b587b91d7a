// ============================================================
// Layer 3 — Vocabulary & Character Tokenizer
// ============================================================
// The vocabulary is the sorted set of distinct characters seen
// in the corpus. Its position in that sorted order IS the token
// id, so the mapping is dense: ids run 0..vocab_size.
//
//   chars:  ['\n', ' ', 'a', 'b']
//   ids:      0     1    2    3
//
// The tokenizer is the bidirectional lookup built on top of it.
// Encoding fails on a character the corpus never contained;
// there is no [UNK] fallback, so the vocabulary must be built
// from a superset of every text the model will see.
//
// Reference: Rust Book §8 (Hash Maps), §9 (Recoverable Errors)

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

/// Errors raised while mapping between text and token ids.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenizerError {
    #[error("character {ch:?} at position {position} is not in the vocabulary")]
    UnknownChar { ch: char, position: usize },

    #[error("token id {id} is out of range for a vocabulary of {vocab_size} characters")]
    InvalidIndex { id: usize, vocab_size: usize },

    #[error("the vocabulary is empty")]
    EmptyVocabulary,
}

/// Sorted, de-duplicated set of corpus characters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Vocabulary {
    chars: Vec<char>,
}

impl Vocabulary {
    /// Build a vocabulary from any collection of characters.
    /// Duplicates are removed and the result is sorted.
    pub fn from_chars(chars: impl IntoIterator<Item = char>) -> Self {
        let set: BTreeSet<char> = chars.into_iter().collect();
        Self { chars: set.into_iter().collect() }
    }

    /// Every distinct character of `text`.
    #[cfg(test)]
    pub fn from_text(text: &str) -> Self {
        Self::from_chars(text.chars())
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

// ─── CharTokenizer ────────────────────────────────────────────────────────────
/// Fixed char ↔ id mapping over a [`Vocabulary`].
#[derive(Debug, Clone)]
pub struct CharTokenizer {
    stoi: HashMap<char, usize>,
    itos: Vec<char>,
}

impl CharTokenizer {
    pub fn new(vocab: &Vocabulary) -> Result<Self, TokenizerError> {
        if vocab.is_empty() {
            return Err(TokenizerError::EmptyVocabulary);
        }
        let itos = vocab.chars().to_vec();
        let stoi = itos.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        Ok(Self { stoi, itos })
    }

    pub fn vocab_size(&self) -> usize {
        self.itos.len()
    }

    /// Text → token ids. Fails on the first out-of-vocabulary character.
    pub fn encode(&self, text: &str) -> Result<Vec<usize>, TokenizerError> {
        text.chars()
            .enumerate()
            .map(|(position, ch)| {
                self.stoi
                    .get(&ch)
                    .copied()
                    .ok_or(TokenizerError::UnknownChar { ch, position })
            })
            .collect()
    }

    /// Token ids → text.
    pub fn decode(&self, ids: &[usize]) -> Result<String, TokenizerError> {
        ids.iter()
            .map(|&id| {
                self.itos.get(id).copied().ok_or(TokenizerError::InvalidIndex {
                    id,
                    vocab_size: self.itos.len(),
                })
            })
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_is_sorted_and_unique() {
        let v = Vocabulary::from_text("banana\n");
        assert_eq!(v.chars(), &['\n', 'a', 'b', 'n']);
        assert!(v.chars().contains(&'n'));
        assert!(!v.chars().contains(&'z'));
    }

    #[test]
    fn test_ids_follow_sorted_order() {
        let tok = CharTokenizer::new(&Vocabulary::from_text("ba")).unwrap();
        assert_eq!(tok.encode("ab").unwrap(), vec![0, 1]);
        assert_eq!(tok.vocab_size(), 2);
    }

    #[test]
    fn test_round_trip() {
        let corpus = "Hello, wörld!\nThe quick brown fox — jumps.";
        let tok = CharTokenizer::new(&Vocabulary::from_text(corpus)).unwrap();
        let text = "Hello fox\nwörld";
        let ids = tok.encode(text).unwrap();
        assert_eq!(tok.decode(&ids).unwrap(), text);
    }

    #[test]
    fn test_unknown_char_is_reported_with_position() {
        let tok = CharTokenizer::new(&Vocabulary::from_text("abc")).unwrap();
        let err = tok.encode("abz").unwrap_err();
        assert_eq!(err, TokenizerError::UnknownChar { ch: 'z', position: 2 });
    }

    #[test]
    fn test_invalid_index() {
        let tok = CharTokenizer::new(&Vocabulary::from_text("ab")).unwrap();
        assert_eq!(
            tok.decode(&[0, 5]).unwrap_err(),
            TokenizerError::InvalidIndex { id: 5, vocab_size: 2 }
        );
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let err = CharTokenizer::new(&Vocabulary::default()).unwrap_err();
        assert_eq!(err, TokenizerError::EmptyVocabulary);
    }
}
