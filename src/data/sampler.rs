// ============================================================
// Layer 4 — Random Window Sampler
// ============================================================
// Draws training examples straight out of one long token stream.
//
// Every example is a window of `block_size` consecutive tokens
// plus the same window shifted right by one: the target at
// position i is simply the token that follows input position i:
//
//   stream:  a a b b a
//   start=1: input  [a b]
//            target [b b]
//
// Start offsets are uniform over [0, len - block_size), drawn
// independently per example. Windows may overlap, within a batch
// and across calls; this is language-model sampling, not epochs.
//
// Reference: rand crate documentation (Rng::gen_range)

use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SamplerError {
    #[error("sequence of {len} tokens is too short for a window of {block_size}; it needs at least one token more than the window")]
    SequenceTooShort { len: usize, block_size: usize },

    #[error("block size and batch size must both be at least 1")]
    EmptyShape,
}

/// One input/target pair, both `block_size` tokens long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub input:  Vec<usize>,
    pub target: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct WindowSampler {
    block_size: usize,
    batch_size: usize,
}

impl WindowSampler {
    pub fn new(block_size: usize, batch_size: usize) -> Result<Self, SamplerError> {
        if block_size == 0 || batch_size == 0 {
            return Err(SamplerError::EmptyShape);
        }
        Ok(Self { block_size, batch_size })
    }

    /// Draw `batch_size` random windows from `tokens`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        tokens: &[usize],
        rng:    &mut R,
    ) -> Result<Vec<Window>, SamplerError> {
        if tokens.len() <= self.block_size {
            return Err(SamplerError::SequenceTooShort {
                len:        tokens.len(),
                block_size: self.block_size,
            });
        }

        let max_start = tokens.len() - self.block_size;
        let windows = (0..self.batch_size)
            .map(|_| {
                let start = rng.gen_range(0..max_start);
                Window {
                    input:  tokens[start..start + self.block_size].to_vec(),
                    target: tokens[start + 1..start + self.block_size + 1].to_vec(),
                }
            })
            .collect();

        Ok(windows)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_target_is_input_shifted_by_one() {
        let tokens: Vec<usize> = (0..100).map(|i| (i * 7) % 13).collect();
        let sampler = WindowSampler::new(8, 16).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let batch = sampler.sample(&tokens, &mut rng).unwrap();
        assert_eq!(batch.len(), 16);
        for w in &batch {
            assert_eq!(w.input.len(),  8);
            assert_eq!(w.target.len(), 8);
            assert_eq!(&w.input[1..], &w.target[..7]);
        }
    }

    #[test]
    fn test_two_char_corpus_only_yields_real_substrings() {
        // vocab {a:0, b:1}, corpus "aabba", window 2, batch 1
        let tokens  = vec![0, 0, 1, 1, 0];
        let sampler = WindowSampler::new(2, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let allowed = [
            (vec![0, 0], vec![0, 1]),
            (vec![0, 1], vec![1, 1]),
            (vec![1, 1], vec![1, 0]),
        ];
        for _ in 0..200 {
            let batch = sampler.sample(&tokens, &mut rng).unwrap();
            let w     = &batch[0];
            assert!(
                allowed.contains(&(w.input.clone(), w.target.clone())),
                "unexpected window {:?}",
                w
            );
        }
    }

    #[test]
    fn test_exact_minimum_length() {
        let sampler = WindowSampler::new(4, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let batch   = sampler.sample(&[1, 2, 3, 4, 5], &mut rng).unwrap();
        for w in batch {
            assert_eq!(w.input,  vec![1, 2, 3, 4]);
            assert_eq!(w.target, vec![2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_too_short_fails() {
        let sampler = WindowSampler::new(4, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            sampler.sample(&[1, 2, 3, 4], &mut rng).unwrap_err(),
            SamplerError::SequenceTooShort { len: 4, block_size: 4 }
        );
    }

    #[test]
    fn test_zero_shape_rejected() {
        assert_eq!(WindowSampler::new(0, 4).unwrap_err(), SamplerError::EmptyShape);
        assert_eq!(WindowSampler::new(4, 0).unwrap_err(), SamplerError::EmptyShape);
    }
}
