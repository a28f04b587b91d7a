// ============================================================
// Layer 4 — Window Batcher
// ============================================================
// Implements Burn's Batcher trait to turn sampled windows into
// tensors the model can consume.
//
//   Input:  Vec of N Windows, each with block_size tokens
//   Output: WindowBatch with two [N, block_size] Int tensors
//
// All windows share one length, so the ids are flattened
// row-major into a single Vec and reshaped:
//   [w1_t1, ..., w1_tW, w2_t1, ..., wN_tW] → [N, W]
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::sampler::Window;

/// A batch of windows ready for the forward pass.
#[derive(Debug, Clone)]
pub struct WindowBatch<B: Backend> {
    /// Context tokens, shape [batch_size, block_size]
    pub inputs: Tensor<B, 2, Int>,

    /// Next-token targets, shape [batch_size, block_size]
    pub targets: Tensor<B, 2, Int>,
}

/// Holds the device so tensors are created in the right place.
#[derive(Clone, Debug)]
pub struct WindowBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> WindowBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<Window, WindowBatch<B>> for WindowBatcher<B> {
    fn batch(&self, items: Vec<Window>) -> WindowBatch<B> {
        let batch_size = items.len();
        let block_size = items.first().map_or(0, |w| w.input.len());

        // Burn builds Int tensors from i32 slices
        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|w| w.input.iter().map(|&t| t as i32))
            .collect();
        let target_flat: Vec<i32> = items
            .iter()
            .flat_map(|w| w.target.iter().map(|&t| t as i32))
            .collect();

        let inputs = Tensor::<B, 1, Int>::from_ints(input_flat.as_slice(), &self.device)
            .reshape([batch_size, block_size]);
        let targets = Tensor::<B, 1, Int>::from_ints(target_flat.as_slice(), &self.device)
            .reshape([batch_size, block_size]);

        WindowBatch { inputs, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let batcher = WindowBatcher::<NdArray>::new(Default::default());
        let batch = batcher.batch(vec![
            Window { input: vec![0, 1, 2], target: vec![1, 2, 3] },
            Window { input: vec![4, 5, 6], target: vec![5, 6, 7] },
        ]);

        assert_eq!(batch.inputs.dims(),  [2, 3]);
        assert_eq!(batch.targets.dims(), [2, 3]);

        let targets: Vec<i64> = batch.targets.into_data().iter::<i64>().collect();
        assert_eq!(targets, vec![1, 2, 3, 5, 6, 7]);
    }
}
