// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Cuts an ordered list into a training prefix and a validation
// suffix. There is no shuffling: the same input order always
// gives the same split, and every item lands in exactly one
// of the two halves.
//
//   split_at = floor(len * train_fraction)
//
//   10 files, 0.9 → 9 train, 1 validation
//    5 files, 0.9 → 4 train, 1 validation   (4.5 floors to 4)
//
// Reference: Rust Book §8 (Vectors)

/// Split `items` into (train, validation) at floor(len × train_fraction).
pub fn split_train_val<T>(mut items: Vec<T>, train_fraction: f64) -> (Vec<T>, Vec<T>) {
    let total    = items.len();
    let split_at = ((total as f64) * train_fraction).floor() as usize;

    // Clamp to valid range so fractions above 1.0 cannot panic
    let split_at = split_at.min(total);

    // After this: items = [0..split_at], val = [split_at..total]
    let val = items.split_off(split_at);

    tracing::debug!("Split: {} training, {} validation", items.len(), val.len());

    (items, val)
}
