// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that define what the system works with:
// the character vocabulary, the tokenizer built on it, and the
// abstraction over where corpus text comes from.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// The sorted character set and the char <-> id tokenizer
pub mod vocabulary;

// Core abstractions (traits) that other layers implement
pub mod traits;
