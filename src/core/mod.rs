//! Low-level, allocation-free primitives.
//!
//! These types are intentionally compact and hash-friendly because deduction
//! works on dense per-square sets and bounded frontiers:
//!
//! - [`bitset`]: a fixed-width set over a small enum domain, packed in a `u64`.
//! - [`queue`]: a FIFO with a compile-time capacity bound for BFS frontiers.
//! - [`tristate`]: three-valued facts with monotone settle semantics.

pub mod bitset;
pub mod queue;
pub mod tristate;

pub use bitset::{BitIndex, BitSet};
pub use queue::Queue;
pub use tristate::Tristate;
