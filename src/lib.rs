//! Mergeable priority queues for Rust
//!
//! This crate provides two mergeable min-heap data structures with
//! `decrease_key` support:
//!
//! - **Binomial Heap**: O(log n) insert, pop, merge, and decrease_key
//! - **Fibonacci Heap**: O(1) insert and merge, O(1) amortized decrease_key,
//!   O(log n) amortized pop
//!
//! Both are generic over a totally ordered key type and expose the same
//! surface through the [`Heap`] trait: insertion (returning a handle),
//! minimum lookup, extraction of the minimum, in-place key decrease through
//! the handle, and heap union that drains the merged-in heap without copying
//! its nodes.
//!
//! The structures are single-threaded; wrap them in external synchronization
//! if shared access is needed.
//!
//! # Example
//!
//! ```rust
//! use mergeable_heaps::Heap;
//! use mergeable_heaps::binomial::BinomialHeap;
//!
//! let mut heap = BinomialHeap::new();
//! let handle = heap.insert(5);
//! heap.insert(3);
//! heap.decrease_key(&handle, 1).unwrap();
//! assert_eq!(heap.find_min(), Some(&1));
//! assert_eq!(heap.pop(), Ok(1));
//! ```

pub mod binomial;
pub mod fibonacci;
pub mod traits;

pub use traits::{Handle, Heap, HeapError};
