//! Common trait for the mergeable heap implementations
//!
//! Both [`BinomialHeap`](crate::binomial::BinomialHeap) and
//! [`FibonacciHeap`](crate::fibonacci::FibonacciHeap) implement the [`Heap`]
//! trait, so tests and benchmarks can be written once against the trait and
//! instantiated per structure.
//!
//! The heaps are min-heaps over a single key type `T: Ord`. `insert` returns
//! an opaque [`Handle`] that addresses the inserted node for a later
//! `decrease_key` call.

use std::fmt;

/// Error type for heap operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// `pop` was called on an empty heap
    EmptyHeap,
    /// The new key passed to `decrease_key` is greater than the current key
    KeyNotDecreased,
    /// The handle refers to a node that has already been popped
    ///
    /// Only returned by implementations that can detect staleness; see the
    /// documentation of each handle type.
    StaleHandle,
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::EmptyHeap => write!(f, "pop from empty heap"),
            HeapError::KeyNotDecreased => {
                write!(f, "new key is greater than current key")
            }
            HeapError::StaleHandle => {
                write!(f, "handle is no longer valid (node was removed)")
            }
        }
    }
}

impl std::error::Error for HeapError {}

/// A handle to a node in a heap, used for `decrease_key`
///
/// Handles are addressing tokens, not owning references: they stay valid
/// until the node they refer to is popped or the owning heap is dropped.
/// They survive `merge` (nodes move between heaps without being reallocated).
pub trait Handle: Clone + PartialEq + Eq {}

/// Min-heap with union and decrease-key
///
/// # Example
///
/// ```rust
/// use mergeable_heaps::Heap;
/// use mergeable_heaps::fibonacci::FibonacciHeap;
///
/// let mut heap = FibonacciHeap::new();
/// let handle = heap.insert(5);
/// heap.insert(3);
/// heap.decrease_key(&handle, 1).unwrap();
/// assert_eq!(heap.find_min(), Some(&1));
/// assert_eq!(heap.pop(), Ok(1));
/// ```
pub trait Heap<T: Ord> {
    /// Handle type returned by `insert` and consumed by `decrease_key`
    type Handle: Handle;

    /// Creates a new empty heap
    fn new() -> Self;

    /// Returns the number of elements in the heap
    fn len(&self) -> usize;

    /// Returns true if the heap is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts a key, returning a handle for a later `decrease_key`
    fn insert(&mut self, key: T) -> Self::Handle;

    /// Returns a reference to the minimum key without removing it
    ///
    /// `None` if the heap is empty. O(1) for the Fibonacci heap (cached
    /// minimum), O(log n) for the binomial heap (root-list scan).
    fn find_min(&self) -> Option<&T>;

    /// Removes and returns the minimum key
    ///
    /// # Errors
    /// [`HeapError::EmptyHeap`] if the heap is empty.
    fn pop(&mut self) -> Result<T, HeapError>;

    /// Merges all of `other`'s nodes into `self`, draining `other`
    ///
    /// Afterwards `other` is an empty heap and may be reused as one.
    /// Handles into `other` keep addressing their nodes, which now live in
    /// `self`. O(1) for the Fibonacci heap, O(log n) for the binomial heap.
    fn merge(&mut self, other: &mut Self);

    /// Decreases the key of the node addressed by `handle` to `new_key`
    ///
    /// Both structures are decrease-only: increasing a key would break heap
    /// order without the restructuring logic present here.
    ///
    /// # Errors
    /// [`HeapError::KeyNotDecreased`] if `new_key` is greater than the
    /// node's current key (equal keys are accepted and rewritten).
    fn decrease_key(&mut self, handle: &Self::Handle, new_key: T) -> Result<(), HeapError>;
}
