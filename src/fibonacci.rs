//! Fibonacci Heap implementation
//!
//! A Fibonacci heap is a lazy mergeable min-heap with:
//! - O(1) insert, merge, and find_min
//! - O(1) amortized decrease_key (cut + cascading cut, bounded by mark bits)
//! - O(log n) amortized pop (consolidation happens only here)
//!
//! Roots are linked in a circular doubly linked list and the minimum root is
//! cached. Child lists are circular as well. Nodes are heap-owned boxes
//! addressed by raw pointers; the structure is single-threaded by
//! construction (`!Send`/`!Sync`).

use crate::traits::{Handle, Heap, HeapError};
use smallvec::SmallVec;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

/// Handle to a node in a [`FibonacciHeap`]
///
/// A plain pointer token: using a handle after its node was popped, after
/// the owning heap was dropped, or against a heap that never owned the node
/// is undefined behavior. Handles survive `merge` (nodes are spliced, never
/// reallocated).
pub struct FibonacciHandle<T> {
    node: NonNull<Node<T>>,
}

impl<T> Clone for FibonacciHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FibonacciHandle<T> {}

impl<T> PartialEq for FibonacciHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<T> Eq for FibonacciHandle<T> {}

impl<T> std::fmt::Debug for FibonacciHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FibonacciHandle")
            .field("node", &self.node)
            .finish()
    }
}

impl<T> Handle for FibonacciHandle<T> {}

struct Node<T> {
    key: T,
    parent: Option<NonNull<Node<T>>>,
    /// One designated child; its siblings are reached through `left`/`right`
    child: Option<NonNull<Node<T>>>,
    left: NonNull<Node<T>>,
    right: NonNull<Node<T>>,
    degree: usize,
    /// True once the node lost a child since it last became a child itself;
    /// cleared on cut and on link
    marked: bool,
}

/// Fibonacci Heap
///
/// # Example
///
/// ```rust
/// use mergeable_heaps::Heap;
/// use mergeable_heaps::fibonacci::FibonacciHeap;
///
/// let mut heap = FibonacciHeap::new();
/// let handle = heap.insert(5);
/// heap.decrease_key(&handle, 1).unwrap();
/// assert_eq!(heap.find_min(), Some(&1));
/// ```
pub struct FibonacciHeap<T: Ord> {
    min: Option<NonNull<Node<T>>>,
    len: usize,
    _own: PhantomData<Box<Node<T>>>,
}

impl<T: Ord> Drop for FibonacciHeap<T> {
    /// Frees every node by walking the root and child rings directly; no
    /// consolidation, O(n)
    fn drop(&mut self) {
        let min = match self.min.take() {
            Some(min) => min,
            None => return,
        };
        self.len = 0;
        unsafe {
            let mut stack: SmallVec<[NonNull<Node<T>>; 32]> = SmallVec::new();
            Self::collect_ring(&mut stack, min);
            while let Some(node) = stack.pop() {
                if let Some(child) = (*node.as_ptr()).child {
                    Self::collect_ring(&mut stack, child);
                }
                drop(Box::from_raw(node.as_ptr()));
            }
        }
    }
}

impl<T: Ord> Heap<T> for FibonacciHeap<T> {
    type Handle = FibonacciHandle<T>;

    fn new() -> Self {
        Self {
            min: None,
            len: 0,
            _own: PhantomData,
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    /// O(1): splices a singleton into the root list
    fn insert(&mut self, key: T) -> Self::Handle {
        let node = NonNull::from(Box::leak(Box::new(Node {
            key,
            parent: None,
            child: None,
            left: NonNull::dangling(), // set by push_root
            right: NonNull::dangling(),
            degree: 0,
            marked: false,
        })));
        unsafe { self.push_root(node) };
        self.len += 1;
        FibonacciHandle { node }
    }

    /// O(1): the cached minimum pointer is always valid when non-empty
    fn find_min(&self) -> Option<&T> {
        // SAFETY: the node is owned by the heap and cannot be freed while
        // `self` is borrowed.
        self.min.map(|min| unsafe { &(*min.as_ptr()).key })
    }

    /// Removes and returns the minimum key
    ///
    /// Promotes the minimum's children to roots, unlinks the minimum, and
    /// consolidates. This is the only operation that links trees together,
    /// paying off the debt left by insert/merge/decrease_key.
    fn pop(&mut self) -> Result<T, HeapError> {
        let z = self.min.ok_or(HeapError::EmptyHeap)?;
        unsafe {
            if let Some(child) = (*z.as_ptr()).child.take() {
                // snapshot the child ring before splicing rewrites it
                let mut children: SmallVec<[NonNull<Node<T>>; 8]> = SmallVec::new();
                let mut cur = child;
                loop {
                    children.push(cur);
                    cur = (*cur.as_ptr()).right;
                    if cur == child {
                        break;
                    }
                }
                for c in children {
                    (*c.as_ptr()).parent = None;
                    (*c.as_ptr()).marked = false;
                    self.push_root(c);
                }
            }

            let left = (*z.as_ptr()).left;
            let right = (*z.as_ptr()).right;
            if right == z {
                self.min = None;
            } else {
                (*left.as_ptr()).right = right;
                (*right.as_ptr()).left = left;
                self.min = Some(right);
                self.consolidate();
            }

            self.len -= 1;
            let node = Box::from_raw(z.as_ptr());
            Ok(node.key)
        }
    }

    /// O(1): splices `other`'s root ring into `self`'s, no consolidation
    ///
    /// `other` is drained and stays usable as an empty heap. Handles into
    /// `other` keep addressing their nodes, which now live in `self`.
    fn merge(&mut self, other: &mut Self) {
        let other_min = match other.min.take() {
            Some(min) => min,
            None => return,
        };
        let other_len = mem::take(&mut other.len);
        match self.min {
            None => self.min = Some(other_min),
            Some(self_min) => unsafe {
                let a = (*self_min.as_ptr()).left;
                let b = (*other_min.as_ptr()).left;
                (*a.as_ptr()).right = other_min;
                (*other_min.as_ptr()).left = a;
                (*b.as_ptr()).right = self_min;
                (*self_min.as_ptr()).left = b;
                if (*other_min.as_ptr()).key < (*self_min.as_ptr()).key {
                    self.min = Some(other_min);
                }
            },
        }
        self.len += other_len;
    }

    /// Amortized O(1): writes the key, cuts if heap order broke, cascades
    /// through marked ancestors, then refreshes the cached minimum
    fn decrease_key(&mut self, handle: &Self::Handle, new_key: T) -> Result<(), HeapError> {
        let x = handle.node;
        unsafe {
            if new_key > (*x.as_ptr()).key {
                return Err(HeapError::KeyNotDecreased);
            }
            (*x.as_ptr()).key = new_key;

            if let Some(parent) = (*x.as_ptr()).parent {
                if (*x.as_ptr()).key < (*parent.as_ptr()).key {
                    self.cut(x, parent);
                    self.cascading_cut(parent);
                }
            }

            if let Some(min) = self.min {
                if (*x.as_ptr()).key < (*min.as_ptr()).key {
                    self.min = Some(x);
                }
            }
        }
        Ok(())
    }
}

impl<T: Ord> FibonacciHeap<T> {
    /// Splices `node` into the root ring, updating the cached minimum
    ///
    /// `node`'s old `left`/`right` are overwritten unconditionally.
    unsafe fn push_root(&mut self, node: NonNull<Node<T>>) {
        match self.min {
            Some(min) => {
                let left = (*min.as_ptr()).left;
                (*node.as_ptr()).right = min;
                (*node.as_ptr()).left = left;
                (*left.as_ptr()).right = node;
                (*min.as_ptr()).left = node;
                if (*node.as_ptr()).key < (*min.as_ptr()).key {
                    self.min = Some(node);
                }
            }
            None => {
                (*node.as_ptr()).left = node;
                (*node.as_ptr()).right = node;
                self.min = Some(node);
            }
        }
    }

    /// Unifies tree degrees: afterwards at most one root per degree
    ///
    /// Walks a snapshot of the root ring (the ring is dismantled while
    /// linking), keeps one candidate per degree in a table, and links
    /// colliding roots with the larger key underneath, retrying the winner
    /// at its incremented degree. The root list is then rebuilt from the
    /// table and the minimum recomputed. The table grows on demand rather
    /// than trusting a precomputed log-based degree bound.
    unsafe fn consolidate(&mut self) {
        let start = match self.min {
            Some(start) => start,
            None => return,
        };
        let mut roots: SmallVec<[NonNull<Node<T>>; 32]> = SmallVec::new();
        let mut cur = start;
        loop {
            roots.push(cur);
            cur = (*cur.as_ptr()).right;
            if cur == start {
                break;
            }
        }

        let mut table: SmallVec<[Option<NonNull<Node<T>>>; 32]> = SmallVec::new();
        for root in roots {
            let mut x = root;
            loop {
                let degree = (*x.as_ptr()).degree;
                if table.len() <= degree {
                    table.resize(degree + 1, None);
                }
                match table[degree].take() {
                    Some(mut y) => {
                        // smaller key survives as root; the current survivor
                        // keeps the root role on equal keys
                        if (*y.as_ptr()).key < (*x.as_ptr()).key {
                            mem::swap(&mut x, &mut y);
                        }
                        self.link(y, x);
                    }
                    None => {
                        table[degree] = Some(x);
                        break;
                    }
                }
            }
        }

        self.min = None;
        for root in table.into_iter().flatten() {
            self.push_root(root);
        }
    }

    /// Makes `y` a child of `x`, clearing `y`'s mark
    ///
    /// `y` is not unspliced from the old root ring: consolidate rebuilds the
    /// root list wholesale, so every surviving node's `left`/`right` are
    /// rewritten anyway.
    unsafe fn link(&mut self, y: NonNull<Node<T>>, x: NonNull<Node<T>>) {
        (*y.as_ptr()).parent = Some(x);
        (*y.as_ptr()).marked = false;
        match (*x.as_ptr()).child {
            Some(child) => {
                let child_left = (*child.as_ptr()).left;
                (*y.as_ptr()).right = child;
                (*y.as_ptr()).left = child_left;
                (*child_left.as_ptr()).right = y;
                (*child.as_ptr()).left = y;
            }
            None => {
                (*x.as_ptr()).child = Some(y);
                (*y.as_ptr()).left = y;
                (*y.as_ptr()).right = y;
            }
        }
        (*x.as_ptr()).degree += 1;
    }

    /// Detaches `x` from `parent`'s child list and promotes it to a root,
    /// clearing its mark
    unsafe fn cut(&mut self, x: NonNull<Node<T>>, parent: NonNull<Node<T>>) {
        let left = (*x.as_ptr()).left;
        let right = (*x.as_ptr()).right;
        if right == x {
            (*parent.as_ptr()).child = None;
        } else {
            (*left.as_ptr()).right = right;
            (*right.as_ptr()).left = left;
            if (*parent.as_ptr()).child == Some(x) {
                (*parent.as_ptr()).child = Some(right);
            }
        }
        (*parent.as_ptr()).degree -= 1;
        (*x.as_ptr()).parent = None;
        (*x.as_ptr()).marked = false;
        self.push_root(x);
    }

    /// Pushes every node of the circular ring containing `start` onto
    /// `stack`, following `right` pointers once around
    unsafe fn collect_ring(
        stack: &mut SmallVec<[NonNull<Node<T>>; 32]>,
        start: NonNull<Node<T>>,
    ) {
        let mut cur = start;
        loop {
            stack.push(cur);
            cur = (*cur.as_ptr()).right;
            if cur == start {
                break;
            }
        }
    }

    /// Walks parent links upward after a cut: marked non-roots are cut in
    /// turn, the first unmarked non-root is marked and the walk stops
    ///
    /// An explicit loop, not recursion; it terminates at a root or at an
    /// unmarked node.
    unsafe fn cascading_cut(&mut self, start: NonNull<Node<T>>) {
        let mut node = start;
        while let Some(parent) = (*node.as_ptr()).parent {
            if !(*node.as_ptr()).marked {
                (*node.as_ptr()).marked = true;
                break;
            }
            self.cut(node, parent);
            node = parent;
        }
    }
}
