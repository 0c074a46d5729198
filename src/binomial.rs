//! Binomial Heap implementation
//!
//! A binomial heap is a forest of binomial trees with:
//! - O(log n) insert, pop, and merge
//! - O(log n) decrease_key (bubble-up, no cutting)
//! - O(log n) find_min (the minimum is not cached; the root list is scanned)
//!
//! # Algorithm Overview
//!
//! The roots form a sibling chain in strictly increasing degree order, with
//! at most one tree per degree. This mirrors the binary representation of
//! the heap size: a heap of n elements has a tree of degree k exactly when
//! bit k of n is set.
//!
//! **Binomial Tree Bₖ**: B₀ is a single node; Bₖ links two B_{k-1} trees.
//! A Bₖ tree has 2ᵏ nodes and its root has k children of degrees k-1..0.
//!
//! Merging two heaps works like binary addition: the two degree-sorted root
//! lists are interleaved, then a single left-to-right walk links adjacent
//! equal-degree trees, propagating the result as a carry.
//!
//! **Memory model**: strong references flow from roots downward (`child`,
//! `sibling`); `parent` links and handles are weak, so there are no
//! reference cycles and a popped node's handle can detect its own staleness.

use crate::traits::{Handle, Heap, HeapError};
use std::cell::RefCell;
use std::mem;
use std::rc::{Rc, Weak};

type NodeRef<T> = Rc<RefCell<Node<T>>>;
type Link<T> = Option<NodeRef<T>>;
type WeakNodeRef<T> = Weak<RefCell<Node<T>>>;

/// Handle to a node in a [`BinomialHeap`]
///
/// Holds a weak reference, so using a handle whose node was already popped
/// is detected and reported as [`HeapError::StaleHandle`].
///
/// Note that `decrease_key` restores heap order by swapping key values along
/// the parent chain, so after a decrease the handle may address a different
/// (larger) key than the one passed in. The handle addresses a node, not a
/// value.
pub struct BinomialHandle<T> {
    node: WeakNodeRef<T>,
}

impl<T> Clone for BinomialHandle<T> {
    fn clone(&self) -> Self {
        BinomialHandle {
            node: self.node.clone(),
        }
    }
}

impl<T> PartialEq for BinomialHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node.ptr_eq(&other.node)
    }
}

impl<T> Eq for BinomialHandle<T> {}

impl<T> std::fmt::Debug for BinomialHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinomialHandle")
            .field("valid", &(self.node.strong_count() > 0))
            .finish()
    }
}

impl<T> Handle for BinomialHandle<T> {}

/// Internal node of a binomial tree
///
/// A node of degree k has exactly k children, hung highest-degree-first:
/// `child` points at the most recently linked (largest) subtree and the
/// `sibling` chain under a parent runs in decreasing degree order. At the
/// root level the `sibling` chain runs in strictly increasing degree order.
struct Node<T> {
    key: T,
    /// Weak to avoid cycles; `None` for roots
    parent: Option<WeakNodeRef<T>>,
    child: Link<T>,
    sibling: Link<T>,
    /// Number of children; a Bₖ root has degree k
    degree: usize,
}

/// Binomial Heap
///
/// # Example
///
/// ```rust
/// use mergeable_heaps::Heap;
/// use mergeable_heaps::binomial::BinomialHeap;
///
/// let mut heap = BinomialHeap::new();
/// let handle = heap.insert(5);
/// heap.decrease_key(&handle, 1).unwrap();
/// assert_eq!(heap.find_min(), Some(&1));
/// ```
pub struct BinomialHeap<T: Ord> {
    /// Root list, strictly increasing degree order
    head: Link<T>,
    len: usize,
}

impl<T: Ord> Heap<T> for BinomialHeap<T> {
    type Handle = BinomialHandle<T>;

    fn new() -> Self {
        Self { head: None, len: 0 }
    }

    fn len(&self) -> usize {
        self.len
    }

    /// Inserts a key as a singleton B₀ tree and carries it into the forest
    ///
    /// O(log n): the singleton may cascade through one link per occupied
    /// degree, exactly like incrementing a binary counter.
    fn insert(&mut self, key: T) -> Self::Handle {
        let node = Rc::new(RefCell::new(Node {
            key,
            parent: None,
            child: None,
            sibling: None,
            degree: 0,
        }));
        let handle = BinomialHandle {
            node: Rc::downgrade(&node),
        };
        self.union(Some(node));
        self.len += 1;
        handle
    }

    fn find_min(&self) -> Option<&T> {
        let (_, min) = self.min_root()?;
        // SAFETY: the node is kept alive by the root list, which cannot
        // change while `self` is borrowed, and RefCell contents do not move.
        let ptr = min.as_ptr();
        unsafe { Some(&(*ptr).key) }
    }

    /// Removes and returns the minimum key
    ///
    /// Scans the roots for the minimum, detaches it, reverses its child
    /// list into a valid (degree-ascending) root list, and merges that back.
    fn pop(&mut self) -> Result<T, HeapError> {
        let (min_prev, min) = self.min_root().ok_or(HeapError::EmptyHeap)?;

        // Unlink the minimum root from the root list
        let after = min.borrow_mut().sibling.take();
        match min_prev {
            Some(prev) => prev.borrow_mut().sibling = after,
            None => self.head = after,
        }

        // Children hang highest-degree-first; reverse them and clear
        // parent links so they form a degree-ascending root list.
        let mut reversed: Link<T> = None;
        let mut cur = min.borrow_mut().child.take();
        while let Some(node) = cur {
            let next = node.borrow_mut().sibling.take();
            node.borrow_mut().parent = None;
            node.borrow_mut().sibling = reversed.take();
            reversed = Some(node);
            cur = next;
        }

        self.union(reversed);
        self.len -= 1;

        let node = Rc::try_unwrap(min)
            .ok()
            .expect("popped root should have no other strong references")
            .into_inner();
        Ok(node.key)
    }

    /// Merges `other` into `self`, draining it
    ///
    /// One interleave-merge of the two degree-sorted root lists plus one
    /// carry walk: O(log n). Node payloads are not copied; handles into
    /// `other` now address nodes owned by `self`.
    fn merge(&mut self, other: &mut Self) {
        if other.len == 0 {
            return;
        }
        let other_head = other.head.take();
        self.union(other_head);
        self.len += mem::take(&mut other.len);
    }

    /// Decreases the key of the node addressed by `handle`
    ///
    /// The tree shape never changes: the new key is written and then swapped
    /// upward along the parent chain until heap order holds. O(log n), the
    /// height of a binomial tree.
    fn decrease_key(&mut self, handle: &Self::Handle, new_key: T) -> Result<(), HeapError> {
        let node = handle.node.upgrade().ok_or(HeapError::StaleHandle)?;
        if new_key > node.borrow().key {
            return Err(HeapError::KeyNotDecreased);
        }
        node.borrow_mut().key = new_key;
        Self::bubble_up(&node);
        Ok(())
    }
}

impl<T: Ord> BinomialHeap<T> {
    /// Merges a degree-sorted root list into the forest and re-establishes
    /// the at-most-one-tree-per-degree invariant
    fn union(&mut self, other: Link<T>) {
        let merged = Self::merge_root_lists(self.head.take(), other);
        self.head = Self::coalesce(merged);
    }

    /// Stable interleave-merge of two root lists sorted by degree
    ///
    /// On equal degrees the node from the first list goes first, so the
    /// carry walk sees them adjacent in insertion order.
    fn merge_root_lists(mut a: Link<T>, mut b: Link<T>) -> Link<T> {
        let mut head: Link<T> = None;
        let mut tail: Link<T> = None;
        loop {
            let take_a = match (&a, &b) {
                (Some(x), Some(y)) => x.borrow().degree <= y.borrow().degree,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let node = if take_a {
                let node = a.take().expect("checked above");
                a = node.borrow_mut().sibling.take();
                node
            } else {
                let node = b.take().expect("checked above");
                b = node.borrow_mut().sibling.take();
                node
            };
            match &tail {
                Some(t) => t.borrow_mut().sibling = Some(Rc::clone(&node)),
                None => head = Some(Rc::clone(&node)),
            }
            tail = Some(node);
        }
        head
    }

    /// Carry walk over a degree-sorted root list
    ///
    /// Combines adjacent equal-degree trees left to right, exactly like
    /// carry propagation in binary addition. A produced carry has degree+1
    /// and may collide with the next tree; the look-ahead condition defers
    /// linking when three equal-degree trees are transiently adjacent, so
    /// the rightmost pair combines first.
    ///
    /// Tie-break: the earlier root becomes the parent only when its key is
    /// strictly smaller, so on equal keys the first-seen root becomes the
    /// child.
    fn coalesce(mut head: Link<T>) -> Link<T> {
        let mut x = match head.clone() {
            Some(x) => x,
            None => return None,
        };
        let mut prev: Link<T> = None;
        loop {
            let next = match x.borrow().sibling.clone() {
                Some(next) => next,
                None => break,
            };
            let x_degree = x.borrow().degree;
            let next_degree = next.borrow().degree;
            let third_same = next
                .borrow()
                .sibling
                .as_ref()
                .is_some_and(|s| s.borrow().degree == x_degree);

            if x_degree != next_degree || third_same {
                prev = Some(Rc::clone(&x));
                x = next;
            } else if x.borrow().key < next.borrow().key {
                // x absorbs its right neighbour and stays the current root
                x.borrow_mut().sibling = next.borrow_mut().sibling.take();
                Self::link(next, Rc::clone(&x));
            } else {
                // x becomes a child of its right neighbour
                match &prev {
                    Some(p) => p.borrow_mut().sibling = Some(Rc::clone(&next)),
                    None => head = Some(Rc::clone(&next)),
                }
                Self::link(Rc::clone(&x), Rc::clone(&next));
                x = next;
            }
        }
        head
    }

    /// Links two equal-degree trees: `child`'s root becomes the first child
    /// of `parent`'s root, whose degree grows by one
    fn link(child: NodeRef<T>, parent: NodeRef<T>) {
        let mut child_ref = child.borrow_mut();
        let mut parent_ref = parent.borrow_mut();
        child_ref.parent = Some(Rc::downgrade(&parent));
        child_ref.sibling = parent_ref.child.take();
        parent_ref.child = Some(Rc::clone(&child));
        parent_ref.degree += 1;
    }

    /// Scans the root list for the minimum, returning it with the root that
    /// precedes it (`None` if the minimum is the head)
    ///
    /// On equal keys the earliest root wins, keeping the scan deterministic.
    fn min_root(&self) -> Option<(Link<T>, NodeRef<T>)> {
        let head = self.head.as_ref()?;
        let mut min = Rc::clone(head);
        let mut min_prev: Link<T> = None;
        let mut prev = Rc::clone(head);
        let mut cur = head.borrow().sibling.clone();
        while let Some(node) = cur {
            if node.borrow().key < min.borrow().key {
                min = Rc::clone(&node);
                min_prev = Some(Rc::clone(&prev));
            }
            let next = node.borrow().sibling.clone();
            prev = node;
            cur = next;
        }
        Some((min_prev, min))
    }

    /// Restores heap order above `node` by swapping key values upward
    ///
    /// Values move, nodes do not: the binomial tree shape is preserved and
    /// no links change.
    fn bubble_up(node: &NodeRef<T>) {
        let mut current = Rc::clone(node);
        loop {
            let parent = match current.borrow().parent.as_ref().and_then(Weak::upgrade) {
                Some(parent) => parent,
                None => break,
            };
            if current.borrow().key >= parent.borrow().key {
                break;
            }
            {
                let mut current_ref = current.borrow_mut();
                let mut parent_ref = parent.borrow_mut();
                mem::swap(&mut current_ref.key, &mut parent_ref.key);
            }
            current = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Heap;

    /// Checks heap order, parent links, and the Bₖ shape of one tree,
    /// returning its node count
    fn check_tree(node: &NodeRef<i32>) -> usize {
        let node_ref = node.borrow();
        let mut count = 1;
        let mut children = 0;
        let mut cur = node_ref.child.clone();
        while let Some(child) = cur {
            assert!(child.borrow().key >= node_ref.key, "heap order violated");
            let parent = child
                .borrow()
                .parent
                .as_ref()
                .and_then(Weak::upgrade)
                .expect("child must have a live parent link");
            assert!(Rc::ptr_eq(&parent, node));
            count += check_tree(&child);
            children += 1;
            let next = child.borrow().sibling.clone();
            cur = next;
        }
        assert_eq!(children, node_ref.degree, "degree must equal child count");
        assert_eq!(count, 1 << node_ref.degree, "Bₖ tree must have 2ᵏ nodes");
        count
    }

    /// Checks the whole forest: degrees strictly increase along the root
    /// list and the tree sizes sum to len
    fn check_heap(heap: &BinomialHeap<i32>) {
        let mut total = 0;
        let mut last_degree: Option<usize> = None;
        let mut cur = heap.head.clone();
        while let Some(root) = cur {
            let degree = root.borrow().degree;
            if let Some(last) = last_degree {
                assert!(degree > last, "root degrees must strictly increase");
            }
            last_degree = Some(degree);
            assert!(root.borrow().parent.is_none());
            total += check_tree(&root);
            let next = root.borrow().sibling.clone();
            cur = next;
        }
        assert_eq!(total, heap.len);
    }

    #[test]
    fn insert_and_drain_sorted() {
        let mut heap = BinomialHeap::new();
        for key in [5, 3, 8, 1, 4] {
            heap.insert(key);
            check_heap(&heap);
        }
        assert_eq!(heap.find_min(), Some(&1));
        for expected in [1, 3, 4, 5, 8] {
            assert_eq!(heap.pop(), Ok(expected));
            check_heap(&heap);
        }
        assert_eq!(heap.len(), 0);
        assert_eq!(heap.pop(), Err(HeapError::EmptyHeap));
    }

    #[test]
    fn forest_matches_binary_representation() {
        let mut heap = BinomialHeap::new();
        for key in 0..13 {
            heap.insert(key);
        }
        // 13 = 0b1101: trees of degree 0, 2, 3
        let mut degrees = Vec::new();
        let mut cur = heap.head.clone();
        while let Some(root) = cur {
            degrees.push(root.borrow().degree);
            let next = root.borrow().sibling.clone();
            cur = next;
        }
        assert_eq!(degrees, vec![0, 2, 3]);
        check_heap(&heap);
    }

    #[test]
    fn decrease_key_bubbles_up() {
        let mut heap = BinomialHeap::new();
        let mut handles = Vec::new();
        for key in 0..16 {
            handles.push(heap.insert(key * 10));
        }
        heap.decrease_key(&handles[15], 5).unwrap();
        check_heap(&heap);
        assert_eq!(heap.find_min(), Some(&0));
        assert_eq!(heap.pop(), Ok(0));
        assert_eq!(heap.pop(), Ok(5));
        check_heap(&heap);
    }

    #[test]
    fn decrease_key_rejects_increase() {
        let mut heap = BinomialHeap::new();
        let handle = heap.insert(10);
        heap.insert(20);
        assert_eq!(
            heap.decrease_key(&handle, 11),
            Err(HeapError::KeyNotDecreased)
        );
        // equal key is accepted
        assert_eq!(heap.decrease_key(&handle, 10), Ok(()));
        check_heap(&heap);
        assert_eq!(heap.pop(), Ok(10));
    }

    /// Bubble-up moves key values between nodes, so after overlapping
    /// decreases a handle's node may hold a different key than the one last
    /// written through that handle
    #[test]
    fn decrease_key_swaps_values_between_nodes() {
        let mut heap = BinomialHeap::new();
        let h1 = heap.insert(100);
        let h2 = heap.insert(200);
        let h3 = heap.insert(300);
        // forest: B₀(300), B₁(100 with child 200)

        heap.decrease_key(&h3, 150).unwrap();
        assert_eq!(heap.find_min(), Some(&100));

        // 50 bubbles out of h2's node into h1's root node
        heap.decrease_key(&h2, 50).unwrap();
        assert_eq!(heap.find_min(), Some(&50));

        // h1's node now holds 50; writing 25 through h1 replaces it
        heap.decrease_key(&h1, 25).unwrap();
        check_heap(&heap);
        assert_eq!(heap.pop(), Ok(25));
        assert_eq!(heap.pop(), Ok(100));
        assert_eq!(heap.pop(), Ok(150));
        assert!(heap.is_empty());
    }

    #[test]
    fn stale_handle_detected() {
        let mut heap = BinomialHeap::new();
        let handle = heap.insert(1);
        heap.insert(2);
        assert_eq!(heap.pop(), Ok(1));
        assert_eq!(heap.decrease_key(&handle, 0), Err(HeapError::StaleHandle));
    }

    #[test]
    fn merge_drains_other() {
        let mut a = BinomialHeap::new();
        let mut b = BinomialHeap::new();
        for key in [9, 4, 7] {
            a.insert(key);
        }
        for key in [6, 2, 8, 11] {
            b.insert(key);
        }
        a.merge(&mut b);
        check_heap(&a);
        assert_eq!(a.len(), 7);
        assert_eq!(b.len(), 0);
        assert!(b.is_empty());
        assert_eq!(a.find_min(), Some(&2));

        // the drained heap is a fresh, usable empty heap
        b.insert(1);
        assert_eq!(b.pop(), Ok(1));
    }

    #[test]
    fn handles_survive_merge() {
        let mut a = BinomialHeap::new();
        let mut b = BinomialHeap::new();
        a.insert(50);
        let handle = b.insert(40);
        a.merge(&mut b);
        a.decrease_key(&handle, 7).unwrap();
        check_heap(&a);
        assert_eq!(a.find_min(), Some(&7));
    }

    #[test]
    fn interleaved_ops_keep_invariants() {
        let mut heap = BinomialHeap::new();
        let mut handles = Vec::new();
        for i in 0..100u32 {
            // deterministic scatter
            let key = ((i.wrapping_mul(2654435761)) % 1000) as i32;
            handles.push((heap.insert(key), key));
            if i % 7 == 6 {
                heap.pop().unwrap();
                check_heap(&heap);
            }
        }
        check_heap(&heap);
        let mut last = i32::MIN;
        while let Ok(key) = heap.pop() {
            assert!(key >= last);
            last = key;
        }
        assert!(heap.is_empty());
    }
}
