use core::iter::FusedIterator;

use crate::node::{Arena, Dir, Link, NodeId};

/// An in-order iterator over the elements of an [`AvlTree`](crate::AvlTree).
///
/// The iterator keeps the path of pending ancestors on an explicit stack, so its memory use is
/// bounded by the tree height.
pub struct Iter<'tree, T> {
    arena: &'tree Arena<T>,

    // Left spine still to be yielded, deepest last.
    stack: Vec<NodeId>,

    len: usize,
}

impl<'tree, T> Iter<'tree, T> {
    pub(crate) fn new(arena: &'tree Arena<T>, root: Link, len: usize) -> Self {
        let mut iter = Iter {
            arena,
            stack: Vec::new(),
            len,
        };

        iter.push_spine(root);
        iter
    }

    // Upon entering a new subtree, stack up the path to its minimum element.
    fn push_spine(&mut self, mut opt_cur: Link) {
        while let Some(cur) = opt_cur {
            self.stack.push(cur);
            opt_cur = self.arena[cur].child(Dir::Left);
        }
    }
}

impl<'tree, T> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        let cur = self.stack.pop()?;

        // The left subtree of `cur` has been exhausted; its right subtree comes next.
        self.push_spine(arena[cur].child(Dir::Right));
        self.len -= 1;

        Some(&arena[cur].value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            arena: self.arena,
            stack: self.stack.clone(),
            len: self.len,
        }
    }
}
