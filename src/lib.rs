//! A generic AVL tree over any totally ordered element type.
//!
//! The order is supplied by an injected [`Comparator`] rather than fixed to [`Ord`], which allows
//! a tree to be keyed on part of a record (see [`AvlTree::search`]) or ordered in reverse. Besides
//! the usual insert, remove and lookup in _O(log(n))_, the tree answers ordered neighbor queries
//! that may be filtered by a predicate (see [`AvlTree::search_before`]).

// Conventions used in comments follow the usual AVL presentation:
// - The balance factor of a node `x` is `b(x) = h(right(x)) - h(left(x))`, with `h(None) = 0`.
// - The AVL invariant requires `b(x) ∈ {-1, 0, 1}` for every node between public calls.
// - During retrace a node may transiently reach `b(x) = ±2`; exactly one single or double
//   rotation at `x` resolves it.
//
// Nodes live in an arena and refer to each other by index. The parent link is a back-reference
// used only for walking upwards.

use core::{cmp::Ordering, fmt, mem};

use log::trace;

pub mod compare;
mod debug;
mod iter;
mod node;
mod search;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use compare::{Comparator, FromLess, FromSign, Natural, Reverse};
pub use debug::InvariantError;
pub use iter::Iter;
pub use search::Neighbors;

use node::{Arena, Dir, Link, NodeId};

/// A height-balanced binary search tree.
///
/// Elements are kept unique under the comparator `C`; inserting an element that compares equal to
/// a stored one leaves the tree unchanged.
pub struct AvlTree<T, C = Natural> {
    arena: Arena<T>,
    root: Link,
    len: usize,
    cmp: C,
}

impl<T: Ord> AvlTree<T> {
    /// Returns a new empty tree ordered by `T`'s [`Ord`] implementation.
    pub const fn new() -> AvlTree<T> {
        AvlTree::with_comparator(Natural)
    }
}

impl<T: Ord> Default for AvlTree<T> {
    fn default() -> Self {
        AvlTree::new()
    }
}

impl<T, C> AvlTree<T, C> {
    /// Returns a new empty tree ordered by `cmp`.
    pub const fn with_comparator(cmp: C) -> AvlTree<T, C> {
        AvlTree {
            arena: Arena::new(),
            root: None,
            len: 0,
            cmp,
        }
    }

    /// Returns a reference to the tree's comparator.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        let empty = self.len == 0;
        debug_assert_eq!(empty, self.root.is_none());
        empty
    }

    /// Returns the number of elements in the tree.
    ///
    /// This operation completes in _O(1)_ time.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the element stored at the root, if any.
    pub fn root(&self) -> Option<&T> {
        self.root.map(|root| &self.arena[root].value)
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<&T> {
        let root = self.root?;
        Some(&self.arena[self.extreme_in_subtree(root, Dir::Left)].value)
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<&T> {
        let root = self.root?;
        Some(&self.arena[self.extreme_in_subtree(root, Dir::Right)].value)
    }

    /// Returns an iterator over the elements of the tree in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.arena, self.root, self.len)
    }

    /// Returns the elements of the tree as an ascending vector.
    ///
    /// The vector is rebuilt on every call.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Removes every element from the tree.
    pub fn clear(&mut self) {
        log::debug!("clearing tree of {} elements", self.len);

        self.arena.clear();
        self.root = None;
        self.len = 0;
    }

    /// Returns the height of the tree, counted in nodes along the longest root-to-leaf path.
    ///
    /// This walks the whole tree and completes in _O(n)_ time. It is meant for diagnostics.
    pub fn height(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };

        let mut max_height = 0;
        let mut stack = vec![(root, 1)];

        while let Some((node, height)) = stack.pop() {
            max_height = max_height.max(height);

            for child in self.arena[node].children.into_iter().flatten() {
                stack.push((child, height + 1));
            }
        }

        max_height
    }

    /// Returns the theoretical `(lower, upper)` bounds on the height of an AVL tree holding
    /// [`len()`](Self::len) elements.
    ///
    /// With `n` elements and the golden ratio `φ`, the bounds are `⌊log2(n + 1)⌋` and
    /// `⌈c·log2(n + 2) + b⌉ - 1` where `c = 1 / log2(φ)` and `b = (c / 2)·log2(5) - 2`.
    pub fn height_bounds(&self) -> (usize, usize) {
        let phi = (1.0 + 5f64.sqrt()) / 2.0;
        let c = 1.0 / phi.log2();
        let b = (c / 2.0) * 5f64.log2() - 2.0;

        let n = self.len as f64;

        let lower = (n + 1.0).log2().floor() as usize;
        let upper = ((c * (n + 2.0).log2() + b).ceil() as usize).saturating_sub(1);

        (lower, upper)
    }

    // Returns the leftmost or rightmost node below `root`.
    fn extreme_in_subtree(&self, root: NodeId, dir: Dir) -> NodeId {
        let mut cur = root;

        while let Some(next) = self.arena[cur].child(dir) {
            cur = next;
        }

        cur
    }

    fn which_child(&self, parent: NodeId, child: NodeId) -> Dir {
        if self.arena[parent].left() == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(
                self.arena[parent].right(),
                Some(child),
                "`child` must be a child of `parent`"
            );
            Dir::Right
        }
    }

    #[inline]
    fn maybe_set_parent(&mut self, opt_node: Link, parent: Link) {
        if let Some(node) = opt_node {
            self.arena[node].parent = parent;
        }
    }

    // Replaces the link to `old_child` held by `parent` (or by the tree, if `parent` is `None`)
    // with `new_child`.
    //
    // `new_child`'s parent link is not updated.
    fn replace_child_or_set_root(&mut self, parent: Link, old_child: NodeId, new_child: Link) {
        match parent {
            Some(parent) => {
                let dir = self.which_child(parent, old_child);
                self.arena[parent].set_child(dir, new_child);
            }
            None => self.root = new_child,
        }
    }

    // Performs a single rotation at `x`, whose `heavy` child `z` moves up to take its place.
    //
    // Returns `z`, the new root of the rotated subtree, already linked to `x`'s former parent.
    fn rotate_once(&mut self, x: NodeId, z: NodeId, heavy: Dir) -> NodeId {
        trace!("single rotation at {x:?} toward {:?}", !heavy);

        let parent = self.arena[x].parent;

        // `z`'s inner subtree moves across to `x`.
        let inner = self.arena[z].child(!heavy);
        self.arena[x].set_child(heavy, inner);
        self.maybe_set_parent(inner, Some(x));

        self.arena[z].set_child(!heavy, Some(x));
        self.arena[x].parent = Some(z);

        self.replace_child_or_set_root(parent, x, Some(z));
        self.arena[z].parent = parent;

        // A balanced heavy child only occurs while retracing a removal; the rotated subtree then
        // keeps its height.
        let sign = heavy.sign();
        if self.arena[z].balance == 0 {
            self.arena[x].balance = sign;
            self.arena[z].balance = -sign;
        } else {
            self.arena[x].balance = 0;
            self.arena[z].balance = 0;
        }

        z
    }

    // Performs a double rotation at `x` through its `heavy` child `z` and `z`'s inner child `y`.
    //
    // Returns `y`, the new root of the rotated subtree, already linked to `x`'s former parent.
    fn rotate_twice(&mut self, x: NodeId, z: NodeId, heavy: Dir) -> NodeId {
        let y = self.arena[z]
            .child(!heavy)
            .expect("double rotation requires an inner grandchild");

        trace!("double rotation at {x:?} through {y:?}");

        let parent = self.arena[x].parent;

        let across_z = self.arena[y].child(heavy);
        self.arena[z].set_child(!heavy, across_z);
        self.maybe_set_parent(across_z, Some(z));

        let across_x = self.arena[y].child(!heavy);
        self.arena[x].set_child(heavy, across_x);
        self.maybe_set_parent(across_x, Some(x));

        self.arena[y].set_child(heavy, Some(z));
        self.arena[y].set_child(!heavy, Some(x));
        self.arena[z].parent = Some(y);
        self.arena[x].parent = Some(y);

        self.replace_child_or_set_root(parent, x, Some(y));
        self.arena[y].parent = parent;

        let sign = heavy.sign();
        let (x_balance, z_balance) = match self.arena[y].balance {
            b if b == sign => (-sign, 0),
            0 => (0, 0),
            _ => (0, sign),
        };
        self.arena[x].balance = x_balance;
        self.arena[z].balance = z_balance;
        self.arena[y].balance = 0;

        y
    }
}

impl<T, C> AvlTree<T, C>
where
    C: Comparator<T>,
{
    fn find_raw(&self, value: &T) -> Link {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            match self.cmp.compare(value, &self.arena[cur].value) {
                Ordering::Less => opt_cur = self.arena[cur].left(),
                Ordering::Equal => return Some(cur),
                Ordering::Greater => opt_cur = self.arena[cur].right(),
            }
        }
    }

    /// Returns `true` if the tree holds an element equal to `value`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn contains(&self, value: &T) -> bool {
        self.find_raw(value).is_some()
    }

    /// Returns the stored element equal to `value`.
    ///
    /// When the comparator only looks at part of an element, this returns the stored record rather
    /// than the probe.
    pub fn search(&self, value: &T) -> Option<&T> {
        self.find_raw(value).map(|node| &self.arena[node].value)
    }

    /// Returns the element stored in the parent node of the element equal to `value`.
    ///
    /// Returns `None` if `value` is not in the tree or is stored at the root.
    pub fn parent(&self, value: &T) -> Option<&T> {
        let node = self.find_raw(value)?;
        let parent = self.arena[node].parent?;

        Some(&self.arena[parent].value)
    }

    /// Inserts `value` into the tree.
    ///
    /// Returns `false` and drops `value` if an equal element is already stored.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, value: T) -> bool {
        let Some(root) = self.root else {
            // Tree is empty. Set `value` as the root and return.
            self.root = Some(self.arena.alloc(value));
            self.len += 1;
            return true;
        };

        let mut parent = root;

        // Descend the tree, looking for a vacant child slot.
        let dir = loop {
            let dir = match self.cmp.compare(&value, &self.arena[parent].value) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return false,
                Ordering::Greater => Dir::Right,
            };

            match self.arena[parent].child(dir) {
                Some(child) => parent = child,
                None => break dir,
            }
        };

        let node = self.arena.alloc(value);
        self.arena[node].parent = Some(parent);
        self.arena[parent].set_child(dir, Some(node));

        self.retrace_inserted(node);
        self.len += 1;

        true
    }

    // Walks upwards from the freshly inserted leaf `node`, updating balance factors.
    //
    // Each iteration handles a parent `x` whose `grown` subtree just gained one level.
    fn retrace_inserted(&mut self, node: NodeId) {
        let mut z = node;

        while let Some(x) = self.arena[z].parent {
            let grown = self.which_child(x, z);
            let sign = grown.sign();
            let balance = self.arena[x].balance;

            if balance == sign {
                // `x` is temporarily ±2. After the rotation the subtree has its pre-insert
                // height again, so nothing above changes.
                if self.arena[z].balance == -sign {
                    self.rotate_twice(x, z, grown);
                } else {
                    self.rotate_once(x, z, grown);
                }
                return;
            }

            if balance == -sign {
                // The growth is absorbed at `x`.
                self.arena[x].balance = 0;
                return;
            }

            self.arena[x].balance = sign;
            z = x;
        }

        trace!("insertion grew the tree by one level");
    }

    /// Removes the element equal to `value` from the tree and returns it.
    ///
    /// Returns `None` if no such element is stored.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove(&mut self, value: &T) -> Option<T> {
        let node = self.find_raw(value)?;
        Some(self.remove_at(node))
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T> {
        let root = self.root?;
        let node = self.extreme_in_subtree(root, Dir::Left);
        Some(self.remove_at(node))
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T> {
        let root = self.root?;
        let node = self.extreme_in_subtree(root, Dir::Right);
        Some(self.remove_at(node))
    }

    fn remove_at(&mut self, node: NodeId) -> T {
        // A node with two children keeps its place; its in-order successor, which has no left
        // child, is unlinked instead and its value moves into `node` afterwards. Either way exactly
        // one node with at most one child is spliced out.
        let victim = match (self.arena[node].left(), self.arena[node].right()) {
            (Some(_), Some(right)) => self.extreme_in_subtree(right, Dir::Left),
            _ => node,
        };

        // Balance factors are evaluated against the shape before the splice.
        self.retrace_removed(victim);

        let parent = self.arena[victim].parent;
        let child = self.arena[victim].left().or(self.arena[victim].right());

        self.replace_child_or_set_root(parent, victim, child);
        self.maybe_set_parent(child, parent);

        let victim_node = &mut self.arena[victim];
        victim_node.parent = None;
        victim_node.children = [None; 2];

        let mut value = self.arena.release(victim);
        if victim != node {
            mem::swap(&mut self.arena[node].value, &mut value);
        }

        self.len -= 1;
        value
    }

    // Walks upwards from `node`, which is about to be spliced out, updating balance factors as if
    // its subtree had already lost one level.
    //
    // Unlike insertion, a rotation does not necessarily end the walk: if the sibling subtree was
    // balanced the rotated subtree keeps its height and the walk stops, otherwise the rotated
    // subtree is one level shorter and the walk continues from its new root.
    fn retrace_removed(&mut self, node: NodeId) {
        let mut n = node;

        while let Some(x) = self.arena[n].parent {
            let shrunk = self.which_child(x, n);
            let sign = shrunk.sign();
            let balance = self.arena[x].balance;

            if balance == -sign {
                // `x` is temporarily ±2 toward the other side.
                let heavy = !shrunk;
                let z = self.arena[x]
                    .child(heavy)
                    .expect("heavy side of an unbalanced node must be non-empty");
                let z_balance = self.arena[z].balance;

                n = if z_balance == sign {
                    self.rotate_twice(x, z, heavy)
                } else {
                    self.rotate_once(x, z, heavy)
                };

                if z_balance == 0 {
                    trace!("removal retrace stopped after rotation at {x:?}");
                    return;
                }

                continue;
            }

            if balance == 0 {
                // The loss is absorbed at `x`.
                self.arena[x].balance = -sign;
                return;
            }

            self.arena[x].balance = 0;
            n = x;
        }
    }
}

impl<T, C> Extend<T> for AvlTree<T, C>
where
    C: Comparator<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Ord> FromIterator<T> for AvlTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = AvlTree::new();
        tree.extend(iter);
        tree
    }
}

impl<'tree, T, C> IntoIterator for &'tree AvlTree<T, C> {
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug, C> fmt::Debug for AvlTree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
