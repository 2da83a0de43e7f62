//! Ordered neighbor queries.
//!
//! All queries first descend from the root exactly like a lookup, remembering the path and the
//! direction taken at each ancestor. The nearest candidates on one side of the probe are then,
//! in order of increasing distance:
//!
//! 1. the exact match's subtree on that side, scanned from its innermost element outwards;
//! 2. each ancestor the descent passed on that side (deepest first), followed by that
//!    ancestor's own subtree on the same side.
//!
//! The scan stops at the first element the predicate accepts, so the cost is proportional to the
//! number of rejected candidates plus the tree height.

use core::cmp::Ordering;

use crate::{
    compare::Comparator,
    node::{Dir, Link, NodeId},
    AvlTree,
};

/// The neighborhood of a probe value, as returned by [`AvlTree::search_neighbors`].
#[derive(Debug, PartialEq, Eq)]
pub struct Neighbors<'tree, T> {
    /// The nearest accepted element ordered before the probe.
    pub before: Option<&'tree T>,
    /// The stored element equal to the probe. This is not subject to the predicate.
    pub equal: Option<&'tree T>,
    /// The nearest accepted element ordered after the probe.
    pub after: Option<&'tree T>,
}

impl<T> Clone for Neighbors<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Neighbors<'_, T> {}

// The path walked by a lookup.
struct Descent {
    // Each ancestor with the side the descent continued on.
    path: Vec<(NodeId, Dir)>,
    found: Link,
}

// A missing predicate accepts every element.
fn accepts<T>(predicate: Option<&dyn Fn(&T) -> bool>, value: &T) -> bool {
    predicate.map_or(true, |pred| pred(value))
}

impl<T, C> AvlTree<T, C>
where
    C: Comparator<T>,
{
    /// Returns the nearest element ordered strictly before `value` that satisfies `predicate`.
    ///
    /// A `predicate` of `None` accepts every element, making this the in-order predecessor of
    /// `value`. `value` itself need not be stored.
    pub fn search_before(&self, value: &T, predicate: Option<&dyn Fn(&T) -> bool>) -> Option<&T> {
        let descent = self.descend(value);

        self.neighbor_raw(&descent, Dir::Left, predicate)
            .map(|node| &self.arena[node].value)
    }

    /// Returns the nearest element ordered strictly after `value` that satisfies `predicate`.
    ///
    /// A `predicate` of `None` accepts every element, making this the in-order successor of
    /// `value`. `value` itself need not be stored.
    pub fn search_after(&self, value: &T, predicate: Option<&dyn Fn(&T) -> bool>) -> Option<&T> {
        let descent = self.descend(value);

        self.neighbor_raw(&descent, Dir::Right, predicate)
            .map(|node| &self.arena[node].value)
    }

    /// Returns both filtered neighbors of `value` along with the stored element equal to it, using
    /// a single descent.
    pub fn search_neighbors(
        &self,
        value: &T,
        predicate: Option<&dyn Fn(&T) -> bool>,
    ) -> Neighbors<'_, T> {
        let descent = self.descend(value);

        let value_of = move |node: NodeId| &self.arena[node].value;

        Neighbors {
            before: self.neighbor_raw(&descent, Dir::Left, predicate).map(value_of),
            equal: descent.found.map(value_of),
            after: self.neighbor_raw(&descent, Dir::Right, predicate).map(value_of),
        }
    }

    fn descend(&self, value: &T) -> Descent {
        let mut path = Vec::new();
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            let dir = match self.cmp.compare(value, &self.arena[cur].value) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => {
                    return Descent {
                        path,
                        found: Some(cur),
                    }
                }
                Ordering::Greater => Dir::Right,
            };

            path.push((cur, dir));
            opt_cur = self.arena[cur].child(dir);
        }

        Descent { path, found: None }
    }

    // Finds the nearest accepted node on `side` of the probe that produced `descent`.
    fn neighbor_raw(
        &self,
        descent: &Descent,
        side: Dir,
        predicate: Option<&dyn Fn(&T) -> bool>,
    ) -> Link {
        if let Some(found) = descent.found {
            if let Some(node) = self.scan_subtree(self.arena[found].child(side), side, predicate) {
                return Some(node);
            }
        }

        // An ancestor lies on `side` of the probe iff the descent turned away from `side` there.
        for &(ancestor, dir) in descent.path.iter().rev() {
            if dir == side {
                continue;
            }

            if accepts(predicate, &self.arena[ancestor].value) {
                return Some(ancestor);
            }

            let subtree = self.arena[ancestor].child(side);
            if let Some(node) = self.scan_subtree(subtree, side, predicate) {
                return Some(node);
            }
        }

        None
    }

    // Scans the subtree at `root` starting from the element furthest from `side` and moving
    // toward it, returning the first accepted node.
    fn scan_subtree(&self, root: Link, side: Dir, predicate: Option<&dyn Fn(&T) -> bool>) -> Link {
        let mut stack = Vec::new();
        let mut opt_cur = root;

        loop {
            while let Some(cur) = opt_cur {
                stack.push(cur);
                opt_cur = self.arena[cur].child(!side);
            }

            let cur = stack.pop()?;

            if accepts(predicate, &self.arena[cur].value) {
                return Some(cur);
            }

            opt_cur = self.arena[cur].child(side);
        }
    }
}
