use core::cmp::Ordering;
use std::{collections::VecDeque, fmt};

use thiserror::Error;

use crate::{
    compare::Comparator,
    node::{Link, NodeId},
    AvlTree,
};

/// A violated structural invariant, as reported by [`AvlTree::validate`].
///
/// Node positions refer to the node's index in ascending order.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("the root node has a parent link")]
    RootHasParent,

    #[error("node at position {position} does not link back to its parent")]
    ParentLink { position: usize },

    #[error("the tree links more nodes than were ever allocated; it contains a cycle")]
    Cycle,

    #[error("element at position {position} is not ordered after its predecessor")]
    OutOfOrder { position: usize },

    #[error(
        "node at position {position} records balance factor {recorded}, but its subtrees differ \
         by {actual}"
    )]
    BalanceMismatch {
        position: usize,
        recorded: i8,
        actual: isize,
    },

    #[error("node at position {position} is out of balance ({balance})")]
    Unbalanced { position: usize, balance: isize },

    #[error("the tree records {recorded} elements but {reachable} are reachable")]
    CountMismatch { recorded: usize, reachable: usize },

    #[error("height {height} lies outside of the AVL bounds {lower}..={upper}")]
    HeightOutOfBounds {
        height: usize,
        lower: usize,
        upper: usize,
    },
}

impl<T, C> AvlTree<T, C>
where
    C: Comparator<T>,
{
    /// Checks every structural invariant of the tree.
    ///
    /// This walks the whole tree and completes in _O(n)_ time.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant found.
    pub fn validate(&self) -> Result<(), InvariantError> {
        let Some(root) = self.root else {
            if self.len != 0 {
                return Err(InvariantError::CountMismatch {
                    recorded: self.len,
                    reachable: 0,
                });
            }
            return Ok(());
        };

        if self.arena[root].parent.is_some() {
            return Err(InvariantError::RootHasParent);
        }

        // In-order walk, checking links and order and recording every node's position.
        let mut order: Vec<NodeId> = Vec::with_capacity(self.len);
        let mut position = vec![usize::MAX; self.arena.capacity()];
        let mut stack = Vec::new();
        let mut opt_cur = Some(root);

        loop {
            while let Some(cur) = opt_cur {
                if stack.len() + order.len() >= self.arena.capacity() {
                    return Err(InvariantError::Cycle);
                }

                stack.push(cur);
                opt_cur = self.arena[cur].left();
            }

            let Some(cur) = stack.pop() else {
                break;
            };

            let pos = order.len();
            if let Some(&prev) = order.last() {
                let ordering = self
                    .cmp
                    .compare(&self.arena[prev].value, &self.arena[cur].value);
                if ordering != Ordering::Less {
                    return Err(InvariantError::OutOfOrder { position: pos });
                }
            }

            for child in self.arena[cur].children.into_iter().flatten() {
                if self.arena[child].parent != Some(cur) {
                    return Err(InvariantError::ParentLink { position: pos });
                }
            }

            position[cur.index()] = pos;
            order.push(cur);
            opt_cur = self.arena[cur].right();
        }

        if order.len() != self.len {
            return Err(InvariantError::CountMismatch {
                recorded: self.len,
                reachable: order.len(),
            });
        }

        // Heights, children before parents. A post-order is the reverse of a
        // (node, right, left) pre-order.
        let mut height = vec![0usize; self.arena.capacity()];
        let mut pre_order = Vec::with_capacity(order.len());
        let mut stack = vec![root];

        while let Some(cur) = stack.pop() {
            pre_order.push(cur);
            stack.extend(self.arena[cur].children.into_iter().flatten());
        }

        fn subtree_height(height: &[usize], link: Link) -> usize {
            link.map_or(0, |node| height[node.index()])
        }

        for &cur in pre_order.iter().rev() {
            let node = &self.arena[cur];
            let left = subtree_height(&height, node.left());
            let right = subtree_height(&height, node.right());

            let actual = right as isize - left as isize;
            let pos = position[cur.index()];

            if actual != isize::from(node.balance) {
                return Err(InvariantError::BalanceMismatch {
                    position: pos,
                    recorded: node.balance,
                    actual,
                });
            }

            if actual.abs() > 1 {
                return Err(InvariantError::Unbalanced {
                    position: pos,
                    balance: actual,
                });
            }

            height[cur.index()] = 1 + left.max(right);
        }

        let tree_height = height[root.index()];
        let (lower, upper) = self.height_bounds();
        if tree_height < lower || tree_height > upper {
            return Err(InvariantError::HeightOutOfBounds {
                height: tree_height,
                lower,
                upper,
            });
        }

        Ok(())
    }

    #[doc(hidden)]
    #[track_caller]
    pub fn assert_invariants(&self) {
        if let Err(error) = self.validate() {
            panic!("AVL invariant violated: {error}");
        }
    }
}

impl<T, C> AvlTree<T, C>
where
    T: fmt::Display,
{
    /// Writes the tree in graphviz `dot` format, labelling every node with its element and
    /// balance factor.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item {
            Node(NodeId),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for item in queue.drain(..).collect::<Vec<_>>() {
                let id = match item {
                    Item::Node(id) => id,
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let node = &self.arena[id];
                let idx = id.index();
                write!(
                    w,
                    "\"graph{name}-{idx}\" [label=\"{}:{}\"]; ",
                    node.value, node.balance
                )?;

                for child in node.children {
                    match child {
                        Some(child) => {
                            queue.push_back(Item::Node(child));
                            writeln!(
                                links,
                                "\"graph{name}-{idx}\" -> \"graph{name}-{}\";",
                                child.index()
                            )?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{idx}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
