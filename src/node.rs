use core::{
    fmt, mem,
    ops::{Index, IndexMut, Not},
};

/// A stable handle to a node stored in an [`Arena`].
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) type Link = Option<NodeId>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    /// The balance factor contribution of growth on this side.
    #[inline]
    pub(crate) fn sign(self) -> i8 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
        }
    }
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

pub(crate) struct Node<T> {
    pub(crate) value: T,
    // height(right) - height(left)
    pub(crate) balance: i8,
    pub(crate) parent: Link,
    pub(crate) children: [Link; 2],
}

impl<T> Node<T> {
    fn new(value: T) -> Node<T> {
        Node {
            value,
            balance: 0,
            parent: None,
            children: [None; 2],
        }
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Link {
        self.children[dir as usize]
    }

    #[inline]
    pub(crate) fn left(&self) -> Link {
        self.child(Dir::Left)
    }

    #[inline]
    pub(crate) fn right(&self) -> Link {
        self.child(Dir::Right)
    }

    #[inline]
    pub(crate) fn set_child(&mut self, dir: Dir, child: Link) -> Link {
        mem::replace(&mut self.children[dir as usize], child)
    }
}

enum Slot<T> {
    Occupied(Node<T>),
    // Next vacant slot in the free list.
    Vacant(Link),
}

/// Backing storage for the nodes of a single tree.
///
/// Children and parents refer to each other by [`NodeId`], so the structure owns no reference
/// cycles and can be torn down by dropping the slot vector.
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Link,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Arena<T> {
        Arena {
            slots: Vec::new(),
            free: None,
        }
    }

    /// Returns the number of slots, occupied or not. Every live `NodeId` indexes below this.
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Stores `value` in a fresh, unlinked node with balance 0.
    pub(crate) fn alloc(&mut self, value: T) -> NodeId {
        let node = Node::new(value);

        match self.free {
            Some(id) => {
                let slot = mem::replace(&mut self.slots[id.index()], Slot::Occupied(node));
                self.free = match slot {
                    Slot::Vacant(next) => next,
                    Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
                };
                id
            }
            None => {
                let id = NodeId(
                    u32::try_from(self.slots.len()).expect("arena exceeded u32::MAX nodes"),
                );
                self.slots.push(Slot::Occupied(node));
                id
            }
        }
    }

    /// Vacates the slot of `id`, returning the value it held.
    ///
    /// The node must already be unlinked from the tree.
    pub(crate) fn release(&mut self, id: NodeId) -> T {
        match mem::replace(&mut self.slots[id.index()], Slot::Vacant(self.free)) {
            Slot::Occupied(node) => {
                debug_assert!(node.parent.is_none() && node.children == [None; 2]);
                self.free = Some(id);
                node.value
            }
            Slot::Vacant(_) => panic!("released vacant node {id:?}"),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free = None;
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = Node<T>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<T> {
        match &self.slots[id.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant(_) => panic!("dangling node handle {id:?}"),
        }
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match &mut self.slots[id.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant(_) => panic!("dangling node handle {id:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_slots_are_reused() {
        let mut arena = Arena::new();

        let a = arena.alloc('a');
        let b = arena.alloc('b');
        assert_eq!(arena.capacity(), 2);

        assert_eq!(arena.release(a), 'a');
        let c = arena.alloc('c');
        assert_eq!(c, a);
        assert_eq!(arena.capacity(), 2);

        assert_eq!(arena[b].value, 'b');
        assert_eq!(arena[c].value, 'c');
        assert_eq!(arena[c].balance, 0);
    }

    #[test]
    #[should_panic(expected = "dangling node handle")]
    fn vacant_slot_access_panics() {
        let mut arena = Arena::new();

        let a = arena.alloc(1u8);
        arena.release(a);
        let _ = &arena[a];
    }

    #[test]
    fn dir_sign_and_not() {
        assert_eq!(Dir::Left.sign(), -1);
        assert_eq!(Dir::Right.sign(), 1);
        assert_eq!(!Dir::Left, Dir::Right);
        assert_eq!(!Dir::Right, Dir::Left);
    }
}
