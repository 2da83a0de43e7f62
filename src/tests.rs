use std::{cmp::Ordering, ops::Range};

use proptest::prelude::*;

use crate::model;

use super::*;

fn insert_find_all(keys: &[u32]) {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for &key in keys {
        assert!(tree.insert(key));
        tree.assert_invariants();
    }

    for key in keys {
        let node = tree.find_raw(key).expect("item not found");
        assert_eq!(&tree.arena[node].value, key);
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

// Heap's algorithm.
fn for_each_permutation(n: u32, mut f: impl FnMut(&[u32])) {
    let mut keys: Vec<u32> = (0..n).collect();
    let mut c = vec![0; keys.len()];

    f(&keys);

    let mut i = 0;
    while i < keys.len() {
        if c[i] < i {
            if i % 2 == 0 {
                keys.swap(0, i);
            } else {
                keys.swap(c[i], i);
            }

            f(&keys);

            c[i] += 1;
            i = 0;
        } else {
            c[i] = 0;
            i += 1;
        }
    }
}

#[test]
fn permutations_find() {
    for n in 4..=6 {
        for_each_permutation(n, insert_find_all);
    }
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree: AvlTree<u32> = AvlTree::new();

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys {
        assert_eq!(tree.remove(key), Some(*key));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
    assert_eq!(tree.root(), None);

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert_eq!(tree.remove(key), Some(*key));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
    assert_eq!(tree.root(), None);
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_permutations() {
    for n in 4..=7 {
        for_each_permutation(n, insert_remove_all);
    }
}

#[test]
fn ascending_inserts() {
    let mut tree = AvlTree::new();

    for value in 1..=7 {
        tree.insert(value);
    }

    tree.assert_invariants();
    assert_eq!(tree.to_vec(), [1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(tree.height(), 3);
    assert_eq!(tree.root(), Some(&4));
    assert_eq!(tree.height_bounds(), (3, 4));
}

#[test]
fn remove_node_with_two_children() {
    let mut tree: AvlTree<u32> = [30, 20, 40, 10, 25, 35, 50].into_iter().collect();
    assert_eq!(tree.root(), Some(&30));

    assert_eq!(tree.remove(&30), Some(30));
    tree.assert_invariants();

    // The root keeps its place and takes over its in-order successor's value.
    assert_eq!(tree.root(), Some(&35));
    assert_eq!(tree.len(), 6);
    assert_eq!(tree.to_vec(), [10, 20, 25, 35, 40, 50]);
    assert_eq!(tree.parent(&40), Some(&35));
}

#[test]
fn removal_rotation_keeps_walking_up() {
    // A minimal (Fibonacci) tree of height 5, inserted level by level without rotations.
    let mut tree: AvlTree<u32> = [8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1].into_iter().collect();
    tree.assert_invariants();
    assert_eq!(tree.root(), Some(&8));
    assert_eq!(tree.height(), 5);

    // Removing 12 rotates at 11, which shortens the right subtree of the root, so the walk
    // continues and rotates again at the root.
    tree.remove(&12);
    tree.assert_invariants();
    assert_eq!(tree.root(), Some(&5));
    assert_eq!(tree.parent(&8), Some(&5));
    assert_eq!(tree.parent(&11), Some(&10));
    assert_eq!(tree.height(), 4);
    assert_eq!(tree.to_vec(), (1..=11).collect::<Vec<_>>());
}

#[test]
fn duplicate_insert_is_ignored() {
    let mut tree: AvlTree<u32> = (0..20).collect();
    let before = tree.to_vec();

    for value in 0..20 {
        assert!(!tree.insert(value));
    }

    tree.assert_invariants();
    assert_eq!(tree.len(), 20);
    assert_eq!(tree.to_vec(), before);
}

#[test]
fn remove_missing_is_noop() {
    let mut tree: AvlTree<u32> = (0..10).collect();

    assert_eq!(tree.remove(&42), None);
    assert_eq!(tree.len(), 10);

    let mut empty: AvlTree<u32> = AvlTree::new();
    assert_eq!(empty.remove(&0), None);
    assert_eq!(empty.pop_first(), None);
    assert_eq!(empty.pop_last(), None);
}

#[test]
fn removing_everything_empties_the_tree() {
    // Multiplication by a unit modulo 1009 visits every residue once.
    let values: Vec<u32> = (0..1009).map(|i| (i * 389) % 1009).collect();
    let mut tree: AvlTree<u32> = values.iter().copied().collect();
    assert_eq!(tree.len(), 1009);
    tree.assert_invariants();

    for value in values.iter().rev().step_by(2) {
        assert_eq!(tree.remove(value), Some(*value));
    }
    tree.assert_invariants();

    for value in &values {
        tree.remove(value);
    }

    assert_eq!(tree.len(), 0);
    assert_eq!(tree.root(), None);
    assert_eq!(tree.height(), 0);
    tree.assert_invariants();
}

#[test]
fn predecessor_and_successor() {
    let tree: AvlTree<u32> = (1..=10).map(|v| v * 10).collect();

    for value in (1..=10).map(|v| v * 10) {
        let before = (value > 10).then_some(value - 10);
        let after = (value < 100).then_some(value + 10);

        assert_eq!(tree.search_before(&value, None).copied(), before);
        assert_eq!(tree.search_after(&value, None).copied(), after);
    }

    // Absent probes.
    assert_eq!(tree.search_before(&55, None), Some(&50));
    assert_eq!(tree.search_after(&55, None), Some(&60));
    assert_eq!(tree.search_before(&5, None), None);
    assert_eq!(tree.search_after(&500, None), None);
    assert_eq!(tree.search_before(&500, None), Some(&100));
}

#[test]
fn filtered_neighbors() {
    let tree: AvlTree<u32> = (1..=20).collect();
    let multiple_of_3 = |v: &u32| v % 3 == 0;

    assert_eq!(tree.search_before(&15, Some(&multiple_of_3)), Some(&12));
    assert_eq!(tree.search_after(&15, Some(&multiple_of_3)), Some(&18));
    assert_eq!(tree.search_after(&18, Some(&multiple_of_3)), None);
    assert_eq!(tree.search_before(&3, Some(&multiple_of_3)), None);

    let never = |_: &u32| false;
    assert_eq!(tree.search_before(&10, Some(&never)), None);
    assert_eq!(tree.search_after(&10, Some(&never)), None);
}

#[test]
fn rejected_ancestor_still_yields_its_subtree() {
    // Root 8; 4 and 12; 2, 6, 10 and 14; odd leaves.
    let tree: AvlTree<u32> = [8, 4, 12, 2, 6, 10, 14, 1, 3, 5, 7, 9, 11, 13, 15]
        .into_iter()
        .collect();
    assert_eq!(tree.parent(&11), Some(&10));

    // Walking up from 11 passes 10 (rejected); 9 below it is nearer than 8.
    let skip_10 = |v: &u32| *v != 10;
    assert_eq!(tree.search_before(&11, Some(&skip_10)), Some(&9));

    let skip_12 = |v: &u32| *v != 12;
    assert_eq!(tree.search_after(&11, Some(&skip_12)), Some(&13));
}

#[test]
fn neighbors_in_one_pass() {
    let tree: AvlTree<u32> = (1..=9).collect();
    let odd = |v: &u32| v % 2 == 1;

    let n = tree.search_neighbors(&4, Some(&odd));
    assert_eq!(
        n,
        Neighbors {
            before: Some(&3),
            equal: Some(&4),
            after: Some(&5),
        }
    );

    // The exact match ignores the predicate.
    let n = tree.search_neighbors(&5, Some(&|v: &u32| v % 2 == 0));
    assert_eq!((n.before, n.equal, n.after), (Some(&4), Some(&5), Some(&6)));

    let n = tree.search_neighbors(&9, None);
    assert_eq!((n.before, n.equal, n.after), (Some(&8), Some(&9), None));

    let n = tree.search_neighbors(&1, None);
    assert_eq!((n.before, n.equal, n.after), (None, Some(&1), Some(&2)));

    let n = tree.search_neighbors(&100, None);
    assert_eq!((n.before, n.equal, n.after), (Some(&9), None, None));
}

#[test]
fn empty_tree_queries() {
    let tree: AvlTree<u32> = AvlTree::new();

    assert!(tree.is_empty());
    assert!(!tree.contains(&1));
    assert_eq!(tree.search(&1), None);
    assert_eq!(tree.parent(&1), None);
    assert_eq!(tree.root(), None);
    assert_eq!(tree.first(), None);
    assert_eq!(tree.last(), None);
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.height_bounds(), (0, 1));
    assert_eq!(tree.search_before(&1, None), None);
    assert_eq!(tree.search_after(&1, None), None);
    assert_eq!(
        tree.search_neighbors(&1, None),
        Neighbors {
            before: None,
            equal: None,
            after: None,
        }
    );
    assert!(tree.to_vec().is_empty());
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn parent_lookup() {
    let tree: AvlTree<u32> = (1..=7).collect();

    assert_eq!(tree.parent(&4), None);
    assert_eq!(tree.parent(&2), Some(&4));
    assert_eq!(tree.parent(&6), Some(&4));
    assert_eq!(tree.parent(&5), Some(&6));
    assert_eq!(tree.parent(&99), None);
}

#[derive(Debug, Clone, PartialEq)]
struct Record {
    key: u32,
    payload: &'static str,
}

fn by_key(a: &Record, b: &Record) -> Ordering {
    a.key.cmp(&b.key)
}

#[test]
fn search_returns_stored_record() {
    let mut tree = AvlTree::with_comparator(by_key);

    tree.insert(Record {
        key: 1,
        payload: "one",
    });
    tree.insert(Record {
        key: 2,
        payload: "two",
    });
    assert!(!tree.insert(Record {
        key: 2,
        payload: "duplicate",
    }));

    let probe = Record { key: 2, payload: "" };
    assert!(tree.contains(&probe));
    assert_eq!(tree.search(&probe).map(|r| r.payload), Some("two"));
    assert_eq!(tree.remove(&probe).map(|r| r.payload), Some("two"));
    assert_eq!(tree.len(), 1);
}

#[test]
fn reversed_comparator_mirrors_order() {
    let values = [5, 3, 9, 1, 7, 2, 8];

    let natural: AvlTree<u32> = values.into_iter().collect();
    let mut reversed = AvlTree::with_comparator(Reverse(Natural));
    reversed.extend(values);
    reversed.assert_invariants();

    let mut mirrored = natural.to_vec();
    mirrored.reverse();
    assert_eq!(reversed.to_vec(), mirrored);

    assert_eq!(reversed.first(), Some(&9));
    assert_eq!(reversed.search_before(&5, None), Some(&7));
    assert_eq!(reversed.search_after(&5, None), Some(&3));
}

#[test]
fn sign_comparator_over_doubles() {
    let cmp = FromSign(|a: &f64, b: &f64| {
        if (a - b).abs() < f64::EPSILON {
            0
        } else if a < b {
            -1
        } else {
            1
        }
    });
    let mut tree = AvlTree::with_comparator(cmp);

    for value in [2.5, -1.0, 10.25, 0.5, 2.5] {
        tree.insert(value);
    }

    tree.assert_invariants();
    assert_eq!(tree.to_vec(), [-1.0, 0.5, 2.5, 10.25]);
    assert!(tree.contains(&0.5));
    assert_eq!(tree.search_after(&0.5, None), Some(&2.5));
}

#[test]
fn less_and_eq_comparator() {
    let mut tree = AvlTree::with_comparator(FromLess::new(
        |a: &i32, b: &i32| a < b,
        |a: &i32, b: &i32| a == b,
    ));
    tree.extend([3, -4, 7, 0]);

    tree.assert_invariants();
    assert_eq!(tree.to_vec(), [-4, 0, 3, 7]);
}

#[test]
fn pop_first_and_last() {
    let mut tree: AvlTree<u32> = (0..10).collect();

    assert_eq!(tree.pop_first(), Some(0));
    assert_eq!(tree.pop_last(), Some(9));
    tree.assert_invariants();
    assert_eq!(tree.first(), Some(&1));
    assert_eq!(tree.last(), Some(&8));
    assert_eq!(tree.len(), 8);
}

#[test]
fn iter_is_ordered_and_exact() {
    let tree: AvlTree<u32> = [4, 8, 15, 16, 23, 42].into_iter().rev().collect();

    let mut iter = tree.iter();
    assert_eq!(iter.len(), 6);
    assert_eq!(iter.next(), Some(&4));
    assert_eq!(iter.size_hint(), (5, Some(5)));

    let rest: Vec<u32> = iter.copied().collect();
    assert_eq!(rest, [8, 15, 16, 23, 42]);

    let sum: u32 = (&tree).into_iter().sum();
    assert_eq!(sum, 108);

    assert_eq!(format!("{tree:?}"), "{4, 8, 15, 16, 23, 42}");
}

#[test]
fn clear_and_reuse() {
    let mut tree: AvlTree<u32> = (0..100).collect();

    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.root(), None);
    tree.assert_invariants();

    tree.extend([3, 1, 2]);
    tree.assert_invariants();
    assert_eq!(tree.to_vec(), [1, 2, 3]);
}

#[test]
fn freed_slots_are_reused() {
    let mut tree: AvlTree<u32> = (0..8).collect();
    let capacity = tree.arena.capacity();

    for value in 0..4 {
        tree.remove(&value);
    }
    for value in 10..14 {
        tree.insert(value);
    }

    tree.assert_invariants();
    assert_eq!(tree.arena.capacity(), capacity);
}

#[test]
fn validate_reports_corruption() {
    let mut tree: AvlTree<u32> = (1..=7).collect();
    let root = tree.root.expect("tree is not empty");

    tree.arena[root].balance = 1;
    assert_eq!(
        tree.validate(),
        Err(InvariantError::BalanceMismatch {
            position: 3,
            recorded: 1,
            actual: 0,
        })
    );
    tree.arena[root].balance = 0;
    assert_eq!(tree.validate(), Ok(()));

    tree.arena[root].value = 100;
    assert_eq!(
        tree.validate(),
        Err(InvariantError::OutOfOrder { position: 4 })
    );
    tree.arena[root].value = 4;

    tree.len = 8;
    assert_eq!(
        tree.validate(),
        Err(InvariantError::CountMismatch {
            recorded: 8,
            reachable: 7,
        })
    );
}

#[test]
#[should_panic(expected = "AVL invariant violated")]
fn assert_invariants_panics() {
    let mut tree: AvlTree<u32> = (1..=3).collect();
    let root = tree.root.expect("tree is not empty");

    tree.arena[root].parent = Some(root);
    tree.assert_invariants();
}

#[test]
fn dotgraph_lists_every_node() {
    let tree: AvlTree<u32> = (1..=3).collect();

    let mut out = String::new();
    tree.dotgraph("t", &mut out).expect("writing to a String cannot fail");

    assert!(out.starts_with("digraph \"graph-t\""));
    for label in ["1:0", "2:0", "3:0"] {
        assert!(out.contains(label), "{label} missing from {out}");
    }

    let mut empty = String::new();
    AvlTree::<u32>::new()
        .dotgraph("e", &mut empty)
        .expect("writing to a String cannot fail");
    assert_eq!(empty, "digraph \"graph-e\" {}");
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn ordered_and_balanced(values in proptest::collection::vec(any::<i16>(), 0..300)) {
        let mut tree = AvlTree::new();

        for &value in &values {
            tree.insert(value);
        }
        tree.assert_invariants();

        let sequence = tree.to_vec();
        prop_assert!(sequence.windows(2).all(|w| w[0] < w[1]));

        let (lower, upper) = tree.height_bounds();
        prop_assert!(lower <= tree.height() && tree.height() <= upper);

        for value in &values {
            tree.remove(value);
        }
        prop_assert_eq!(tree.len(), 0);
        prop_assert_eq!(tree.root(), None);
    }
}
