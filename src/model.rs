use std::{
    collections::BTreeSet,
    ops::Bound::{Excluded, Unbounded},
};

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::AvlTree;

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

/// A predicate handed to the neighbor searches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Arbitrary)]
pub enum Filter {
    Any,
    Even,
    Odd,
    MultipleOf7,
}

impl Filter {
    fn accepts(self, value: u32) -> bool {
        match self {
            Filter::Any => true,
            Filter::Even => value % 2 == 0,
            Filter::Odd => value % 2 == 1,
            Filter::MultipleOf7 => value % 7 == 0,
        }
    }
}

fn filter_strategy() -> impl Strategy<Value = Filter> {
    proptest::prop_oneof![
        Just(Filter::Any),
        Just(Filter::Even),
        Just(Filter::Odd),
        Just(Filter::MultipleOf7),
    ]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Remove(ItemValue),
    Contains(ItemValue),
    Search(ItemValue),
    Parent(ItemValue),
    SearchBefore(ItemValue, Filter),
    SearchAfter(ItemValue, Filter),
    SearchNeighbors(ItemValue, Filter),
    First,
    PopFirst,
    Last,
    PopLast,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        u32::try_from(idx).unwrap_or(u32::MAX)
                    } else {
                        v[idx % v.len()]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item) => FinalOp::Insert(get_value(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_value(sorted, item)),
            Op::Contains(item) => FinalOp::Contains(get_value(sorted, item)),
            Op::Search(item) => FinalOp::Search(get_value(sorted, item)),
            Op::Parent(item) => FinalOp::Parent(get_value(sorted, item)),
            Op::SearchBefore(item, f) => FinalOp::SearchBefore(get_value(sorted, item), f),
            Op::SearchAfter(item, f) => FinalOp::SearchAfter(get_value(sorted, item), f),
            Op::SearchNeighbors(item, f) => FinalOp::SearchNeighbors(get_value(sorted, item), f),
            Op::First => FinalOp::First,
            Op::PopFirst => FinalOp::PopFirst,
            Op::Last => FinalOp::Last,
            Op::PopLast => FinalOp::PopLast,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Remove(u32),
    Contains(u32),
    Search(u32),
    Parent(u32),
    SearchBefore(u32, Filter),
    SearchAfter(u32, Filter),
    SearchNeighbors(u32, Filter),
    First,
    PopFirst,
    Last,
    PopLast,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Insert),
        value_strategy().prop_map(Op::Remove),
        value_strategy().prop_map(Op::Contains),
        value_strategy().prop_map(Op::Search),
        value_strategy().prop_map(Op::Parent),
        (value_strategy(), filter_strategy()).prop_map(|(v, f)| Op::SearchBefore(v, f)),
        (value_strategy(), filter_strategy()).prop_map(|(v, f)| Op::SearchAfter(v, f)),
        (value_strategy(), filter_strategy()).prop_map(|(v, f)| Op::SearchNeighbors(v, f)),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
        Just(Op::PopLast),
    ]
}

/// Runs `ops` against both an [`AvlTree`] and a [`BTreeSet`], asserting that every operation
/// produces the same result and that the tree stays valid throughout.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut sorted_values = Vec::with_capacity(ops.len());
    let mut btree = BTreeSet::new();
    let mut avl: AvlTree<u32> = AvlTree::new();

    fn insert_sorted(v: &mut Vec<u32>, value: u32) {
        if let Err(idx) = v.binary_search(&value) {
            v.insert(idx, value);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, value: u32) {
        if let Ok(idx) = v.binary_search(&value) {
            v.remove(idx);
        }
    }

    fn btree_before(btree: &BTreeSet<u32>, value: u32, filter: Filter) -> Option<&u32> {
        btree.range(..value).rev().find(|&&v| filter.accepts(v))
    }

    fn btree_after(btree: &BTreeSet<u32>, value: u32, filter: Filter) -> Option<&u32> {
        btree
            .range((Excluded(value), Unbounded))
            .find(|&&v| filter.accepts(v))
    }

    let mut final_ops = Vec::with_capacity(ops.len());
    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_values);
        final_ops.push(final_op);

        match final_op {
            FinalOp::Insert(value) => {
                insert_sorted(&mut sorted_values, value);

                let from_btree = btree.insert(value);
                let from_avl = avl.insert(value);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Remove(value) => {
                remove_sorted(&mut sorted_values, value);

                let from_btree = btree.take(&value);
                let from_avl = avl.remove(&value);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Contains(value) => {
                let from_btree = btree.contains(&value);
                let from_avl = avl.contains(&value);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Search(value) => {
                let from_btree = btree.get(&value);
                let from_avl = avl.search(&value);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Parent(value) => {
                // Tree shape has no `BTreeSet` counterpart; only check consistency.
                let parent = avl.parent(&value);

                let expect_parent = btree.contains(&value) && avl.root() != Some(&value);
                assert_eq!(parent.is_some(), expect_parent, "FinalOp #{op_id}: {final_op:?}");

                if let Some(parent) = parent {
                    assert!(btree.contains(parent), "FinalOp #{op_id}: {final_op:?}");
                }
            }

            FinalOp::SearchBefore(value, filter) => {
                let accept = move |v: &u32| filter.accepts(*v);
                let predicate: Option<&dyn Fn(&u32) -> bool> =
                    (filter != Filter::Any).then_some(&accept as &dyn Fn(&u32) -> bool);

                let from_btree = btree_before(&btree, value, filter);
                let from_avl = avl.search_before(&value, predicate);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::SearchAfter(value, filter) => {
                let accept = move |v: &u32| filter.accepts(*v);
                let predicate: Option<&dyn Fn(&u32) -> bool> =
                    (filter != Filter::Any).then_some(&accept as &dyn Fn(&u32) -> bool);

                let from_btree = btree_after(&btree, value, filter);
                let from_avl = avl.search_after(&value, predicate);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::SearchNeighbors(value, filter) => {
                let accept = move |v: &u32| filter.accepts(*v);
                let predicate: Option<&dyn Fn(&u32) -> bool> =
                    (filter != Filter::Any).then_some(&accept as &dyn Fn(&u32) -> bool);

                let neighbors = avl.search_neighbors(&value, predicate);

                assert_eq!(
                    btree_before(&btree, value, filter),
                    neighbors.before,
                    "FinalOp #{op_id}: {final_op:?}"
                );
                assert_eq!(
                    btree.get(&value),
                    neighbors.equal,
                    "FinalOp #{op_id}: {final_op:?}"
                );
                assert_eq!(
                    btree_after(&btree, value, filter),
                    neighbors.after,
                    "FinalOp #{op_id}: {final_op:?}"
                );
            }

            FinalOp::First => {
                let from_btree = btree.first();
                let from_avl = avl.first();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopFirst => {
                let from_btree = btree.pop_first();
                let from_avl = avl.pop_first();

                if let Some(value) = from_btree {
                    remove_sorted(&mut sorted_values, value);
                }

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last();
                let from_avl = avl.last();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopLast => {
                let from_btree = btree.pop_last();
                let from_avl = avl.pop_last();

                if let Some(value) = from_btree {
                    remove_sorted(&mut sorted_values, value);
                }

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }
        }

        avl.assert_invariants();
        assert_eq!(btree.len(), avl.len());
        assert!(btree.iter().eq(avl.iter()));

        let (lower, upper) = avl.height_bounds();
        let height = avl.height();
        assert!(
            lower <= height && height <= upper,
            "height {height} outside of {lower}..={upper} after FinalOp #{op_id}"
        );
    }
}
