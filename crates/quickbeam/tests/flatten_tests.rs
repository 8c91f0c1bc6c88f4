//! Property-based tests for associative flattening.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quickbeam::nodes::{Add, Const, Multiply, Property};
use quickbeam::*;

/// Build `k` nested additions over the literals `0..=k`.
///
/// Left-deep nesting gives `((0 + 1) + 2) + ...`, right-deep nesting gives
/// `0 + (1 + (2 + ...))`. Both read the literals in ascending order.
fn nested_sum(k: usize, left_deep: bool) -> Tree {
    let mut builder = TreeBuilder::new();
    let literal = |builder: &mut TreeBuilder, n: usize| builder.leaf(Const::new(n as i64)).unwrap();

    let root = if left_deep {
        let mut acc = literal(&mut builder, 0);
        for n in 1..=k {
            let sum = builder.node(Add);
            builder.open(sum).unwrap();
            let right = literal(&mut builder, n);
            builder.add_child(sum, acc, 0).unwrap();
            builder.add_child(sum, right, 1).unwrap();
            builder.close(sum).unwrap();
            acc = sum;
        }
        acc
    } else {
        let mut acc = literal(&mut builder, k);
        for n in (0..k).rev() {
            let sum = builder.node(Add);
            builder.open(sum).unwrap();
            let left = literal(&mut builder, n);
            builder.add_child(sum, left, 0).unwrap();
            builder.add_child(sum, acc, 1).unwrap();
            builder.close(sum).unwrap();
            acc = sum;
        }
        acc
    };
    builder.finish(root).unwrap()
}

fn literals(tree: &Tree) -> Vec<i64> {
    tree.root()
        .children()
        .filter_map(|child| {
            let mut ctx = EvalContext::new();
            child.get_value(&mut ctx, &Value::Null).ok()?.as_i64()
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_nested_sums_flatten_in_order(k in 1usize..24, left_deep in any::<bool>()) {
        let tree = nested_sum(k, left_deep);
        let expected: Vec<i64> = (0..=k as i64).collect();

        prop_assert_eq!(tree.root().kind(), NodeKind::Add);
        prop_assert_eq!(tree.root().child_count(), k + 1);
        prop_assert_eq!(tree.len(), k + 2);
        prop_assert_eq!(literals(&tree), expected);

        let mut ctx = EvalContext::new();
        let total = (k * (k + 1) / 2) as i64;
        prop_assert_eq!(tree.get_value(&mut ctx, &Value::Null).unwrap(), Value::Int(total));
    }

    #[test]
    fn prop_flat_sum_is_untouched(n in 1usize..16) {
        let mut builder = TreeBuilder::new();
        let sum = builder.node(Add);
        builder.open(sum).unwrap();
        for index in 0..n {
            let child = builder.leaf(Property::new(format!("p{}", index))).unwrap();
            builder.add_child(sum, child, index).unwrap();
        }
        builder.close(sum).unwrap();
        let tree = builder.finish(sum).unwrap();

        prop_assert_eq!(tree.root().child_count(), n);
        prop_assert_eq!(tree.len(), n + 1);
        for (index, child) in tree.root().children().enumerate() {
            prop_assert_eq!(child.to_string(), format!("p{}", index));
            prop_assert_eq!(child.index_in_parent(), Some(index));
        }
    }

    #[test]
    fn prop_parsed_sums_flatten(names in prop::collection::vec("[a-z]{1,6}", 2..10)) {
        let names: Vec<String> = names.into_iter().map(|name| format!("v_{}", name)).collect();
        let tree = parse_expression(&names.join(" + ")).unwrap();

        prop_assert_eq!(tree.root().child_count(), names.len());
        prop_assert_eq!(tree.to_string(), names.join(" + "));
    }
}

#[test]
fn test_different_operators_do_not_merge() {
    let tree = parse_expression("a * b + c * d * e").unwrap();
    assert_eq!(tree.root().kind(), NodeKind::Add);
    assert_eq!(tree.root().child_count(), 2);

    let kinds: Vec<_> = tree.root().children().map(|child| child.kind()).collect();
    assert_eq!(kinds, vec![NodeKind::Multiply, NodeKind::Multiply]);
    assert_eq!(tree.root().child(1).unwrap().child_count(), 3);
}

#[test]
fn test_product_inside_product_merges() {
    let mut builder = TreeBuilder::new();
    let inner = builder.node(Multiply);
    builder.open(inner).unwrap();
    let two = builder.leaf(Const::new(2)).unwrap();
    let three = builder.leaf(Const::new(3)).unwrap();
    builder.add_child(inner, two, 0).unwrap();
    builder.add_child(inner, three, 1).unwrap();
    builder.close(inner).unwrap();

    let outer = builder.node(Multiply);
    builder.open(outer).unwrap();
    let four = builder.leaf(Const::new(4)).unwrap();
    builder.add_child(outer, four, 0).unwrap();
    builder.add_child(outer, inner, 1).unwrap();
    builder.close(outer).unwrap();

    let tree = builder.finish(outer).unwrap();
    assert_eq!(tree.to_string(), "4 * 2 * 3");
    let mut ctx = EvalContext::new();
    assert_eq!(tree.get_value(&mut ctx, &Value::Null).unwrap(), Value::Int(24));
}
