//! Bottom-up construction from sorted input.
//!
//! Every level is built the same way: the level's items are cut into maximal
//! runs of `order` items, each run separated from the next by one promoted
//! item. Runs become the level's nodes and the promoted items become the
//! separators that the next level groups again, until a single node remains.

use alloc::vec::Vec;

use tracing::debug;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{BranchNode, LeafNode, Node};
use crate::Order;

/// Cuts `items` into runs of at most `order.max_len()` items, returning the
/// runs and the items promoted between them (`runs.len() - 1` of them).
///
/// A short final run is evened out with its predecessor so that every run
/// but a lone one holds at least `order.min_len()` items.
fn partition<E>(items: Vec<E>, order: Order) -> (Vec<Vec<E>>, Vec<E>) {
    let (min, max) = (order.min_len(), order.max_len());
    let groups = items.len() / (max + 1) + 1;
    let mut runs: Vec<Vec<E>> = Vec::with_capacity(groups);
    let mut promoted = Vec::with_capacity(groups);

    let mut items = items.into_iter();
    loop {
        runs.push(items.by_ref().take(max).collect());
        match items.next() {
            Some(item) => promoted.push(item),
            None => break,
        }
    }

    if runs.len() > 1 && runs.last().is_some_and(|run| run.len() < min) {
        let (Some(tail), Some(mut head), Some(separator)) = (runs.pop(), runs.pop(), promoted.pop()) else {
            unreachable!("`partition()` - missing run before a short tail!");
        };
        head.push(separator);
        head.extend(tail);

        let mid = head.len() / 2;
        let upper = head.split_off(mid + 1);
        let separator = head.pop().expect("`partition()` - empty rebalanced run!");
        runs.push(head);
        promoted.push(separator);
        runs.push(upper);
    }

    (runs, promoted)
}

/// Builds a tree from sorted `values`. Returns the arena, the root and the
/// leftmost leaf.
pub(super) fn build<T>(values: Vec<T>, order: Order) -> (Arena<Node<T>>, Handle, Handle) {
    let count = values.len();
    let mut nodes = Arena::with_capacity(2 * count.div_ceil(order.max_len()) + 1);

    let (runs, mut separators) = partition(values, order);
    let mut level: Vec<Handle> = runs.into_iter().map(|run| nodes.insert(Node::Leaf(LeafNode::new(run)))).collect();
    let leftmost = level[0];

    let mut height = 1;
    while level.len() > 1 {
        let (runs, promoted) = partition(separators, order);
        let mut children = level.into_iter();
        level = runs
            .into_iter()
            .map(|run| {
                let kids = children.by_ref().take(run.len() + 1).collect();
                nodes.insert(Node::Branch(BranchNode::new(run, kids)))
            })
            .collect();
        separators = promoted;
        height += 1;
    }

    debug!(values = count, height, nodes = nodes.len(), "bulk-loaded tree");
    (nodes, level[0], leftmost)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::vec;

    fn lens(runs: &[Vec<i32>]) -> Vec<usize> {
        runs.iter().map(Vec::len).collect()
    }

    #[test]
    fn exact_fit_is_one_run() {
        let (runs, promoted) = partition((1..=4).collect(), Order::new(4));
        assert_eq!(runs, [vec![1, 2, 3, 4]]);
        assert!(promoted.is_empty());
    }

    #[test]
    fn empty_input_is_one_empty_run() {
        let (runs, promoted) = partition(Vec::<i32>::new(), Order::new(4));
        assert_eq!(lens(&runs), [0]);
        assert!(promoted.is_empty());
    }

    #[test]
    fn full_runs_are_separated_by_single_values() {
        let (runs, promoted) = partition((1..=14).collect(), Order::new(4));
        assert_eq!(runs, [vec![1, 2, 3, 4], vec![6, 7, 8, 9], vec![11, 12, 13, 14]]);
        assert_eq!(promoted, [5, 10]);
    }

    #[test]
    fn short_tail_borrows_from_predecessor() {
        // 4 + sep + 1 would leave a run of one under order 4.
        let (runs, promoted) = partition((1..=6).collect(), Order::new(4));
        assert_eq!(runs, [vec![1, 2, 3], vec![5, 6]]);
        assert_eq!(promoted, [4]);
    }

    #[test]
    fn dangling_separator_is_folded_back() {
        let (runs, promoted) = partition((1..=5).collect(), Order::new(4));
        assert_eq!(runs, [vec![1, 2], vec![4, 5]]);
        assert_eq!(promoted, [3]);
    }

    #[test]
    fn partition_respects_bounds_for_every_size() {
        for order in 2..10 {
            let order = Order::new(order);
            for len in 0..200 {
                let (runs, promoted) = partition((0..len).collect::<Vec<i32>>(), order);
                assert_eq!(promoted.len() + 1, runs.len());
                for run in &runs {
                    assert!(run.len() <= order.max_len());
                    assert!(runs.len() == 1 || run.len() >= order.min_len(), "{order:?} len={len}: {:?}", lens(&runs));
                }
            }
        }
    }

    #[test]
    fn build_two_level_tree_with_duplicates() {
        let (nodes, root, leftmost) = build(vec![1, 2, 2, 2, 3, 4, 5, 6, 7, 8, 9, 10], Order::new(4));
        assert_eq!(nodes.get(root).values(), &[3, 8]);
        assert_eq!(nodes.get(leftmost).values(), &[1, 2, 2, 2]);
        let leaves: Vec<&[i32]> = nodes.get(root).children().iter().map(|&c| nodes.get(c).values()).collect();
        assert_eq!(leaves, [&[1, 2, 2, 2][..], &[4, 5, 6, 7][..], &[9, 10][..]]);
    }
}
