use core::borrow::Borrow;

use alloc::vec;
use alloc::vec::Vec;

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::arena::Arena;
use super::bulk;
use super::handle::Handle;
use super::node::{Bias, BranchNode, LeafNode, Node, position};
use crate::Order;

/// The core B-tree backing `BTree`.
#[derive(Clone)]
pub(crate) struct RawBTree<T> {
    /// Arena owning every node of the tree.
    nodes: Arena<Node<T>>,
    /// Handle to the root node. An empty tree's root is an empty leaf.
    root: Handle,
    /// Handle to the leftmost leaf, or `None` while the tree is empty.
    first: Option<Handle>,
    order: Order,
    /// Total number of values in the tree.
    len: usize,
}

/// Path element for tracking traversal during mutations.
#[derive(Clone, Copy, Debug)]
struct PathElement {
    /// Handle to the branch at this level.
    node: Handle,
    /// Index of the child we descended into.
    child_index: usize,
}

/// Frames from the root down to, but excluding, the node being mutated.
type Path = SmallVec<[PathElement; 16]>;

/// Index of the value equal to `probe` at the `bias` end of its run, given
/// the `bound` returned by [`position`].
fn run_end<T, Q>(values: &[T], bound: usize, probe: &Q, bias: Bias) -> Option<usize>
where
    T: Borrow<Q>,
    Q: ?Sized + Ord,
{
    let index = match bias {
        Bias::Before => bound,
        Bias::After => bound.checked_sub(1)?,
    };
    let found = values.get(index)?;
    (found.borrow() == probe).then_some(index)
}

impl<T> RawBTree<T> {
    /// Creates a new, empty tree.
    pub(crate) fn new(order: Order) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.insert(Node::Leaf(LeafNode::new(Vec::new())));
        Self {
            nodes,
            root,
            first: None,
            order,
            len: 0,
        }
    }

    /// Builds a tree directly from sorted `values`.
    pub(crate) fn bulkload(values: Vec<T>, order: Order) -> Self
    where
        T: Ord,
    {
        assert!(values.is_sorted(), "`RawBTree::bulkload()` - `values` are not sorted!");
        let len = values.len();
        let (nodes, root, leftmost) = bulk::build(values, order);
        Self {
            nodes,
            root,
            first: (len > 0).then_some(leftmost),
            order,
            len,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn order(&self) -> Order {
        self.order
    }

    pub(crate) const fn root(&self) -> Handle {
        self.root
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<T> {
        self.nodes.get(handle)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.insert(Node::Leaf(LeafNode::new(Vec::new())));
        self.first = None;
        self.len = 0;
    }

    /// Returns the smallest value via the cached leftmost leaf.
    pub(crate) fn first(&self) -> Option<&T> {
        let leaf = self.nodes.get(self.first?).as_leaf();
        leaf.values().first()
    }

    pub(crate) fn last(&self) -> Option<&T> {
        let mut current = self.root;
        while let Node::Branch(branch) = self.nodes.get(current) {
            current = branch.last_child();
        }
        self.nodes.get(current).values().last()
    }

    /// Removes the smallest value.
    pub(crate) fn pop_first(&mut self) -> Option<T> {
        let leftmost = self.first?;
        let mut path = Path::new();
        let mut current = self.root;
        while let Node::Branch(branch) = self.nodes.get(current) {
            path.push(PathElement {
                node: current,
                child_index: 0,
            });
            current = branch.first_child();
        }
        debug_assert_eq!(current, leftmost, "`RawBTree::pop_first()` - stale leftmost leaf!");
        Some(self.remove_from_leaf(current, 0, &mut path))
    }

    /// Consumes the tree, returning its values in ascending order.
    pub(crate) fn into_sorted_vec(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        self.drain_subtree(self.root, &mut out);
        out
    }

    /// Frees the subtree under `handle`, appending its values to `out` in order.
    fn drain_subtree(&mut self, handle: Handle, out: &mut Vec<T>) {
        match self.nodes.remove(handle) {
            Node::Leaf(leaf) => out.extend(leaf.into_values()),
            Node::Branch(branch) => {
                let (values, children) = branch.into_parts();
                let mut values = values.into_iter();
                for child in children {
                    self.drain_subtree(child, out);
                    out.extend(values.next());
                }
            }
        }
    }

    /// Relieves `node`, which holds one value more than the order allows.
    ///
    /// Rotates a value into a sibling with room when one exists; otherwise
    /// splits and pushes the median into the parent, repeating upwards.
    fn shrink(&mut self, mut node: Handle, path: &mut Path) {
        let max = self.order.max_len();
        loop {
            debug_assert!(self.nodes.get(node).len() > max, "`RawBTree::shrink()` - node is not full!");

            let Some(PathElement { node: parent, child_index }) = path.pop() else {
                let (median, sibling) = self.nodes.get_mut(node).split();
                let sibling = self.nodes.insert(sibling);
                let root = BranchNode::new(vec![median], vec![node, sibling]);
                self.root = self.nodes.insert(Node::Branch(root));
                trace!(root = ?self.root, "root split");
                return;
            };

            let branch = self.nodes.get(parent).as_branch();
            if child_index > 0 && self.nodes.get(branch.child(child_index - 1)).len() < max {
                self.pass_left(parent, child_index, 1);
                return;
            }
            if child_index < branch.len() && self.nodes.get(branch.child(child_index + 1)).len() < max {
                self.pass_right(parent, child_index, 1);
                return;
            }

            let (median, sibling) = self.nodes.get_mut(node).split();
            let sibling = self.nodes.insert(sibling);
            let branch = self.nodes.get_mut(parent).as_branch_mut();
            branch.insert_child(child_index, median, sibling);
            if branch.len() <= max {
                return;
            }
            node = parent;
        }
    }

    /// Refills the node reached through `frame`, which is `count` values
    /// below the minimum. `path` holds the frames above `frame`.
    ///
    /// Borrows from the right sibling, then the left, then both; failing
    /// that, merges with a sibling and repeats on the parent if it underflows.
    fn grow(&mut self, mut frame: PathElement, path: &mut Path, mut count: usize) {
        let min = self.order.min_len();
        loop {
            debug_assert!(count > 0, "`RawBTree::grow()` - nothing to borrow!");
            let PathElement { node: parent, child_index } = frame;

            let branch = self.nodes.get(parent).as_branch();
            let spare = |h: Handle| self.nodes.get(h).len().saturating_sub(min);
            let left_spare = if child_index > 0 { spare(branch.child(child_index - 1)) } else { 0 };
            let right_spare = if child_index < branch.len() { spare(branch.child(child_index + 1)) } else { 0 };

            if right_spare >= count {
                self.pass_left(parent, child_index + 1, count);
                return;
            }
            if left_spare >= count {
                self.pass_right(parent, child_index - 1, count);
                return;
            }
            if count > 1 && left_spare + right_spare >= count {
                if right_spare > 0 {
                    self.pass_left(parent, child_index + 1, right_spare);
                }
                self.pass_right(parent, child_index - 1, count - right_spare);
                return;
            }

            // Merge into the left sibling when there is one, keeping the
            // leftmost handle at every level stable.
            self.merge_children(parent, child_index.saturating_sub(1));

            let remaining = self.nodes.get(parent).len();
            if remaining >= min {
                return;
            }
            match path.pop() {
                Some(above) => {
                    frame = above;
                    count = min - remaining;
                }
                None => {
                    if remaining == 0 {
                        self.collapse_root();
                    }
                    return;
                }
            }
        }
    }

    /// Calls [`grow`](Self::grow) if a node of length `len` at the end of
    /// `path` is below the minimum. The root is never refilled.
    fn refill(&mut self, len: usize, path: &mut Path) {
        let min = self.order.min_len();
        if len < min
            && let Some(frame) = path.pop()
        {
            self.grow(frame, path, min - len);
        }
    }

    /// Moves `count` values out of `children[child_index]` into its left
    /// sibling, rotating through the separator between them.
    fn pass_left(&mut self, parent: Handle, child_index: usize, count: usize) {
        let branch = self.nodes.get(parent).as_branch();
        let (left, child) = (branch.child(child_index - 1), branch.child(child_index));
        debug_assert!(
            count > 0 && self.nodes.get(left).len() + count <= self.order.max_len(),
            "`RawBTree::pass_left()` - left sibling has no room!"
        );

        let mut fringe = self.nodes.get_mut(child).take_front(count);
        let raised = fringe.values.pop().expect("`RawBTree::pass_left()` - empty fringe!");
        let lowered = self.nodes.get_mut(parent).as_branch_mut().replace_value(child_index - 1, raised);
        fringe.values.insert(0, lowered);
        self.nodes.get_mut(left).put_back(fringe);
    }

    /// Moves `count` values out of `children[child_index]` into its right
    /// sibling, rotating through the separator between them.
    fn pass_right(&mut self, parent: Handle, child_index: usize, count: usize) {
        let branch = self.nodes.get(parent).as_branch();
        let (child, right) = (branch.child(child_index), branch.child(child_index + 1));
        debug_assert!(
            count > 0 && self.nodes.get(right).len() + count <= self.order.max_len(),
            "`RawBTree::pass_right()` - right sibling has no room!"
        );

        let mut fringe = self.nodes.get_mut(child).take_back(count);
        let raised = fringe.values.remove(0);
        let lowered = self.nodes.get_mut(parent).as_branch_mut().replace_value(child_index, raised);
        fringe.values.push(lowered);
        self.nodes.get_mut(right).put_front(fringe);
    }

    /// Folds `children[index + 1]` and the separator before it into
    /// `children[index]`.
    fn merge_children(&mut self, parent: Handle, index: usize) {
        let branch = self.nodes.get(parent).as_branch();
        let (left, right) = (branch.child(index), branch.child(index + 1));
        debug_assert!(
            self.nodes.get(left).len() + 1 + self.nodes.get(right).len() <= self.order.max_len(),
            "`RawBTree::merge_children()` - merged node would overflow!"
        );

        let (separator, right) = self.nodes.get_mut(parent).as_branch_mut().remove_child(index);
        let right = self.nodes.remove(right);
        self.nodes.get_mut(left).merge(separator, right);
    }

    /// Replaces a separator-less root branch by its only child, repeatedly.
    fn collapse_root(&mut self) {
        while let Node::Branch(branch) = self.nodes.get(self.root)
            && branch.len() == 0
        {
            let child = branch.first_child();
            self.nodes.remove(self.root);
            self.root = child;
            trace!(root = ?self.root, "root collapsed");
        }
    }

    /// Deletes `values[index]` from `leaf` and rebalances.
    fn remove_from_leaf(&mut self, leaf: Handle, index: usize, path: &mut Path) -> T {
        let node = self.nodes.get_mut(leaf).as_leaf_mut();
        let value = node.remove(index);
        let remaining = node.len();
        self.len -= 1;
        if self.len == 0 {
            self.first = None;
        }
        self.refill(remaining, path);
        value
    }

    /// Deletes separator `index` of branch `node` by promoting a neighbour
    /// from a leaf: the right subtree's minimum if its leaf can spare one,
    /// otherwise the left subtree's maximum.
    fn remove_separator(&mut self, node: Handle, index: usize, path: &mut Path) -> T {
        let min = self.order.min_len();
        let branch = self.nodes.get(node).as_branch();
        let (left, right) = (branch.child(index), branch.child(index + 1));

        let mut successor = right;
        while let Node::Branch(branch) = self.nodes.get(successor) {
            successor = branch.first_child();
        }
        if self.nodes.get(successor).len() > min {
            let promoted = self.nodes.get_mut(successor).as_leaf_mut().remove(0);
            self.len -= 1;
            return self.nodes.get_mut(node).as_branch_mut().replace_value(index, promoted);
        }

        path.push(PathElement {
            node,
            child_index: index,
        });
        let mut predecessor = left;
        while let Node::Branch(branch) = self.nodes.get(predecessor) {
            path.push(PathElement {
                node: predecessor,
                child_index: branch.len(),
            });
            predecessor = branch.last_child();
        }

        let leaf = self.nodes.get_mut(predecessor).as_leaf_mut();
        let promoted = leaf.pop().expect("`RawBTree::remove_separator()` - empty leaf below a branch!");
        let remaining = leaf.len();
        let removed = self.nodes.get_mut(node).as_branch_mut().replace_value(index, promoted);
        self.len -= 1;
        self.refill(remaining, path);
        removed
    }

    /// Re-establishes the minimum fill along the leftmost spine after a
    /// prefix split, top-down, collapsing separator-less roots first.
    fn restore_left_spine(&mut self) {
        let min = self.order.min_len();
        self.collapse_root();

        let mut path = Path::new();
        let mut current = self.root;
        while let Node::Branch(branch) = self.nodes.get(current) {
            let child = branch.first_child();
            let frame = PathElement {
                node: current,
                child_index: 0,
            };
            let len = self.nodes.get(child).len();
            if len < min {
                trace!(node = ?child, deficit = min - len, "refilling left spine");
                self.grow(frame, &mut path, min - len);
                // Spine merges keep the left handle, so only the frames
                // `grow` consumed have to be walked again.
                let mut node = path.last().map_or(self.root, |above| self.nodes.get(above.node).as_branch().first_child());
                while node != child {
                    path.push(PathElement {
                        node,
                        child_index: 0,
                    });
                    node = self.nodes.get(node).as_branch().first_child();
                }
            } else {
                path.push(frame);
            }
            current = child;
        }
    }
}

impl<T: Ord> RawBTree<T> {
    /// Inserts `value` before (`Bias::Before`) or after (`Bias::After`) any
    /// equal values already in the tree.
    pub(crate) fn insert(&mut self, value: T, bias: Bias) {
        let mut path = Path::new();
        let mut current = self.root;
        while let Node::Branch(branch) = self.nodes.get(current) {
            let child_index = position(branch.values(), &value, bias);
            path.push(PathElement {
                node: current,
                child_index,
            });
            current = branch.child(child_index);
        }

        let leaf = self.nodes.get_mut(current).as_leaf_mut();
        let index = position(leaf.values(), &value, bias);
        leaf.insert(index, value);
        let overflow = leaf.len() > self.order.max_len();

        self.len += 1;
        if self.first.is_none() {
            self.first = Some(current);
        }
        if overflow {
            self.shrink(current, &mut path);
        }
    }

    pub(crate) fn contains<Q>(&self, probe: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        loop {
            let node = self.nodes.get(current);
            let bound = position(node.values(), probe, Bias::Before);
            if run_end(node.values(), bound, probe, Bias::Before).is_some() {
                return true;
            }
            match node {
                Node::Branch(branch) => current = branch.child(bound),
                Node::Leaf(_) => return false,
            }
        }
    }

    /// Removes the rightmost (`Bias::After`) or leftmost (`Bias::Before`)
    /// value equal to `probe`. Returns `None` and leaves the tree untouched
    /// when there is none.
    pub(crate) fn remove<Q>(&mut self, probe: &Q, bias: Bias) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut path = Path::new();
        // Deepest matching separator on the search path: (depth, index).
        let mut separator = None;
        let mut current = self.root;
        while let Node::Branch(branch) = self.nodes.get(current) {
            let child_index = position(branch.values(), probe, bias);
            if let Some(index) = run_end(branch.values(), child_index, probe, bias) {
                separator = Some((path.len(), index));
            }
            path.push(PathElement {
                node: current,
                child_index,
            });
            current = branch.child(child_index);
        }

        // Matches inside the leaf lie beyond every separator on the path.
        let leaf = self.nodes.get(current).as_leaf();
        let bound = position(leaf.values(), probe, bias);
        if let Some(index) = run_end(leaf.values(), bound, probe, bias) {
            return Some(self.remove_from_leaf(current, index, &mut path));
        }

        let (depth, index) = separator?;
        let node = path[depth].node;
        path.truncate(depth);
        Some(self.remove_separator(node, index, &mut path))
    }

    /// Removes every value `<= pivot`, returning them in ascending order.
    pub(crate) fn pull_prefix<Q>(&mut self, pivot: &Q) -> Vec<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut prefix = Vec::new();
        if self.first().is_none_or(|min| min.borrow() > pivot) {
            return prefix;
        }

        let mut current = self.root;
        loop {
            match self.nodes.get_mut(current) {
                Node::Leaf(leaf) => {
                    leaf.split_prefix(pivot, &mut prefix);
                    break;
                }
                Node::Branch(branch) => {
                    let (values, children) = branch.split_prefix(pivot);
                    let next = branch.first_child();
                    for (child, value) in children.into_iter().zip(values) {
                        self.drain_subtree(child, &mut prefix);
                        prefix.push(value);
                    }
                    current = next;
                }
            }
        }

        // The leaf the split ended in is leftmost in what remains.
        self.len -= prefix.len();
        self.first = Some(current);
        self.restore_left_spine();
        if self.len == 0 {
            self.first = None;
        }

        debug!(pulled = prefix.len(), remaining = self.len, "pulled prefix");
        prefix
    }
}
