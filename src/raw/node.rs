use core::borrow::Borrow;

use alloc::vec::Vec;

use super::handle::Handle;

/// A tree node. Leaves hold values only; branches hold separators and
/// `separators + 1` children.
#[derive(Clone)]
pub(crate) enum Node<T> {
    Branch(BranchNode<T>),
    Leaf(LeafNode<T>),
}

#[derive(Clone)]
pub(crate) struct LeafNode<T> {
    values: Vec<T>,
}

#[derive(Clone)]
pub(crate) struct BranchNode<T> {
    // children[i] holds v with values[i - 1] <= v <= values[i].
    values: Vec<T>,
    children: Vec<Handle>,
}

/// Which end of a run of equal values a search should land on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Bias {
    /// Index of the first value `>= probe`.
    Before,
    /// Index of the first value `> probe`.
    After,
}

/// Values cut from one end of a node, plus the children that travel with them.
///
/// For a leaf `children` is always empty; for a branch it holds exactly one
/// child per value.
pub(crate) struct Fringe<T> {
    pub(crate) values: Vec<T>,
    pub(crate) children: Vec<Handle>,
}

/// Binary search for `probe` in sorted `values`.
#[inline]
pub(crate) fn position<T, Q>(values: &[T], probe: &Q, bias: Bias) -> usize
where
    T: Borrow<Q>,
    Q: ?Sized + Ord,
{
    match bias {
        Bias::Before => values.partition_point(|v| v.borrow() < probe),
        Bias::After => values.partition_point(|v| v.borrow() <= probe),
    }
}

impl<T> Node<T> {
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Returns the leaf node, panicking if this is a branch.
    pub(crate) fn as_leaf(&self) -> &LeafNode<T> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the leaf node mutably, panicking if this is a branch.
    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<T> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => panic!("expected leaf node"),
        }
    }

    /// Returns the branch node, panicking if this is a leaf.
    pub(crate) fn as_branch(&self) -> &BranchNode<T> {
        match self {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected branch node"),
        }
    }

    /// Returns the branch node mutably, panicking if this is a leaf.
    pub(crate) fn as_branch_mut(&mut self) -> &mut BranchNode<T> {
        match self {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected branch node"),
        }
    }

    /// Number of values (separators, for a branch) in this node.
    pub(crate) fn len(&self) -> usize {
        self.values().len()
    }

    pub(crate) fn values(&self) -> &[T] {
        match self {
            Node::Branch(branch) => &branch.values,
            Node::Leaf(leaf) => &leaf.values,
        }
    }

    /// Child handles; empty for a leaf.
    pub(crate) fn children(&self) -> &[Handle] {
        match self {
            Node::Branch(branch) => &branch.children,
            Node::Leaf(_) => &[],
        }
    }

    /// Cuts `count` values (and as many children) off the front of this node.
    pub(crate) fn take_front(&mut self, count: usize) -> Fringe<T> {
        debug_assert!(count <= self.len(), "`Node::take_front()` - `count` > `len`!");
        match self {
            Node::Leaf(leaf) => Fringe {
                values: take_prefix(&mut leaf.values, count),
                children: Vec::new(),
            },
            Node::Branch(branch) => Fringe {
                values: take_prefix(&mut branch.values, count),
                children: take_prefix(&mut branch.children, count),
            },
        }
    }

    /// Cuts `count` values (and as many children) off the back of this node.
    pub(crate) fn take_back(&mut self, count: usize) -> Fringe<T> {
        debug_assert!(count <= self.len(), "`Node::take_back()` - `count` > `len`!");
        match self {
            Node::Leaf(leaf) => Fringe {
                values: leaf.values.split_off(leaf.values.len() - count),
                children: Vec::new(),
            },
            Node::Branch(branch) => Fringe {
                values: branch.values.split_off(branch.values.len() - count),
                children: branch.children.split_off(branch.children.len() - count),
            },
        }
    }

    pub(crate) fn put_front(&mut self, fringe: Fringe<T>) {
        let Fringe { mut values, mut children } = fringe;
        match self {
            Node::Leaf(leaf) => {
                debug_assert!(children.is_empty(), "`Node::put_front()` - leaf given children!");
                values.append(&mut leaf.values);
                leaf.values = values;
            }
            Node::Branch(branch) => {
                values.append(&mut branch.values);
                branch.values = values;
                children.append(&mut branch.children);
                branch.children = children;
            }
        }
    }

    pub(crate) fn put_back(&mut self, fringe: Fringe<T>) {
        let Fringe { mut values, mut children } = fringe;
        match self {
            Node::Leaf(leaf) => {
                debug_assert!(children.is_empty(), "`Node::put_back()` - leaf given children!");
                leaf.values.append(&mut values);
            }
            Node::Branch(branch) => {
                branch.values.append(&mut values);
                branch.children.append(&mut children);
            }
        }
    }

    /// Splits this node around its median value. Returns (`median`, `sibling`),
    /// where `sibling` is a node of the same kind owning the upper half.
    pub(crate) fn split(&mut self) -> (T, Node<T>) {
        match self {
            Node::Leaf(leaf) => {
                let mid = leaf.values.len() / 2;
                let upper = leaf.values.split_off(mid + 1);
                let median = leaf.values.pop().expect("`Node::split()` - empty leaf!");
                (median, Node::Leaf(LeafNode::new(upper)))
            }
            Node::Branch(branch) => {
                let mid = branch.values.len() / 2;
                let upper = branch.values.split_off(mid + 1);
                let children = branch.children.split_off(mid + 1);
                let median = branch.values.pop().expect("`Node::split()` - empty branch!");
                (median, Node::Branch(BranchNode::new(upper, children)))
            }
        }
    }

    /// Appends `separator` and then all of `right` to this node.
    pub(crate) fn merge(&mut self, separator: T, right: Node<T>) {
        match (self, right) {
            (Node::Leaf(left), Node::Leaf(right)) => {
                left.values.push(separator);
                left.values.extend(right.values);
            }
            (Node::Branch(left), Node::Branch(right)) => {
                left.values.push(separator);
                left.values.extend(right.values);
                left.children.extend(right.children);
            }
            _ => panic!("expected siblings of the same kind"),
        }
    }
}

fn take_prefix<E>(items: &mut Vec<E>, count: usize) -> Vec<E> {
    let rest = items.split_off(count);
    core::mem::replace(items, rest)
}

impl<T> LeafNode<T> {
    pub(crate) fn new(values: Vec<T>) -> Self {
        Self { values }
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn values(&self) -> &[T] {
        &self.values
    }

    pub(crate) fn insert(&mut self, index: usize, value: T) {
        self.values.insert(index, value);
    }

    pub(crate) fn remove(&mut self, index: usize) -> T {
        self.values.remove(index)
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        self.values.pop()
    }

    pub(crate) fn into_values(self) -> Vec<T> {
        self.values
    }

    /// Moves every value `<= pivot` into `out`, keeping the values `> pivot`.
    pub(crate) fn split_prefix<Q>(&mut self, pivot: &Q, out: &mut Vec<T>)
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let cut = position(&self.values, pivot, Bias::After);
        out.extend(self.values.drain(..cut));
    }
}

impl<T> BranchNode<T> {
    pub(crate) fn new(values: Vec<T>, children: Vec<Handle>) -> Self {
        debug_assert_eq!(children.len(), values.len() + 1, "`BranchNode::new()` - child count mismatch!");
        Self { values, children }
    }

    /// Returns the number of separators in this node.
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn first_child(&self) -> Handle {
        self.children[0]
    }

    pub(crate) fn last_child(&self) -> Handle {
        self.children[self.values.len()]
    }

    /// Swaps the separator at `index` for `value`, returning the old separator.
    pub(crate) fn replace_value(&mut self, index: usize, value: T) -> T {
        core::mem::replace(&mut self.values[index], value)
    }

    /// Inserts `value` at `index` with `child` to its right.
    pub(crate) fn insert_child(&mut self, index: usize, value: T, child: Handle) {
        self.values.insert(index, value);
        self.children.insert(index + 1, child);
    }

    /// Removes the separator at `index` and the child to its right.
    pub(crate) fn remove_child(&mut self, index: usize) -> (T, Handle) {
        let value = self.values.remove(index);
        let child = self.children.remove(index + 1);
        (value, child)
    }

    pub(crate) fn into_parts(self) -> (Vec<T>, Vec<Handle>) {
        (self.values, self.children)
    }

    /// Detaches every separator `<= pivot` together with the children to
    /// their left. The child that may still hold values `<= pivot` becomes
    /// `children[0]` of this node.
    pub(crate) fn split_prefix<Q>(&mut self, pivot: &Q) -> (Vec<T>, Vec<Handle>)
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let cut = position(&self.values, pivot, Bias::After);
        let values = self.values.drain(..cut).collect();
        let children = self.children.drain(..cut).collect();
        (values, children)
    }
}
