use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

use alloc::vec;
use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::raw::{Bias, Handle, RawBTree};
use crate::{NotFoundError, Order};

/// A sorted multiset based on a B-tree of configurable [`Order`].
///
/// Equal values may be stored any number of times; they sit next to each
/// other in iteration order, and [`insert`](BTree::insert) /
/// [`insert_after`](BTree::insert_after) decide whether a new value goes
/// before or after its equals.
///
/// Besides the usual ordered operations the tree offers
/// [`pull_prefix`](BTree::pull_prefix), which removes every value up to a
/// pivot in one pass and leaves the remainder balanced. That makes it a good
/// fit for timer queues keyed by deadline.
///
/// It is a logic error for a value to be modified in such a way that its
/// ordering relative to any other value, as determined by the [`Ord`] trait,
/// changes while it is in the tree.
///
/// The tree does no internal locking. To share one instance between threads,
/// wrap it in a mutex.
///
/// # Examples
///
/// ```
/// use btree_multiset::BTree;
///
/// let mut tree = BTree::new(4);
/// for v in [5, 1, 4, 1, 3] {
///     tree.insert(v);
/// }
///
/// assert_eq!(tree.first(), Some(&1));
/// assert!(tree.iter().copied().eq([1, 1, 3, 4, 5]));
///
/// let due: Vec<_> = tree.pull_prefix(&3).collect();
/// assert_eq!(due, [1, 1, 3]);
/// assert!(tree.iter().copied().eq([4, 5]));
/// ```
#[derive(Clone)]
pub struct BTree<T> {
    raw: RawBTree<T>,
}

/// An iterator over the values of a `BTree`, in ascending order.
///
/// This `struct` is created by the [`iter`] method on [`BTree`].
///
/// [`iter`]: BTree::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, T: 'a> {
    tree: &'a RawBTree<T>,
    // Nodes on the way to the next value, each with the index of its next value.
    stack: SmallVec<[(Handle, usize); 16]>,
    remaining: usize,
}

/// An owning iterator over the values of a `BTree`, in ascending order.
///
/// This `struct` is created by the [`into_iter`] method on [`BTree`]
/// (provided by the [`IntoIterator`] trait).
///
/// [`into_iter`]: BTree#method.into_iter
pub struct IntoIter<T> {
    inner: vec::IntoIter<T>,
}

/// The values removed by [`BTree::pull_prefix`], in ascending order.
///
/// The values are already detached from the tree; dropping this iterator
/// drops whatever it has not yielded.
pub struct Prefix<T> {
    inner: vec::IntoIter<T>,
}

/// Indented node-by-node dump of a `BTree`, created by [`BTree::pretty`].
///
/// Each line is one node's values, indented two spaces per level below the
/// root, children listed under their parent. The layout is meant for
/// debugging and may change.
pub struct Pretty<'a, T> {
    tree: &'a RawBTree<T>,
}

impl<T> BTree<T> {
    /// Makes a new, empty `BTree` whose nodes hold at most `order` values.
    ///
    /// # Panics
    ///
    /// Panics if `order < 2`.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_multiset::BTree;
    ///
    /// let mut tree = BTree::new(8);
    /// tree.insert(1);
    /// assert_eq!(tree.len(), 1);
    /// ```
    #[must_use]
    pub fn new(order: usize) -> Self {
        Self::with_order(Order::new(order))
    }

    /// Makes a new, empty `BTree` with an already validated [`Order`].
    #[must_use]
    pub fn with_order(order: Order) -> Self {
        BTree {
            raw: RawBTree::new(order),
        }
    }

    /// Builds a `BTree` directly from values that are already sorted.
    ///
    /// This runs in O(n), skipping the splits that inserting one value at a
    /// time would perform. The result holds the same values in the same order
    /// as a tree built by inserting each value into `BTree::new(order)`.
    ///
    /// # Panics
    ///
    /// Panics if `order < 2` or if `values` is not sorted.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_multiset::BTree;
    ///
    /// let tree = BTree::bulkload([1, 2, 2, 2, 3, 4, 5, 6, 7, 8, 9, 10], 4);
    /// assert_eq!(tree.len(), 12);
    /// assert_eq!(tree.first(), Some(&1));
    /// ```
    #[must_use]
    pub fn bulkload<I>(values: I, order: usize) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Ord,
    {
        BTree {
            raw: RawBTree::bulkload(values.into_iter().collect(), Order::new(order)),
        }
    }

    /// Returns the number of values in the tree, counting duplicates.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree holds no values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Returns the order the tree was built with.
    #[must_use]
    pub const fn order(&self) -> Order {
        self.raw.order()
    }

    /// Removes every value, keeping the order.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the smallest value in the tree, or `None` if it is empty.
    ///
    /// When the minimum is stored more than once, this is the leftmost copy.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_multiset::BTree;
    ///
    /// let mut tree = BTree::new(4);
    /// assert_eq!(tree.first(), None);
    /// tree.insert(7);
    /// tree.insert(3);
    /// assert_eq!(tree.first(), Some(&3));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.raw.first()
    }

    /// Returns the largest value in the tree, or `None` if it is empty.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.raw.last()
    }

    /// Removes and returns the smallest value, or `None` if the tree is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_multiset::BTree;
    ///
    /// let mut tree = BTree::bulkload([1, 2], 4);
    /// assert_eq!(tree.pop_first(), Some(1));
    /// assert_eq!(tree.pop_first(), Some(2));
    /// assert_eq!(tree.pop_first(), None);
    /// ```
    pub fn pop_first(&mut self) -> Option<T> {
        self.raw.pop_first()
    }

    /// Gets an iterator that visits the values in ascending order.
    ///
    /// Each call starts a fresh traversal; iterators share no cursor state.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_multiset::BTree;
    ///
    /// let tree: BTree<_> = [3, 1, 2].into_iter().collect();
    /// let mut iter = tree.iter();
    /// assert_eq!(iter.next(), Some(&1));
    /// assert_eq!(iter.next(), Some(&2));
    /// assert_eq!(iter.next(), Some(&3));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.raw)
    }

    /// Returns a [`Display`](fmt::Display) adapter that dumps the tree's
    /// nodes, one per line, indented by depth.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_multiset::BTree;
    ///
    /// let tree = BTree::bulkload(1..=5, 2);
    /// assert_eq!(tree.pretty().to_string(), "[3]\n  [1, 2]\n  [4, 5]\n");
    /// ```
    pub fn pretty(&self) -> Pretty<'_, T> {
        Pretty { tree: &self.raw }
    }
}

impl<T: Ord> BTree<T> {
    /// Adds a value in front of any equal values already stored.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_multiset::BTree;
    ///
    /// let mut tree = BTree::new(4);
    /// tree.insert((1, "late"));
    /// tree.insert((0, "early"));
    /// assert_eq!(tree.first(), Some(&(0, "early")));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, value: T) {
        self.raw.insert(value, Bias::Before);
    }

    /// Adds a value behind any equal values already stored.
    ///
    /// Inserting only with this method keeps equal values in arrival order.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert_after(&mut self, value: T) {
        self.raw.insert(value, Bias::After);
    }

    /// Returns `true` if the tree holds a value equal to `value`.
    ///
    /// The value may be any borrowed form of the tree's value type, but the
    /// ordering on the borrowed form *must* match the ordering on the value
    /// type.
    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.contains(value)
    }

    /// Removes the rightmost value equal to `value` and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if no equal value is stored; the tree is
    /// left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_multiset::{BTree, NotFoundError};
    ///
    /// let mut tree = BTree::bulkload([1, 2, 3], 4);
    /// assert_eq!(tree.remove(&2), Ok(2));
    /// assert_eq!(tree.remove(&2), Err(NotFoundError));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove<Q>(&mut self, value: &Q) -> Result<T, NotFoundError>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(value, Bias::After).ok_or(NotFoundError)
    }

    /// Removes the leftmost value equal to `value` and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if no equal value is stored; the tree is
    /// left unchanged.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove_first<Q>(&mut self, value: &Q) -> Result<T, NotFoundError>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(value, Bias::Before).ok_or(NotFoundError)
    }

    /// Removes every value less than or equal to `pivot` and returns them in
    /// ascending order.
    ///
    /// The values that stay are exactly those greater than `pivot`, in their
    /// previous order, and the tree is rebalanced before this returns.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_multiset::BTree;
    ///
    /// let mut timers = BTree::new(4);
    /// timers.insert((30, "flush"));
    /// timers.insert((10, "ping"));
    /// timers.insert((20, "retry"));
    ///
    /// let due: Vec<_> = timers.pull_prefix(&(20, "~")).map(|(_, name)| name).collect();
    /// assert_eq!(due, ["ping", "retry"]);
    /// assert_eq!(timers.first(), Some(&(30, "flush")));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(k + log n) for k removed values; O(1) when nothing is due.
    pub fn pull_prefix<Q>(&mut self, pivot: &Q) -> Prefix<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        Prefix {
            inner: self.raw.pull_prefix(pivot).into_iter(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T> Default for BTree<T> {
    /// Creates an empty `BTree` of [`Order::DEFAULT`].
    fn default() -> Self {
        Self::with_order(Order::DEFAULT)
    }
}

impl<T: PartialEq> PartialEq for BTree<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for BTree<T> {}

impl<T: Ord> FromIterator<T> for BTree<T> {
    /// Sorts the values, keeping equal values in arrival order, and
    /// bulk-loads them into a tree of [`Order::DEFAULT`].
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut values: Vec<T> = iter.into_iter().collect();
        values.sort();
        BTree {
            raw: RawBTree::bulkload(values, Order::DEFAULT),
        }
    }
}

impl<T: Ord> Extend<T> for BTree<T> {
    /// Inserts each value behind its equals, so arrival order is kept.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert_after(value);
        }
    }
}

impl<T> IntoIterator for BTree<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            inner: self.raw.into_sorted_vec().into_iter(),
        }
    }
}

impl<'a, T> IntoIterator for &'a BTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> Iter<'a, T> {
    fn new(tree: &'a RawBTree<T>) -> Self {
        let mut iter = Iter {
            tree,
            stack: SmallVec::new(),
            remaining: tree.len(),
        };
        iter.descend(tree.root());
        iter
    }

    /// Pushes `handle` and its leftmost descendants.
    fn descend(&mut self, mut handle: Handle) {
        loop {
            self.stack.push((handle, 0));
            let node = self.tree.node(handle);
            if node.is_leaf() {
                return;
            }
            handle = node.children()[0];
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let tree = self.tree;
        loop {
            let top = self.stack.last_mut()?;
            let (handle, index) = *top;
            let node = tree.node(handle);
            if let Some(value) = node.values().get(index) {
                top.1 += 1;
                if let Some(&child) = node.children().get(index + 1) {
                    self.descend(child);
                }
                self.remaining -= 1;
                return Some(value);
            }
            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<T> FusedIterator for IntoIter<T> {}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.as_slice()).finish()
    }
}

impl<T> Iterator for Prefix<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for Prefix<T> {
    fn next_back(&mut self) -> Option<T> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for Prefix<T> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<T> FusedIterator for Prefix<T> {}

impl<T: fmt::Debug> fmt::Debug for Prefix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.as_slice()).finish()
    }
}

impl<T: fmt::Debug> fmt::Display for Pretty<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![(self.tree.root(), 0usize)];
        while let Some((handle, depth)) = pending.pop() {
            let node = self.tree.node(handle);
            writeln!(f, "{:indent$}{:?}", "", node.values(), indent = 2 * depth)?;
            pending.extend(node.children().iter().rev().map(|&child| (child, depth + 1)));
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn iter_is_restartable_and_exact() {
        let tree = BTree::bulkload(0..50, 3);
        let mut a = tree.iter();
        assert_eq!(a.len(), 50);
        let _ = a.nth(9);
        let b = tree.iter();
        assert_eq!(a.len(), 40);
        assert_eq!(b.len(), 50);
        assert!(a.copied().eq(10..50));
        assert!(b.copied().eq(0..50));
    }

    #[test]
    fn empty_tree_iterates_nothing() {
        let tree: BTree<u8> = BTree::new(2);
        assert_eq!(tree.iter().next(), None);
        assert_eq!(tree.pretty().to_string(), "[]\n");
    }

    #[test]
    fn pretty_indents_each_level() {
        let tree = BTree::bulkload(1..=11, 2);
        let dump = tree.pretty().to_string();
        assert_eq!(dump.lines().next(), Some("[6]"));
        assert!(dump.lines().any(|line| line == "    [1, 2]"));
        assert_eq!(dump.lines().count(), 7);
    }

    #[test]
    fn debug_lists_values() {
        let tree = BTree::bulkload([1, 1, 2], 4);
        assert_eq!(alloc::format!("{tree:?}"), "{1, 1, 2}");
        assert_eq!(alloc::format!("{:?}", tree.iter()), "[1, 1, 2]");
    }

    #[test]
    fn equality_ignores_shape() {
        let bulk = BTree::bulkload(0..100, 5);
        let mut inserted = BTree::new(3);
        inserted.extend((0..100).rev());
        assert_eq!(bulk, inserted);
        inserted.pop_first();
        assert_ne!(bulk, inserted);
    }
}
