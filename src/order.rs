use crate::error::InvalidOrderError;

/// The order of a [`BTree`](crate::BTree): the most values any node may hold.
///
/// Every node other than the root holds at least `order / 2` values.
///
/// # Examples
///
/// ```
/// use btree_multiset::Order;
///
/// let order = Order::new(5);
/// assert_eq!(order.max_len(), 5);
/// assert_eq!(order.min_len(), 2);
///
/// assert!(Order::try_from(1).is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Order(usize);

impl Order {
    /// The smallest order that still leaves room to split a node.
    pub const MIN: usize = 2;

    /// The order used by [`BTree::default`](crate::BTree::default) and
    /// [`FromIterator`].
    pub const DEFAULT: Self = Self(16);

    /// Creates an order.
    ///
    /// # Panics
    ///
    /// Panics if `order < 2`.
    #[must_use]
    pub const fn new(order: usize) -> Self {
        assert!(order >= Self::MIN, "`Order::new()` - `order` < 2!");
        Self(order)
    }

    /// Returns the order as a plain number.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// The most values a node may hold.
    #[must_use]
    pub const fn max_len(self) -> usize {
        self.0
    }

    /// The fewest values a non-root node may hold.
    #[must_use]
    pub const fn min_len(self) -> usize {
        self.0 / 2
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<usize> for Order {
    type Error = InvalidOrderError;

    fn try_from(order: usize) -> Result<Self, Self::Error> {
        if order < Self::MIN {
            return Err(InvalidOrderError { order });
        }
        Ok(Self(order))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "`Order::new()` - `order` < 2!")]
    fn order_below_two_panics() {
        let _ = Order::new(1);
    }

    #[test]
    fn bounds_follow_order() {
        assert_eq!((Order::new(2).min_len(), Order::new(2).max_len()), (1, 2));
        assert_eq!((Order::new(3).min_len(), Order::new(3).max_len()), (1, 3));
        assert_eq!((Order::new(8).min_len(), Order::new(8).max_len()), (4, 8));
    }

    #[test]
    fn try_from_reports_rejected_order() {
        assert_eq!(Order::try_from(0), Err(InvalidOrderError { order: 0 }));
        assert_eq!(Order::try_from(7), Ok(Order::new(7)));
    }
}
