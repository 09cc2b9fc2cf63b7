use thiserror::Error;

/// Returned by [`BTree::remove`](crate::BTree::remove) and
/// [`BTree::remove_first`](crate::BTree::remove_first) when no equal value is
/// stored. The tree is left unchanged.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Error)]
#[error("element not found")]
pub struct NotFoundError;

/// Returned when converting a number below [`Order::MIN`](crate::Order::MIN)
/// into an [`Order`](crate::Order).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[error("invalid B-tree order {order}: must be at least 2")]
pub struct InvalidOrderError {
    /// The rejected order.
    pub order: usize,
}
