//! A sorted multiset B-tree with bulk loading and prefix extraction.
//!
//! [`BTree`] keeps values in ascending order, stores duplicates side by side,
//! and lets callers choose whether a new value lands before or after its
//! equals. Two operations go beyond a plain ordered set:
//!
//! - [`bulkload`](BTree::bulkload) - build a balanced tree from sorted input in O(n)
//! - [`pull_prefix`](BTree::pull_prefix) - remove every value up to a pivot in one pass
//!
//! # Example
//!
//! A timer queue ordered by deadline, with a token to tell timers apart:
//!
//! ```
//! use btree_multiset::BTree;
//!
//! let mut timers = BTree::new(8);
//! timers.insert((250_u64, 3_u32));
//! timers.insert((100, 1));
//! timers.insert((100, 2));
//! timers.insert((900, 4));
//!
//! // Peek at the next deadline without touching the tree.
//! assert_eq!(timers.first(), Some(&(100, 1)));
//!
//! // Fire everything due at t = 250.
//! let fired: Vec<u32> = timers.pull_prefix(&(250, u32::MAX)).map(|(_, token)| token).collect();
//! assert_eq!(fired, [1, 2, 3]);
//!
//! // Cancel a timer that has not fired yet.
//! assert_eq!(timers.remove(&(900, 4)), Ok((900, 4)));
//! assert!(timers.is_empty());
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`
//! - **Configurable [`Order`]** - Maximum values per node, fixed at construction
//! - **O(1) minimum** - The leftmost leaf is cached
//!
//! # Implementation
//!
//! Nodes live in an arena and refer to their children by handle. Separators in
//! branch nodes are real values, so each value is stored exactly once.
//! Rebalancing moves values between siblings before it resorts to splitting
//! or merging nodes.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod btree;
mod error;
mod order;
mod raw;

pub use btree::{BTree, IntoIter, Iter, Prefix, Pretty};
pub use error::{InvalidOrderError, NotFoundError};
pub use order::Order;
