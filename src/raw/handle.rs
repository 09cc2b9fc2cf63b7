use core::num::NonZero;

// Small handles in tests keep the exhaustive limit checks fast.
#[cfg(test)]
type RawHandle = u16;
#[cfg(not(test))]
type RawHandle = u32;

/// Non-owning locator for a node stored in the tree's [`Arena`](super::arena::Arena).
///
/// Branches refer to their children through handles, and the tree caches the
/// handle of its leftmost leaf. A handle never keeps a node alive on its own.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<RawHandle>);

impl Handle {
    pub(crate) const MAX: usize = (RawHandle::MAX - 1) as usize;

    #[inline]
    pub(crate) const fn from_slot(slot: usize) -> Self {
        assert!(slot <= Self::MAX, "`Handle::from_slot()` - `slot` > `Handle::MAX`!");
        #[allow(clippy::cast_possible_truncation)]
        let raw = (slot + 1) as RawHandle;
        match NonZero::new(raw) {
            Some(raw) => Self(raw),
            None => unreachable!(),
        }
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use static_assertions::assert_eq_size;

    // `Option<Handle>` is the `first` locator; it must not cost extra space.
    assert_eq_size!(Handle, Option<Handle>);
    assert_eq_size!(Handle, RawHandle);

    #[test]
    #[should_panic(expected = "`Handle::from_slot()` - `slot` > `Handle::MAX`!")]
    fn slot_past_max_panics() {
        let _ = Handle::from_slot(Handle::MAX + 1);
    }

    #[test]
    fn max_slot_is_addressable() {
        assert_eq!(Handle::from_slot(Handle::MAX).slot(), Handle::MAX);
    }

    proptest! {
        #[test]
        fn slot_survives_handle(slot in 0..=Handle::MAX) {
            prop_assert_eq!(Handle::from_slot(slot).slot(), slot);
        }
    }
}
