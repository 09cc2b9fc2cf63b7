use alloc::vec::Vec;

use super::handle::Handle;

/// Slot storage for tree nodes.
///
/// The arena is the single owner of every node. Freed slots are recycled
/// LIFO so a split right after a merge reuses the merged node's slot.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    vacant: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            vacant: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            vacant: Vec::new(),
        }
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    pub(crate) fn insert(&mut self, node: T) -> Handle {
        if let Some(handle) = self.vacant.pop() {
            self.slots[handle.slot()] = Some(node);
            return handle;
        }

        assert!(
            self.slots.len() <= Handle::MAX,
            "`Arena::insert()` - arena is full ({} nodes)!",
            Handle::MAX + 1
        );
        self.slots.push(Some(node));
        Handle::from_slot(self.slots.len() - 1)
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.slot()].as_ref().expect("`Arena::get()` - `handle` is vacant!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.slot()].as_mut().expect("`Arena::get_mut()` - `handle` is vacant!")
    }

    /// Removes the node behind `handle` and hands ownership to the caller.
    pub(crate) fn remove(&mut self, handle: Handle) -> T {
        let node = self.slots[handle.slot()].take().expect("`Arena::remove()` - `handle` is vacant!");
        self.vacant.push(handle);
        node
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.vacant.clear();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn removed_slot_is_reused_first() {
        let mut arena: Arena<&str> = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.remove(a), "a");
        assert_eq!(arena.len(), 1);

        let c = arena.insert("c");
        assert_eq!(c, a);
        assert_eq!(*arena.get(b), "b");
        assert_eq!(*arena.get(c), "c");
    }

    #[test]
    #[should_panic(expected = "`Arena::get()` - `handle` is vacant!")]
    fn vacant_handle_panics() {
        let mut arena: Arena<u8> = Arena::with_capacity(4);
        let h = arena.insert(7);
        arena.remove(h);
        let _ = arena.get(h);
    }

    #[derive(Clone, Debug)]
    enum Step {
        Insert(u32),
        Overwrite(usize, u32),
        Remove(usize),
        Clear,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            8 => any::<u32>().prop_map(Step::Insert),
            3 => (any::<usize>(), any::<u32>()).prop_map(|(i, v)| Step::Overwrite(i, v)),
            4 => any::<usize>().prop_map(Step::Remove),
            1 => Just(Step::Clear),
        ]
    }

    proptest! {
        #[test]
        fn live_handles_track_their_nodes(steps in prop::collection::vec(step(), 0..256)) {
            let mut arena: Arena<u32> = Arena::new();
            let mut live: Vec<(Handle, u32)> = Vec::new();

            for step in steps {
                match step {
                    Step::Insert(v) => live.push((arena.insert(v), v)),
                    Step::Overwrite(i, v) if !live.is_empty() => {
                        let i = i % live.len();
                        *arena.get_mut(live[i].0) = v;
                        live[i].1 = v;
                    }
                    Step::Remove(i) if !live.is_empty() => {
                        let (h, v) = live.swap_remove(i % live.len());
                        prop_assert_eq!(arena.remove(h), v);
                    }
                    Step::Clear => {
                        arena.clear();
                        live.clear();
                    }
                    Step::Overwrite(..) | Step::Remove(_) => {}
                }

                prop_assert_eq!(arena.len(), live.len());
                for &(h, v) in &live {
                    prop_assert_eq!(*arena.get(h), v);
                }
            }
        }
    }
}
