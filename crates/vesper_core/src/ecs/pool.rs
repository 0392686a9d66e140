//! # Component Pools
//!
//! Pre-sized, densely packed storage for a single component type.
//!
//! Each pool is a slot map built from parallel arrays:
//! - `dense`: the component values, packed for cache-friendly iteration
//! - `index_map`: entity index -> dense slot (or a null sentinel)
//! - `slot_pool` + high-water counter: free list of reusable dense slots
//!
//! Removal is O(1) and never shifts the dense array - the freed slot is
//! simply recycled by the next insert, which may belong to a completely
//! different entity index.
//!
//! ## Reference stability
//!
//! Resizable pools grow in fixed increments; every growth relocates the
//! backing storage and is therefore logged as a warning, because any
//! reference previously handed out is invalidated. Types that cannot
//! tolerate that (move-only resource handles) mark themselves
//! [`NON_RESIZABLE`](Component::NON_RESIZABLE) and pre-reserve their
//! whole budget at construction, so the backing storage never moves.

use std::any::{type_name, Any};

use crate::ecs::component::Component;

/// Sentinel marking an entity index with no live component in the pool.
const NULL_SLOT: u32 = u32::MAX;

/// Fixed growth increment for resizable pools.
const POOL_GROWTH: usize = 128;

/// Type-erased face of a component pool.
///
/// The entity manager owns one boxed `Pool` per registered component
/// type and drives destruction through this trait - `reset` is invoked
/// on *every* pool when an entity is committed for destruction, so that
/// move-only component values are dropped even if mask bookkeeping
/// drifted.
pub trait Pool: Any + Send + Sync {
    /// Releases the component held for `index`, if any.
    ///
    /// The slot is overwritten with a default-constructed value (running
    /// the old value's drop, which releases any owned resource), the
    /// dense slot returns to the free list and the mapping entry is
    /// cleared. No-op if the index was never present.
    fn reset(&mut self, index: u32);

    /// Drops all dense storage and reinitialises the free list.
    ///
    /// Used only on full pool teardown.
    fn clear(&mut self);

    /// Number of live components in the pool.
    fn used(&self) -> usize;

    /// Current allocation size of the dense array (not the live count).
    fn capacity(&self) -> usize;

    /// Name of the stored component type, for diagnostics.
    fn type_name(&self) -> &'static str;
}

/// Dense storage for a single component type.
pub struct ComponentPool<C: Component> {
    /// Packed component values.
    dense: Vec<C>,
    /// Entity index -> dense slot, `NULL_SLOT` when absent.
    index_map: Vec<u32>,
    /// Recycled dense slots live at `[next_free..]`; `[..next_free]` is spent.
    slot_pool: Vec<u32>,
    /// High-water counter: doubles as the live-entry count.
    next_free: usize,
}

impl<C: Component> ComponentPool<C> {
    /// Creates a pool sized for `initial_size` components.
    ///
    /// Non-resizable component types ignore `initial_size` and reserve
    /// their full [`MAX_POOL_SIZE`](Component::MAX_POOL_SIZE) budget
    /// immediately, so the dense buffer never relocates.
    #[must_use]
    pub fn new(initial_size: usize) -> Self {
        let dense = if C::NON_RESIZABLE {
            tracing::info!(
                component = type_name::<C>(),
                capacity = C::MAX_POOL_SIZE,
                "reserved maximum pool size for non-resizable component"
            );
            Vec::with_capacity(C::MAX_POOL_SIZE)
        } else {
            let mut dense = Vec::new();
            dense.resize_with(initial_size.min(C::MAX_POOL_SIZE), C::default);
            dense
        };

        Self {
            dense,
            index_map: Vec::new(),
            slot_pool: Vec::new(),
            next_free: 0,
        }
    }

    /// Stores `value` for the given entity index.
    ///
    /// Allocates a dense slot from the free list (or mints a fresh one),
    /// grows the backing storage if the slot lies beyond it, records the
    /// mapping and moves the value in. Returns a reference to the stored
    /// value.
    ///
    /// # Panics
    ///
    /// Panics if the pool would exceed `C::MAX_POOL_SIZE` - exceeding a
    /// pool budget is a build-time configuration error.
    pub fn insert(&mut self, index: u32, value: C) -> &mut C {
        let idx = index as usize;
        if idx >= self.index_map.len() {
            self.index_map.resize(idx + 1, NULL_SLOT);
        }
        debug_assert!(
            self.index_map[idx] == NULL_SLOT,
            "component inserted twice for one entity index"
        );

        let slot = self.take_slot();
        self.index_map[idx] = slot;

        let slot_idx = slot as usize;
        if slot_idx >= self.dense.len() {
            self.grow_for(slot_idx);
        }
        self.dense[slot_idx] = value;
        &mut self.dense[slot_idx]
    }

    /// Gets the component stored for the given entity index.
    ///
    /// O(1) two-hop lookup. The pool trusts the entity manager's mask
    /// bookkeeping for performance: calling this for an index whose mask
    /// bit is not set is a contract violation and panics on the sentinel
    /// mapping.
    #[inline]
    #[must_use]
    pub fn get(&self, index: u32) -> &C {
        let slot = self.index_map[index as usize];
        debug_assert!(slot != NULL_SLOT, "component access without a mask check");
        &self.dense[slot as usize]
    }

    /// Gets the component stored for the given entity index, mutably.
    ///
    /// Same contract as [`get`](ComponentPool::get).
    #[inline]
    pub fn get_mut(&mut self, index: u32) -> &mut C {
        let slot = self.index_map[index as usize];
        debug_assert!(slot != NULL_SLOT, "component access without a mask check");
        &mut self.dense[slot as usize]
    }

    /// Checks whether the pool holds a live component for the index.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: u32) -> bool {
        self.index_map
            .get(index as usize)
            .is_some_and(|slot| *slot != NULL_SLOT)
    }

    /// Takes the next dense slot off the free list, minting a fresh slot
    /// id when no recycled one is available.
    fn take_slot(&mut self) -> u32 {
        if self.next_free == self.slot_pool.len() {
            let fresh = u32::try_from(self.slot_pool.len()).expect("dense slot id overflow");
            self.slot_pool.push(fresh);
        }
        let slot = self.slot_pool[self.next_free];
        self.next_free += 1;
        slot
    }

    /// Grows the dense array so `slot` is addressable.
    fn grow_for(&mut self, slot: usize) {
        assert!(
            slot < C::MAX_POOL_SIZE,
            "component pool exceeded its maximum size"
        );
        let target = (slot + POOL_GROWTH).min(C::MAX_POOL_SIZE);
        if !C::NON_RESIZABLE {
            // growth relocates the dense buffer, so references handed out
            // earlier are no longer trustworthy
            tracing::warn!(
                component = type_name::<C>(),
                new_size = target,
                "component pool resized - existing component references may be invalidated"
            );
        }
        self.dense.resize_with(target, C::default);
    }
}

impl<C: Component> Pool for ComponentPool<C> {
    fn reset(&mut self, index: u32) {
        let idx = index as usize;
        if idx >= self.index_map.len() {
            return;
        }
        let slot = self.index_map[idx];
        if slot == NULL_SLOT {
            return;
        }

        self.dense[slot as usize] = C::default();

        self.next_free -= 1;
        self.slot_pool[self.next_free] = slot;
        self.index_map[idx] = NULL_SLOT;
    }

    fn clear(&mut self) {
        self.dense.clear();
        self.index_map.clear();
        self.slot_pool.clear();
        self.next_free = 0;
    }

    fn used(&self) -> usize {
        self.next_free
    }

    fn capacity(&self) -> usize {
        self.dense.len()
    }

    fn type_name(&self) -> &'static str {
        type_name::<C>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Health {
        value: i32,
    }

    impl Component for Health {
        const ID: u8 = 0;
    }

    /// Move-only stand-in for a GPU resource handle.
    #[derive(Debug, Default, PartialEq)]
    struct MeshHandle {
        buffer: Option<Box<u64>>,
    }

    impl Component for MeshHandle {
        const ID: u8 = 1;
        const NON_RESIZABLE: bool = true;
        const MAX_POOL_SIZE: usize = 8;
    }

    #[test]
    fn test_insert_get_roundtrip() {
        let mut pool = ComponentPool::<Health>::new(4);
        pool.insert(2, Health { value: 50 });

        assert!(pool.contains(2));
        assert!(!pool.contains(0));
        assert_eq!(*pool.get(2), Health { value: 50 });
        assert_eq!(pool.used(), 1);
    }

    #[test]
    fn test_reset_recycles_dense_slot() {
        let mut pool = ComponentPool::<Health>::new(4);
        pool.insert(0, Health { value: 1 });
        pool.insert(1, Health { value: 2 });

        pool.reset(0);
        assert!(!pool.contains(0));
        assert_eq!(pool.used(), 1);

        // the freed dense slot is handed to a different entity index
        pool.insert(9, Health { value: 3 });
        assert_eq!(pool.used(), 2);
        assert_eq!(*pool.get(9), Health { value: 3 });
        assert_eq!(*pool.get(1), Health { value: 2 });
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut pool = ComponentPool::<Health>::new(4);
        pool.insert(3, Health { value: 7 });

        pool.reset(3);
        pool.reset(3);
        pool.reset(100); // never present, far out of range

        assert_eq!(pool.used(), 0);
        assert!(!pool.contains(3));
    }

    #[test]
    fn test_resizable_pool_grows() {
        let mut pool = ComponentPool::<Health>::new(2);
        for index in 0..10 {
            pool.insert(index, Health { value: i32::try_from(index).unwrap() });
        }
        assert_eq!(pool.used(), 10);
        assert!(pool.capacity() >= 10);
        assert_eq!(*pool.get(7), Health { value: 7 });
    }

    #[test]
    fn test_move_only_component_is_dropped_on_reset() {
        let mut pool = ComponentPool::<MeshHandle>::new(4);
        pool.insert(0, MeshHandle { buffer: Some(Box::new(0xBEEF)) });

        pool.reset(0);
        // slot is back to the default (resource released)
        pool.insert(5, MeshHandle::default());
        assert_eq!(*pool.get(5), MeshHandle::default());
    }

    #[test]
    fn test_non_resizable_pool_never_relocates() {
        let mut pool = ComponentPool::<MeshHandle>::new(4);
        pool.insert(0, MeshHandle { buffer: Some(Box::new(1)) });
        let stable: *const MeshHandle = pool.get(0);

        for index in 1..u32::try_from(MeshHandle::MAX_POOL_SIZE).unwrap() {
            pool.insert(index, MeshHandle { buffer: Some(Box::new(u64::from(index))) });
        }

        let after: *const MeshHandle = pool.get(0);
        assert_eq!(stable, after);
        assert_eq!(*pool.get(0), MeshHandle { buffer: Some(Box::new(1)) });
    }

    #[test]
    #[should_panic(expected = "maximum size")]
    fn test_exceeding_pool_budget_is_fatal() {
        let mut pool = ComponentPool::<MeshHandle>::new(4);
        for index in 0..=u32::try_from(MeshHandle::MAX_POOL_SIZE).unwrap() {
            pool.insert(index, MeshHandle::default());
        }
    }

    #[test]
    fn test_clear_reinitialises_free_list() {
        let mut pool = ComponentPool::<Health>::new(4);
        pool.insert(0, Health { value: 1 });
        pool.insert(1, Health { value: 2 });

        Pool::clear(&mut pool);
        assert_eq!(pool.used(), 0);
        assert_eq!(pool.capacity(), 0);
        assert!(!pool.contains(0));

        pool.insert(2, Health { value: 3 });
        assert_eq!(*pool.get(2), Health { value: 3 });
    }
}
