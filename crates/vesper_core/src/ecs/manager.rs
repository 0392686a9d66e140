//! # Entity Manager
//!
//! The allocator and bookkeeping layer of the scene: mints generational
//! entity handles, owns the per-index generation/mask/label tables and
//! the registry of per-type component pools, and orchestrates entity
//! destruction across all pools.
//!
//! Destruction is two-phase: a handle is first *marked* for destruction
//! and later *committed* at an explicit point (the world's `simulate`).
//! Committing a slot whose generation no longer matches the handle is a
//! silent no-op - stale handles occur naturally when another system
//! holds one across a frame boundary.

use std::any::Any;
use std::collections::VecDeque;

use crate::config::CoreConfig;
use crate::ecs::component::{Component, ComponentMask, MAX_COMPONENTS};
use crate::ecs::entity::{Entity, MAX_ENTITIES};
use crate::ecs::pool::{ComponentPool, Pool};
use crate::message::{self, MessageBus, SceneEvent};

/// Growth chunk for the mask/label/flag tables.
const MASK_TABLE_GROWTH: usize = 50;

/// Manages the relationship between entities and their components.
///
/// Owned exclusively by one [`World`](crate::ecs::World) instance - no
/// cross-instance sharing, no global registries.
pub struct EntityManager {
    /// Per-index generation counters, incremented on every destroy/recycle.
    generations: Vec<u8>,
    /// Freed index slots, oldest first.
    free_ids: VecDeque<u32>,
    /// Per-index component masks.
    masks: Vec<ComponentMask>,
    /// Per-index "marked for destruction" flags.
    destruction_flags: Vec<bool>,
    /// Per-index debug labels.
    labels: Vec<String>,
    /// Component pools, indexed by `Component::ID`.
    pools: Vec<Option<Box<dyn Pool>>>,
    /// Number of currently live entities.
    entity_count: usize,
    /// Free slots outstanding before indices are recycled instead of minted.
    min_free_ids: usize,
    /// Initial dense size for newly created resizable pools.
    initial_pool_size: usize,
}

impl EntityManager {
    /// Creates an empty manager using the given configuration.
    #[must_use]
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            generations: Vec::new(),
            free_ids: VecDeque::new(),
            masks: Vec::new(),
            destruction_flags: Vec::new(),
            labels: Vec::new(),
            pools: (0..MAX_COMPONENTS).map(|_| None).collect(),
            entity_count: 0,
            min_free_ids: config.min_free_ids,
            initial_pool_size: config.initial_pool_size,
        }
    }

    /// Creates a new entity, returning its handle.
    ///
    /// Once `min_free_ids` freed slots are outstanding, the oldest freed
    /// index is recycled (with the generation it was bumped to at
    /// destruction) instead of growing the table - this bounds how long
    /// a stale handle can keep aliasing a live slot.
    ///
    /// # Panics
    ///
    /// Panics when the 24-bit index space is exhausted. That is a
    /// configuration error caught during development, not a runtime
    /// condition to retry.
    pub fn create_entity(&mut self) -> Entity {
        let recycle = (!self.free_ids.is_empty() && self.free_ids.len() >= self.min_free_ids)
            || (self.generations.len() >= MAX_ENTITIES as usize && !self.free_ids.is_empty());

        let index = if recycle {
            self.free_ids
                .pop_front()
                .expect("free list checked non-empty above")
        } else {
            assert!(
                self.generations.len() < MAX_ENTITIES as usize,
                "entity index space exhausted"
            );
            let index = u32::try_from(self.generations.len()).expect("index fits 24 bits");
            self.generations.push(0);
            if index as usize >= self.masks.len() {
                let new_len = self.masks.len() + MASK_TABLE_GROWTH;
                self.masks.resize(new_len, ComponentMask::EMPTY);
                self.destruction_flags.resize(new_len, false);
                self.labels.resize(new_len, String::new());
            }
            index
        };

        self.destruction_flags[index as usize] = false;
        self.entity_count += 1;

        Entity::new(index, self.generations[index as usize])
    }

    /// Marks an entity for destruction (phase one of two-phase destroy).
    ///
    /// Stale handles are ignored.
    pub fn mark_destroyed(&mut self, entity: Entity) {
        if !self.entity_valid(entity) {
            return;
        }
        self.destruction_flags[entity.index() as usize] = true;
    }

    /// Commits a previously marked destruction (phase two).
    ///
    /// If the stored generation still matches the handle: bumps the
    /// generation, clears the component mask and debug label, invokes
    /// `reset` on *every* registered pool (not just those flagged in the
    /// mask, so move-only component values are dropped even if the
    /// bookkeeping drifted), returns the index to the free list and
    /// posts a [`SceneEvent::ENTITY_DESTROYED`] notification carrying
    /// the raw index. A generation mismatch means the slot was already
    /// recycled and the commit is a silent no-op.
    ///
    /// # Panics
    ///
    /// Panics if the entity was never marked for destruction - calling
    /// the commit directly is a hard logic error.
    pub fn destroy_entity(&mut self, entity: Entity, messages: &mut MessageBus) {
        let index = entity.index() as usize;
        assert!(index < self.generations.len(), "entity index out of range");
        assert!(
            self.destruction_flags[index],
            "entity was not marked for destruction"
        );

        // a generation mismatch means this handle was already destroyed
        // and the slot recycled
        if self.generations[index] != entity.generation() {
            return;
        }

        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free_ids.push_back(entity.index());
        self.masks[index].reset();
        self.labels[index].clear();
        self.entity_count -= 1;

        // forcefully reset components which might otherwise orphan
        // move-only values
        for pool in self.pools.iter_mut().flatten() {
            pool.reset(entity.index());
        }

        tracing::debug!(index = entity.index(), "entity destroyed");

        messages.post(
            message::id::SCENE,
            SceneEvent {
                entity_id: entity.index(),
                event: SceneEvent::ENTITY_DESTROYED,
            },
        );
    }

    /// Checks whether the handle still refers to a live slot.
    ///
    /// Pure generation comparison - O(1), never fails; a stale or
    /// out-of-range handle simply reads as invalid.
    #[inline]
    #[must_use]
    pub fn entity_valid(&self, entity: Entity) -> bool {
        let index = entity.index() as usize;
        !entity.is_null()
            && index < self.generations.len()
            && self.generations[index] == entity.generation()
    }

    /// Checks whether the entity is marked for destruction.
    ///
    /// Distinct from "already recycled" - a marked entity stays valid
    /// until the commit point.
    #[inline]
    #[must_use]
    pub fn entity_destroyed(&self, entity: Entity) -> bool {
        let index = entity.index() as usize;
        index < self.destruction_flags.len() && self.destruction_flags[index]
    }

    /// Reconstructs a handle for a raw index with the slot's *current*
    /// generation.
    ///
    /// Used when only an index survives, e.g. from a message payload.
    ///
    /// # Panics
    ///
    /// Panics if the index was never allocated.
    #[must_use]
    pub fn get_entity(&self, index: u32) -> Entity {
        assert!(
            (index as usize) < self.generations.len(),
            "invalid entity index"
        );
        Entity::new(index, self.generations[index as usize])
    }

    /// Returns the component mask of the given entity's slot.
    ///
    /// Read-only for callers outside the manager/pool boundary; an
    /// out-of-range handle reads as an empty mask.
    #[inline]
    #[must_use]
    pub fn component_mask(&self, entity: Entity) -> ComponentMask {
        self.masks
            .get(entity.index() as usize)
            .copied()
            .unwrap_or(ComponentMask::EMPTY)
    }

    /// Attaches a component to the entity, returning a reference to the
    /// stored value.
    ///
    /// Thin forwarding into the type's pool; the mask bit is set
    /// immediately after the pool insert succeeds. Attaching a component
    /// the entity already carries is a logic error.
    ///
    /// Composition changes made directly on the manager do not touch
    /// system working sets - route through the world for dispatch.
    ///
    /// # Panics
    ///
    /// Panics if `C::ID` is outside the 64-bit mask budget.
    pub fn add_component<C: Component>(&mut self, entity: Entity, component: C) -> &mut C {
        assert!(
            (C::ID as usize) < MAX_COMPONENTS,
            "component ID out of range"
        );
        debug_assert!(
            self.entity_valid(entity),
            "add_component on a stale entity handle"
        );
        let index = entity.index();
        let initial_size = self.initial_pool_size;

        let boxed = self.pools[C::ID as usize]
            .get_or_insert_with(|| Box::new(ComponentPool::<C>::new(initial_size)));
        let pool: &mut dyn Any = &mut **boxed;
        let pool = pool
            .downcast_mut::<ComponentPool<C>>()
            .expect("component ID claimed by two different component types");

        let component = pool.insert(index, component);
        self.masks[index as usize].set(C::ID);
        component
    }

    /// Detaches the component of type `C` from the entity, if present.
    ///
    /// The mask bit is cleared immediately before the pool reset. Safe
    /// to call repeatedly - removing an absent component is a no-op, as
    /// is removing from a stale handle.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) {
        if !self.entity_valid(entity) {
            return;
        }
        let index = entity.index();
        self.masks[index as usize].clear(C::ID);
        if let Some(pool) = self.pools[C::ID as usize].as_deref_mut() {
            pool.reset(index);
        }
    }

    /// Checks whether the entity currently carries a component of type `C`.
    ///
    /// Mask test only - O(1); stale handles read as `false`.
    #[inline]
    #[must_use]
    pub fn has_component<C: Component>(&self, entity: Entity) -> bool {
        self.entity_valid(entity) && self.component_mask(entity).test(C::ID)
    }

    /// Returns a reference to the entity's component of type `C`.
    ///
    /// The mask check performed by [`has_component`] is the only guard;
    /// callers are responsible for it, and accessing an absent component
    /// panics. This is a deliberate trade-off - no per-access validation
    /// in hot iteration paths.
    ///
    /// # Panics
    ///
    /// Panics if no component of type `C` is attached to the entity.
    ///
    /// [`has_component`]: EntityManager::has_component
    #[inline]
    #[must_use]
    pub fn get_component<C: Component>(&self, entity: Entity) -> &C {
        debug_assert!(
            self.has_component::<C>(entity),
            "get_component without a has_component check"
        );
        self.pool::<C>()
            .expect("no pool registered for this component type")
            .get(entity.index())
    }

    /// Returns a mutable reference to the entity's component of type `C`.
    ///
    /// Same contract as [`get_component`](EntityManager::get_component).
    ///
    /// # Panics
    ///
    /// Panics if no component of type `C` is attached to the entity.
    #[inline]
    pub fn get_component_mut<C: Component>(&mut self, entity: Entity) -> &mut C {
        debug_assert!(
            self.has_component::<C>(entity),
            "get_component_mut without a has_component check"
        );
        self.pool_mut::<C>()
            .expect("no pool registered for this component type")
            .get_mut(entity.index())
    }

    /// Attaches a debug label to the entity. Stale handles are ignored.
    pub fn set_label(&mut self, entity: Entity, label: impl Into<String>) {
        if !self.entity_valid(entity) {
            return;
        }
        self.labels[entity.index() as usize] = label.into();
    }

    /// Returns the entity's debug label, empty if none was set.
    #[must_use]
    pub fn label(&self, entity: Entity) -> &str {
        self.labels
            .get(entity.index() as usize)
            .map_or("", String::as_str)
    }

    /// Number of currently live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    /// Drops every entity and tears down all component pools.
    pub fn clear(&mut self) {
        self.generations.clear();
        self.free_ids.clear();
        self.masks.clear();
        self.destruction_flags.clear();
        self.labels.clear();
        self.entity_count = 0;
        for pool in self.pools.iter_mut().flatten() {
            pool.clear();
        }
    }

    fn pool<C: Component>(&self) -> Option<&ComponentPool<C>> {
        self.pools[C::ID as usize].as_deref().and_then(|pool| {
            let pool: &dyn Any = pool;
            pool.downcast_ref::<ComponentPool<C>>()
        })
    }

    fn pool_mut<C: Component>(&mut self) -> Option<&mut ComponentPool<C>> {
        self.pools[C::ID as usize].as_deref_mut().and_then(|pool| {
            let pool: &mut dyn Any = pool;
            pool.downcast_mut::<ComponentPool<C>>()
        })
    }
}
