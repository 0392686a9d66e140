//! # World
//!
//! The central container of one scene: an entity manager, a system
//! manager and a message bus under a single owner. All three are plain
//! fields - there are no process-wide registries, and two worlds never
//! share state.
//!
//! ## Frame lifecycle
//!
//! ```text
//! create_entity()            handle minted, queued as pending
//! add_component(..)          pool insert + mask bit; live entities
//!                            re-dispatch to systems immediately
//! destroy_entity(..)         marked for destruction, queued
//! simulate(dt)               commit point:
//!                              1. pending entities join their systems
//!                              2. destructions commit (pools reset,
//!                                 generation bumped, message posted)
//!                              3. active systems process, in
//!                                 registration order
//! ```
//!
//! Everything above happens on one simulation thread; mutation is
//! exclusive-writer by construction (`&mut self` throughout).

use crate::config::CoreConfig;
use crate::ecs::component::{Component, ComponentMask};
use crate::ecs::entity::Entity;
use crate::ecs::manager::EntityManager;
use crate::ecs::system::{System, SystemManager};
use crate::message::{Message, MessageBus};

/// A self-contained scene: entities, components, systems and messages.
pub struct World {
    messages: MessageBus,
    entities: EntityManager,
    systems: SystemManager,
    /// Entities created since the last `simulate`, not yet in any system.
    pending: Vec<Entity>,
    /// Entities marked for destruction since the last `simulate`.
    destroyed: Vec<Entity>,
}

impl World {
    /// Creates a world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&CoreConfig::default())
    }

    /// Creates a world with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if `initial_pool_size` exceeds `min_free_ids` - sizing a
    /// fresh pool past the recycling watermark is just a waste of
    /// memory.
    #[must_use]
    pub fn with_config(config: &CoreConfig) -> Self {
        assert!(
            config.initial_pool_size <= config.min_free_ids,
            "initial pool size past the free-ID watermark is wasted memory"
        );
        Self {
            messages: MessageBus::new(config.message_capacity),
            entities: EntityManager::new(config),
            systems: SystemManager::new(),
            pending: Vec::new(),
            destroyed: Vec::new(),
        }
    }

    /// Creates a new entity.
    ///
    /// The handle is usable immediately (components can be attached),
    /// but the entity joins system working sets at the next
    /// [`simulate`](World::simulate) - creation attaches components in a
    /// batch, and dispatching once at the commit point avoids routing
    /// half-built entities.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.entities.create_entity();
        self.pending.push(entity);
        entity
    }

    /// Marks an entity for destruction.
    ///
    /// The destruction commits at the next [`simulate`](World::simulate);
    /// until then the handle stays valid. Stale handles and already
    /// marked entities are ignored.
    pub fn destroy_entity(&mut self, entity: Entity) {
        if !self.entities.entity_valid(entity) || self.entities.entity_destroyed(entity) {
            return;
        }
        self.entities.mark_destroyed(entity);
        self.destroyed.push(entity);
    }

    /// Checks whether the handle still refers to a live slot.
    #[inline]
    #[must_use]
    pub fn entity_valid(&self, entity: Entity) -> bool {
        self.entities.entity_valid(entity)
    }

    /// Checks whether the entity is marked for destruction.
    #[inline]
    #[must_use]
    pub fn entity_destroyed(&self, entity: Entity) -> bool {
        self.entities.entity_destroyed(entity)
    }

    /// Reconstructs a handle for a raw index with its current generation.
    ///
    /// # Panics
    ///
    /// Panics if the index was never allocated.
    #[must_use]
    pub fn get_entity(&self, index: u32) -> Entity {
        self.entities.get_entity(index)
    }

    /// Attaches a component to the entity and returns a reference to it.
    ///
    /// Live entities are re-evaluated against every system immediately;
    /// entities still pending their first dispatch are picked up at the
    /// next [`simulate`](World::simulate).
    pub fn add_component<C: Component>(&mut self, entity: Entity, component: C) -> &mut C {
        self.entities.add_component(entity, component);
        if !self.pending.contains(&entity) {
            self.systems.entity_updated(entity, &mut self.entities);
        }
        self.entities.get_component_mut::<C>(entity)
    }

    /// Detaches the component of type `C` from the entity, if present.
    ///
    /// The entity leaves every system whose requirement it no longer
    /// satisfies the moment the bit clears. Idempotent.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) {
        self.entities.remove_component::<C>(entity);
        if !self.pending.contains(&entity) {
            self.systems.entity_updated(entity, &mut self.entities);
        }
    }

    /// Checks whether the entity currently carries a component of type `C`.
    #[inline]
    #[must_use]
    pub fn has_component<C: Component>(&self, entity: Entity) -> bool {
        self.entities.has_component::<C>(entity)
    }

    /// Returns a reference to the entity's component of type `C`.
    ///
    /// # Panics
    ///
    /// Panics if the component is absent - check
    /// [`has_component`](World::has_component) first.
    #[inline]
    #[must_use]
    pub fn get_component<C: Component>(&self, entity: Entity) -> &C {
        self.entities.get_component::<C>(entity)
    }

    /// Returns a mutable reference to the entity's component of type `C`.
    ///
    /// # Panics
    ///
    /// Panics if the component is absent - check
    /// [`has_component`](World::has_component) first.
    #[inline]
    pub fn get_component_mut<C: Component>(&mut self, entity: Entity) -> &mut C {
        self.entities.get_component_mut::<C>(entity)
    }

    /// Returns the component mask of the given entity's slot.
    #[inline]
    #[must_use]
    pub fn component_mask(&self, entity: Entity) -> ComponentMask {
        self.entities.component_mask(entity)
    }

    /// Attaches a debug label to the entity.
    pub fn set_label(&mut self, entity: Entity, label: impl Into<String>) {
        self.entities.set_label(entity, label);
    }

    /// Returns the entity's debug label, empty if none was set.
    #[must_use]
    pub fn label(&self, entity: Entity) -> &str {
        self.entities.label(entity)
    }

    /// Number of currently live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.entity_count()
    }

    /// Adds a system, returning a reference to it.
    ///
    /// Systems should be registered before entities are created;
    /// registration order is processing order.
    pub fn add_system<S: System>(&mut self, system: S) -> &mut S {
        self.systems.add_system(system)
    }

    /// Removes the system of this type, if it exists.
    pub fn remove_system<S: System>(&mut self) {
        self.systems.remove_system::<S>();
    }

    /// Sets a system active or inactive.
    pub fn set_system_active<S: System>(&mut self, active: bool) {
        self.systems.set_system_active::<S>(active);
    }

    /// Checks if a system of this type is registered.
    #[must_use]
    pub fn has_system<S: System>(&self) -> bool {
        self.systems.has_system::<S>()
    }

    /// Returns the system of this type, if registered.
    #[must_use]
    pub fn get_system<S: System>(&self) -> Option<&S> {
        self.systems.get_system::<S>()
    }

    /// Returns the system of this type mutably, if registered.
    pub fn get_system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.systems.get_system_mut::<S>()
    }

    /// Runs one simulation step.
    ///
    /// The commit point of the frame: pending entities are submitted to
    /// their systems, marked destructions commit (every pool reset,
    /// generation bumped, destruction message posted), then each active
    /// system processes in registration order.
    pub fn simulate(&mut self, dt: f32) {
        for entity in std::mem::take(&mut self.pending) {
            self.systems.add_to_systems(entity, &mut self.entities);
        }

        for entity in std::mem::take(&mut self.destroyed) {
            self.systems.remove_from_systems(entity, &mut self.entities);
            self.entities.destroy_entity(entity, &mut self.messages);
        }

        self.systems.process(dt, &mut self.entities, &mut self.messages);
    }

    /// Delivers a polled message to every system.
    ///
    /// The world never polls its own bus - drive it from the outside:
    ///
    /// ```rust,ignore
    /// while let Some(message) = world.message_bus_mut().poll() {
    ///     world.forward_message(&message);
    /// }
    /// ```
    pub fn forward_message(&mut self, message: &Message) {
        self.systems.forward_message(message);
    }

    /// Read access to the message bus.
    #[must_use]
    pub fn message_bus(&self) -> &MessageBus {
        &self.messages
    }

    /// Mutable access to the message bus, for posting and polling.
    pub fn message_bus_mut(&mut self) -> &mut MessageBus {
        &mut self.messages
    }

    /// Read access to the entity manager, e.g. for parallel processing.
    #[must_use]
    pub fn entity_manager(&self) -> &EntityManager {
        &self.entities
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::system::SystemContext;

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Position {
        x: f32,
    }

    impl Component for Position {
        const ID: u8 = 0;
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Velocity {
        x: f32,
    }

    impl Component for Velocity {
        const ID: u8 = 1;
    }

    #[derive(Default)]
    struct MovementSystem;

    impl System for MovementSystem {
        fn required_mask(&self) -> ComponentMask {
            ComponentMask::empty().with::<Position>().with::<Velocity>()
        }

        fn process(&mut self, ctx: SystemContext<'_>, dt: f32) {
            for &entity in ctx.entities {
                let velocity = *ctx.components.get_component::<Velocity>(entity);
                ctx.components.get_component_mut::<Position>(entity).x += velocity.x * dt;
            }
        }
    }

    #[test]
    fn test_pending_entities_join_systems_at_simulate() {
        let mut world = World::new();
        world.add_system(MovementSystem);

        let entity = world.create_entity();
        world.add_component(entity, Position { x: 0.0 });
        world.add_component(entity, Velocity { x: 2.0 });

        world.simulate(1.0);
        assert_eq!(world.get_component::<Position>(entity).x, 2.0);
    }

    #[test]
    fn test_live_entities_redispatch_immediately() {
        let mut world = World::new();
        world.add_system(MovementSystem);

        let entity = world.create_entity();
        world.add_component(entity, Position { x: 0.0 });
        world.simulate(1.0); // flushed with position only: not tracked
        assert_eq!(world.get_component::<Position>(entity).x, 0.0);

        // attaching the missing component routes the entity in at once
        world.add_component(entity, Velocity { x: 1.0 });
        world.simulate(1.0);
        assert_eq!(world.get_component::<Position>(entity).x, 1.0);

        // and clearing a required bit drops it again
        world.remove_component::<Velocity>(entity);
        world.simulate(1.0);
        assert_eq!(world.get_component::<Position>(entity).x, 1.0);
    }

    #[test]
    fn test_destruction_commits_at_simulate() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.simulate(0.0);

        world.destroy_entity(entity);
        assert!(world.entity_destroyed(entity));
        assert!(world.entity_valid(entity)); // not committed yet

        world.simulate(0.0);
        assert!(!world.entity_valid(entity));
        assert_eq!(world.entity_count(), 0);

        // destruction left a message on the bus for the caller to poll
        let message = world.message_bus_mut().poll().expect("destruction message");
        let event: crate::message::SceneEvent = message.data();
        assert_eq!(event.entity_id, entity.index());
    }

    #[test]
    fn test_destroy_twice_marks_once() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.simulate(0.0);

        world.destroy_entity(entity);
        world.destroy_entity(entity);
        world.simulate(0.0);

        assert!(world.message_bus_mut().poll().is_some());
        assert!(world.message_bus_mut().poll().is_none());
    }

    #[test]
    fn test_labels_roundtrip() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.set_label(entity, "camera");
        assert_eq!(world.label(entity), "camera");
    }

    #[test]
    #[should_panic(expected = "wasted memory")]
    fn test_oversized_initial_pool_is_fatal() {
        let config = CoreConfig {
            min_free_ids: 8,
            initial_pool_size: 64,
            ..CoreConfig::default()
        };
        let _ = World::with_config(&config);
    }
}
