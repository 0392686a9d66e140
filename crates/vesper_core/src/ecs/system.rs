//! # Systems & Dispatch
//!
//! A system is a unit of per-frame logic operating on the subset of
//! entities whose component mask satisfies the system's declared
//! requirement. The [`SystemManager`] owns each system's entity working
//! set and keeps it current as entity composition changes, upholding the
//! core dispatch invariant:
//!
//! ```text
//! entity ∈ system.entities  ⟺  (entity_mask & required_mask) == required_mask
//! ```
//!
//! Membership transitions fire incrementally on every component
//! attach/detach - never by re-scanning the world - and systems are
//! processed in registration order, which is the ordering contract
//! callers may rely on (a transform-propagation system registered before
//! a render system runs before it).

use std::any::{Any, TypeId};

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::ecs::component::ComponentMask;
use crate::ecs::entity::Entity;
use crate::ecs::manager::EntityManager;
use crate::message::{Message, MessageBus};

/// Per-frame view handed to [`System::process`].
///
/// Bundles the system's current working set with mutable access to the
/// component store and the message bus - the system owns no entities and
/// no components, only handles into the shared manager.
pub struct SystemContext<'a> {
    /// Entities currently satisfying the system's mask, insertion-ordered.
    pub entities: &'a [Entity],
    /// The scene's component store.
    pub components: &'a mut EntityManager,
    /// The scene's message bus, for posting.
    pub messages: &'a mut MessageBus,
}

/// Trait for per-frame logic units.
///
/// Implementations declare the component types they need via
/// [`required_mask`](System::required_mask); the manager evaluates the
/// mask once at registration and routes matching entities into the
/// system's working set from then on.
pub trait System: Any + Send + Sync {
    /// The component mask an entity must fully satisfy to be routed to
    /// this system.
    ///
    /// Declared once - the manager caches the returned mask at
    /// registration, so it must not change over the system's lifetime.
    fn required_mask(&self) -> ComponentMask;

    /// Per-frame processing over the system's working set.
    fn process(&mut self, ctx: SystemContext<'_>, dt: f32);

    /// Optional callback performed when an entity enters the working set.
    fn on_entity_added(&mut self, _entity: Entity, _components: &mut EntityManager) {}

    /// Optional callback performed when an entity leaves the working set.
    fn on_entity_removed(&mut self, _entity: Entity, _components: &mut EntityManager) {}

    /// Processes an incoming bus message.
    ///
    /// Messages are forwarded to every system unconditionally,
    /// independent of mask membership - systems may care about events
    /// for entities they do not track.
    fn handle_message(&mut self, _message: &Message) {}
}

/// One registered system plus the bookkeeping the manager keeps for it.
struct SystemEntry {
    type_id: TypeId,
    mask: ComponentMask,
    entities: Vec<Entity>,
    active: bool,
    system: Box<dyn System>,
}

/// Maintains the list of systems and their entity working sets.
#[derive(Default)]
pub struct SystemManager {
    systems: Vec<SystemEntry>,
}

impl SystemManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a system, returning a reference to it.
    ///
    /// If a system of this type already exists nothing is changed and
    /// the existing instance is returned (`system` is dropped). New
    /// systems are active and process in the order they were added.
    pub fn add_system<S: System>(&mut self, system: S) -> &mut S {
        let type_id = TypeId::of::<S>();
        let index = match self.systems.iter().position(|e| e.type_id == type_id) {
            Some(existing) => existing,
            None => {
                let mask = system.required_mask();
                self.systems.push(SystemEntry {
                    type_id,
                    mask,
                    entities: Vec::new(),
                    active: true,
                    system: Box::new(system),
                });
                self.systems.len() - 1
            }
        };

        let system: &mut dyn Any = &mut *self.systems[index].system;
        system
            .downcast_mut::<S>()
            .expect("system entry holds the registered type")
    }

    /// Removes the system of this type, if it exists.
    pub fn remove_system<S: System>(&mut self) {
        self.systems.retain(|e| e.type_id != TypeId::of::<S>());
    }

    /// Sets a system active or inactive.
    ///
    /// Inactive systems keep their working set current and still receive
    /// forwarded messages, but are skipped by [`process`]. No effect if
    /// the system does not exist.
    ///
    /// [`process`]: SystemManager::process
    pub fn set_system_active<S: System>(&mut self, active: bool) {
        let type_id = TypeId::of::<S>();
        if let Some(entry) = self.systems.iter_mut().find(|e| e.type_id == type_id) {
            entry.active = active;
        }
    }

    /// Checks if a system of this type is registered.
    #[must_use]
    pub fn has_system<S: System>(&self) -> bool {
        let type_id = TypeId::of::<S>();
        self.systems.iter().any(|e| e.type_id == type_id)
    }

    /// Returns the system of this type, if registered.
    #[must_use]
    pub fn get_system<S: System>(&self) -> Option<&S> {
        let type_id = TypeId::of::<S>();
        self.systems
            .iter()
            .find(|e| e.type_id == type_id)
            .and_then(|e| {
                let system: &dyn Any = &*e.system;
                system.downcast_ref::<S>()
            })
    }

    /// Returns the system of this type mutably, if registered.
    pub fn get_system_mut<S: System>(&mut self) -> Option<&mut S> {
        let type_id = TypeId::of::<S>();
        self.systems
            .iter_mut()
            .find(|e| e.type_id == type_id)
            .and_then(|e| {
                let system: &mut dyn Any = &mut *e.system;
                system.downcast_mut::<S>()
            })
    }

    /// Re-evaluates the entity against every system after a composition
    /// change.
    ///
    /// The entity joins each working set whose requirement its mask now
    /// fully satisfies and leaves each one it no longer satisfies; the
    /// `on_entity_added`/`on_entity_removed` hooks fire on the
    /// transitions. Working-set order is insertion order and removal
    /// preserves it.
    pub fn entity_updated(&mut self, entity: Entity, components: &mut EntityManager) {
        let mask = components.component_mask(entity);
        for entry in &mut self.systems {
            let satisfied = mask.contains(entry.mask);
            let position = entry.entities.iter().position(|e| *e == entity);
            match (satisfied, position) {
                (true, None) => {
                    entry.entities.push(entity);
                    entry.system.on_entity_added(entity, components);
                }
                (false, Some(index)) => {
                    entry.entities.remove(index);
                    entry.system.on_entity_removed(entity, components);
                }
                _ => {}
            }
        }
    }

    /// Submits an entity to all systems whose requirement it satisfies.
    ///
    /// Used once per entity, after its initial component batch has been
    /// attached; afterwards [`entity_updated`] keeps membership current
    /// incrementally.
    ///
    /// [`entity_updated`]: SystemManager::entity_updated
    pub fn add_to_systems(&mut self, entity: Entity, components: &mut EntityManager) {
        self.entity_updated(entity, components);
    }

    /// Removes the entity from every system it belongs to.
    ///
    /// Used on destruction, unconditionally.
    pub fn remove_from_systems(&mut self, entity: Entity, components: &mut EntityManager) {
        for entry in &mut self.systems {
            if let Some(index) = entry.entities.iter().position(|e| *e == entity) {
                entry.entities.remove(index);
                entry.system.on_entity_removed(entity, components);
            }
        }
    }

    /// Forwards a message to every system, active or not.
    pub fn forward_message(&mut self, message: &Message) {
        for entry in &mut self.systems {
            entry.system.handle_message(message);
        }
    }

    /// Runs a simulation step by calling `process` on each active
    /// system, in registration order.
    pub fn process(&mut self, dt: f32, components: &mut EntityManager, messages: &mut MessageBus) {
        for entry in &mut self.systems {
            if !entry.active {
                continue;
            }
            entry.system.process(
                SystemContext {
                    entities: &entry.entities,
                    components: &mut *components,
                    messages: &mut *messages,
                },
                dt,
            );
        }
    }
}

/// Read-mostly parallel processing over a system's working set.
///
/// Runs `func` for every entity on the rayon thread pool with shared
/// (read-only) access to the component store; the rare cross-entity side
/// channel - aggregating animation events, say - goes through the
/// mutex-guarded output buffer.
///
/// The shared borrow of the [`EntityManager`] makes the one hard rule
/// structural: this can never run concurrently with entity
/// creation/destruction or a component pool resize, because those need
/// the store mutably.
pub fn process_parallel<T, F>(
    entities: &[Entity],
    components: &EntityManager,
    output: &Mutex<Vec<T>>,
    func: F,
) where
    T: Send,
    F: Fn(Entity, &EntityManager, &Mutex<Vec<T>>) + Send + Sync,
{
    entities
        .par_iter()
        .for_each(|&entity| func(entity, components, output));
}
