//! # VESPER Core Engine
//!
//! The scene core of the VESPER engine: a generational Entity Component
//! System designed for:
//! - Stable, validity-checked entity handles under constant churn
//! - O(1) amortized component attach/detach
//! - Reference-stable pools for move-only resource components
//! - Bitmask-driven system subscription
//!
//! ## Architecture Rules
//!
//! 1. **Handles, not pointers** - entities are (index, generation)
//!    values checked against the manager's side table
//! 2. **Dense component storage** - pools pack live values for
//!    cache-friendly bulk iteration
//! 3. **Capacity overruns are fatal** - entity and pool budgets are
//!    build-time decisions, not runtime conditions to recover from
//! 4. **No global state** - every scene owns its manager, systems and
//!    message bus outright
//!
//! ## Example
//!
//! ```rust,ignore
//! use vesper_core::{ComponentMask, World};
//!
//! let mut world = World::new();
//! let player = world.create_entity();
//! world.add_component(player, Transform::default());
//! world.simulate(dt);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod message;

pub use config::{ConfigError, CoreConfig};
pub use ecs::{
    process_parallel, Component, ComponentMask, ComponentPool, Entity, EntityManager, Pool,
    System, SystemContext, SystemManager, World, GENERATION_BITS, INDEX_BITS, MAX_COMPONENTS,
    MAX_ENTITIES,
};
pub use message::{Message, MessageBus, MessageId, SceneEvent, MAX_MESSAGE_SIZE};
