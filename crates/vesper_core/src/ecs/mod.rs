//! # Entity Component System
//!
//! The scene core: generational entity handles, densely packed
//! per-type component pools and mask-driven system dispatch.
//!
//! ## Design Philosophy
//!
//! - Entities are arena-index handles (index + generation), never
//!   owning pointers - a stale handle reads as invalid, it cannot dangle
//! - Components live in sparse/dense slot-map pools for cache-friendly
//!   bulk iteration with O(1) removal
//! - Systems match entities by comparing bitmasks, not by dynamic type
//!   queries
//! - Everything is owned per world instance - no global registries

mod component;
mod entity;
mod manager;
mod pool;
mod system;
mod world;

pub use component::{Component, ComponentMask, MAX_COMPONENTS};
pub use entity::{Entity, GENERATION_BITS, INDEX_BITS, MAX_ENTITIES};
pub use manager::EntityManager;
pub use pool::{ComponentPool, Pool};
pub use system::{process_parallel, System, SystemContext, SystemManager};
pub use world::World;
