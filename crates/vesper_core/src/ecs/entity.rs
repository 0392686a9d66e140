//! # Entity Handles
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into the per-type component pools
//! - A generation counter for safe reuse
//!
//! A handle is only meaningful together with the [`EntityManager`] that
//! issued it: the handle is *valid* while its generation matches the
//! manager's current generation for that index slot.
//!
//! [`EntityManager`]: crate::ecs::EntityManager

/// Number of bits reserved for the index portion of a handle.
pub const INDEX_BITS: u32 = 24;

/// Number of bits reserved for the generation portion of a handle.
pub const GENERATION_BITS: u32 = 8;

/// Maximum number of entity index slots a single scene can address.
///
/// This is an engine-wide budget fixed at compile time; running past it
/// is a configuration error, not a runtime condition.
pub const MAX_ENTITIES: u32 = 1 << INDEX_BITS;

const INDEX_MASK: u32 = MAX_ENTITIES - 1;

/// Handle to a logical entity.
///
/// The handle is packed into a single `u32`:
/// - Lower 24 bits: index into the manager's tables and component pools
/// - Upper 8 bits: generation counter for detecting stale references
///
/// Handles are plain values - copying one never copies an entity, and a
/// copied handle goes stale the moment the slot it points at is
/// destroyed and recycled. Equality compares the whole word, so two
/// handles are equal only when both index *and* generation match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Entity(u32);

impl Entity {
    /// Null/invalid entity handle.
    pub const NULL: Self = Self(u32::MAX);

    /// Packs an index and generation into a handle.
    ///
    /// Only the entity manager mints handles; client code receives them
    /// from [`createEntity`-style calls](crate::ecs::World::create_entity)
    /// or reconstructs them via `get_entity`.
    ///
    /// # Panics
    ///
    /// Panics if `index` exceeds the 24-bit index budget.
    #[inline]
    #[must_use]
    pub(crate) const fn new(index: u32, generation: u8) -> Self {
        assert!(index < MAX_ENTITIES, "entity index exceeds the 24-bit budget");
        Self(((generation as u32) << INDEX_BITS) | index)
    }

    /// Returns the index portion of this handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 & INDEX_MASK
    }

    /// Returns the generation portion of this handle.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u8 {
        (self.0 >> INDEX_BITS) as u8
    }

    /// Checks if this handle is the null sentinel.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}
