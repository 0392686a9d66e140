//! # Component Model
//!
//! Components are per-entity data slots stored in densely packed pools.
//! Each registered component type claims one bit of a fixed-width
//! [`ComponentMask`]; the mask on an entity slot records exactly which
//! pools currently hold live data for that slot, and systems match
//! entities by comparing masks instead of querying types dynamically.

/// Maximum number of component types a single scene can register.
///
/// One bit per type in the [`ComponentMask`].
pub const MAX_COMPONENTS: usize = 64;

/// Trait for ECS components.
///
/// Components must be:
/// - `Default`: pools reset slots by overwriting them with a
///   default-constructed value, which also drops whatever the slot held
/// - `Send + Sync`: pools are iterated from the read-only parallel path
///
/// `Copy` is deliberately *not* required - move-only resource handles
/// (GPU buffers, audio voices) are first-class components. Such types
/// should set [`NON_RESIZABLE`](Component::NON_RESIZABLE) so their pool
/// never relocates live values.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Default)]
/// struct Position {
///     x: f32,
///     y: f32,
///     z: f32,
/// }
///
/// impl Component for Position {
///     const ID: u8 = 0;
/// }
/// ```
pub trait Component: Default + Send + Sync + 'static {
    /// Unique identifier for this component type (0-63).
    ///
    /// This ID is both the component's bit in the entity mask and the
    /// slot of its pool in the entity manager's registry. Two component
    /// types sharing an ID is a configuration error caught at first use.
    const ID: u8;

    /// Whether this type's pool is forbidden from relocating.
    ///
    /// Non-resizable pools pre-reserve [`MAX_POOL_SIZE`] slots up front,
    /// trading memory for the guarantee that a reference handed out by
    /// the pool stays at a stable address across later inserts and
    /// removals. Required for move-only types whose identity must
    /// survive a frame without re-fetching.
    ///
    /// [`MAX_POOL_SIZE`]: Component::MAX_POOL_SIZE
    const NON_RESIZABLE: bool = false;

    /// Hard ceiling on the number of live components of this type.
    ///
    /// Growing a pool past this is a fatal assertion - the budget is a
    /// build-time decision, not a runtime condition to recover from.
    const MAX_POOL_SIZE: usize = 1024;
}

/// Bitmask of attached component types, one bit per registered type.
///
/// Invariant: bit `k` is set iff the pool for component ID `k` currently
/// holds live data for the entity index. The entity manager keeps the
/// mask in lockstep with pool mutation - set immediately after a
/// successful insert, cleared immediately before a reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ComponentMask(u64);

impl ComponentMask {
    /// Mask with no bits set.
    pub const EMPTY: Self = Self(0);

    /// Returns an empty mask.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    /// Returns this mask with component `C`'s bit set.
    ///
    /// Builder-style declaration used by systems to state their
    /// requirements:
    ///
    /// ```rust,ignore
    /// ComponentMask::empty().with::<Position>().with::<Velocity>()
    /// ```
    #[inline]
    #[must_use]
    pub const fn with<C: Component>(self) -> Self {
        assert!((C::ID as usize) < MAX_COMPONENTS, "component ID out of range");
        Self(self.0 | (1 << C::ID))
    }

    /// Sets the bit for the given component ID.
    #[inline]
    pub fn set(&mut self, id: u8) {
        debug_assert!((id as usize) < MAX_COMPONENTS, "component ID out of range");
        self.0 |= 1 << id;
    }

    /// Clears the bit for the given component ID.
    #[inline]
    pub fn clear(&mut self, id: u8) {
        debug_assert!((id as usize) < MAX_COMPONENTS, "component ID out of range");
        self.0 &= !(1 << id);
    }

    /// Checks the bit for the given component ID.
    #[inline]
    #[must_use]
    pub const fn test(self, id: u8) -> bool {
        (self.0 & (1 << id)) != 0
    }

    /// Checks whether every bit of `required` is set in `self`.
    ///
    /// This is the system-dispatch predicate:
    /// `(entity_mask & system_mask) == system_mask`.
    #[inline]
    #[must_use]
    pub const fn contains(self, required: Self) -> bool {
        (self.0 & required.0) == required.0
    }

    /// Checks if no bits are set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Clears every bit.
    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Returns the raw bit pattern.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Flag;

    impl Component for Flag {
        const ID: u8 = 5;
    }

    #[test]
    fn test_set_clear_test() {
        let mut mask = ComponentMask::empty();
        assert!(!mask.test(5));

        mask.set(5);
        assert!(mask.test(5));

        mask.clear(5);
        assert!(!mask.test(5));
    }

    #[test]
    fn test_with_builder() {
        let mask = ComponentMask::empty().with::<Flag>();
        assert!(mask.test(Flag::ID));
        assert_eq!(mask.bits(), 1 << 5);
    }

    #[test]
    fn test_contains() {
        let required = ComponentMask::empty().with::<Flag>();
        let mut entity_mask = ComponentMask::empty();
        assert!(!entity_mask.contains(required));

        entity_mask.set(5);
        entity_mask.set(9);
        assert!(entity_mask.contains(required));

        // an empty requirement is satisfied by anything
        assert!(entity_mask.contains(ComponentMask::EMPTY));
    }

    #[test]
    fn test_reset() {
        let mut mask = ComponentMask::empty();
        mask.set(0);
        mask.set(63);
        assert!(!mask.is_empty());

        mask.reset();
        assert!(mask.is_empty());
    }
}
