//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Two entities with the same id are the same entity, even when their other
/// attributes (quantity, cost, ...) differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
