//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**; they are defined entirely by their
/// attribute values. A currency (`KRW`, `₩`) or a one-time supplier's contact
/// card are value objects, while a shipment line item (keyed by product and
/// variant) is an [`Entity`](crate::Entity).
///
/// To "modify" a value object, build a new one. The trait only requires what
/// value semantics need: cloning, comparison by value, and `Debug` output for
/// logs and tests.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
