//! `storebase-core`: shared building blocks for the Store Base client crates.
//!
//! This crate contains **pure** primitives (no IO, no gateway access): strongly
//! typed identifiers, the domain error model, and the company context that is
//! threaded explicitly through every workflow.

pub mod context;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use context::CompanyContext;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    CompanyId, CounterpartyId, OrderId, OrderItemId, ProductId, StoreId, UserId, VariantId,
};
pub use value_object::ValueObject;
