//! `storebase-gateway`: the remote procedure boundary.
//!
//! Everything the shipment workflow knows about the backend goes through
//! [`RemoteProcedureGateway`]: named stored procedures with typed arguments and
//! typed results. Two implementations live here:
//!
//! - [`HttpGateway`]: PostgREST-style `POST /rest/v1/rpc/{procedure}` over `reqwest`
//! - [`InMemoryGateway`]: deterministic fake for tests and local demos

pub mod config;
pub mod error;
pub mod http;
pub mod in_memory;
pub mod model;
pub mod procedure;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use http::HttpGateway;
pub use in_memory::InMemoryGateway;
pub use model::{
    Counterparty, CreateShipmentRequest, Currency, OneTimeSupplierPayload, OrderLineItem,
    OrderRef, OrderStatus, ProductPrice, ProductSearchPage, ProductSearchResult, ProductStock,
    ShipmentCreated, ShipmentItemPayload,
};
pub use procedure::{RemoteProcedureGateway, procedures};
