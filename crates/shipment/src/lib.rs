//! Shipment-creation workflow.
//!
//! A shipment comes either from an existing purchase order or directly from a
//! supplier (registered or one-time). This crate holds the client-side rules:
//! selection-mode exclusivity, line-item merging, spreadsheet import
//! reconciliation, debounced product search, and save validation. All backend
//! access goes through [`storebase_gateway::RemoteProcedureGateway`].

pub mod draft;
pub mod import;
pub mod items;
pub mod order;
pub mod save;
pub mod search;
pub mod selection;
pub mod sheet;
pub mod supplier;
pub mod workflow;

pub use draft::ShipmentDraft;
pub use import::{ImportError, ImportMiss, ImportReconciler, ImportReport, ImportRow, MissReason};
pub use items::{ItemAggregator, ItemKey, LineItem, LineSource, Merge};
pub use order::{OrderBook, OrderSelection};
pub use save::{SaveError, SaveOrchestrator, SaveRejection};
pub use search::{ProductSearch, SEARCH_DEBOUNCE, SearchOutcome};
pub use selection::{Selection, SelectionMode};
pub use sheet::{SHEET_HEADERS, SheetError};
pub use supplier::{
    OneTimeField, OneTimeSupplier, SupplierDirectory, SupplierKind, SupplierOption,
    SupplierSelection,
};
pub use workflow::{ShipmentWorkflow, WorkflowError, WorkflowSeed};
