//! The shipment-creation screen as one object.
//!
//! [`ShipmentWorkflow`] owns the draft, the per-workflow caches (suppliers,
//! orders, currency), the search box, and the save orchestrator. Company
//! context and the gateway are handed in at construction.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use storebase_core::{CompanyContext, CounterpartyId, DomainError, OrderId, OrderItemId};
use storebase_gateway::{
    Counterparty, Currency, GatewayError, OrderLineItem, OrderRef, ProductSearchResult,
    RemoteProcedureGateway,
};

use crate::draft::ShipmentDraft;
use crate::import::{ImportError, ImportReconciler, ImportReport, ImportRow};
use crate::items::{ItemKey, LineItem};
use crate::order::OrderBook;
use crate::save::{SaveError, SaveOrchestrator, SaveRejection, build_request};
use crate::search::{ProductSearch, SearchOutcome};
use crate::selection::SelectionMode;
use crate::supplier::{OneTimeField, SupplierDirectory, SupplierKind, SupplierOption};

/// State already known when the screen opens; skips the matching fetches.
#[derive(Debug, Clone, Default)]
pub struct WorkflowSeed {
    pub suppliers: Option<Vec<Counterparty>>,
    pub orders: Option<Vec<OrderRef>>,
    pub currency: Option<Currency>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    MissingContext(#[from] DomainError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("order {0} is not available for shipment")]
    UnknownOrder(OrderId),

    #[error("the shipment workflow has been closed")]
    TornDown,
}

pub struct ShipmentWorkflow<G: ?Sized> {
    gateway: Arc<G>,
    context: CompanyContext,
    draft: ShipmentDraft,
    suppliers: SupplierDirectory,
    orders: OrderBook,
    base_currency: Option<Currency>,
    search: ProductSearch,
    saver: SaveOrchestrator<G>,
    teardown: CancellationToken,
}

impl<G> ShipmentWorkflow<G>
where
    G: RemoteProcedureGateway + ?Sized,
{
    pub fn new(gateway: Arc<G>, context: CompanyContext) -> Self {
        Self::with_seed(gateway, context, WorkflowSeed::default())
    }

    pub fn with_seed(gateway: Arc<G>, context: CompanyContext, seed: WorkflowSeed) -> Self {
        Self {
            saver: SaveOrchestrator::new(gateway.clone()),
            gateway,
            context,
            draft: ShipmentDraft::new(),
            suppliers: seed.suppliers.map(SupplierDirectory::seeded).unwrap_or_default(),
            orders: seed.orders.map(OrderBook::seeded).unwrap_or_default(),
            base_currency: seed.currency,
            search: ProductSearch::new(),
            teardown: CancellationToken::new(),
        }
    }

    /// Swap the search box (e.g. for a different debounce window).
    pub fn with_search(mut self, search: ProductSearch) -> Self {
        self.search = search;
        self
    }

    pub fn context(&self) -> &CompanyContext {
        &self.context
    }

    pub fn draft(&self) -> &ShipmentDraft {
        &self.draft
    }

    fn ensure_open(&self) -> Result<(), WorkflowError> {
        if self.teardown.is_cancelled() {
            Err(WorkflowError::TornDown)
        } else {
            Ok(())
        }
    }

    // -- currency ----------------------------------------------------------

    /// Fetch the company's base currency. On failure the current currency is
    /// kept.
    pub async fn load_base_currency(&mut self) -> Result<Currency, WorkflowError> {
        self.ensure_open()?;
        let company_id = self.context.require_company()?;
        let result = self.gateway.get_base_currency(company_id).await;
        self.ensure_open()?;

        match result {
            Ok(Some(currency)) => {
                self.base_currency = Some(currency.clone());
                Ok(currency)
            }
            Ok(None) => Ok(self.currency()),
            Err(err) => {
                warn!("Loading base currency failed: {}", err);
                Err(err.into())
            }
        }
    }

    /// Display currency: last search response, then the company base
    /// currency, then KRW.
    pub fn currency(&self) -> Currency {
        self.search
            .currency()
            .or_else(|| self.base_currency.clone())
            .unwrap_or_default()
    }

    pub fn format_price(&self, amount: f64) -> String {
        self.currency().format_amount(amount)
    }

    // -- suppliers ---------------------------------------------------------

    /// Registered counterparties, fetched on first use.
    pub async fn list_registered_suppliers(&mut self) -> Result<&[Counterparty], WorkflowError> {
        if !self.suppliers.is_loaded() {
            self.ensure_open()?;
            let company_id = self.context.require_company()?;
            let counterparties = self.gateway.list_counterparties(company_id).await?;
            self.ensure_open()?;
            debug!("Loaded {} counterparties", counterparties.len());
            self.suppliers.store(counterparties);
        }
        Ok(self.suppliers.counterparties())
    }

    pub fn supplier_options(&self) -> Vec<SupplierOption> {
        self.suppliers.options()
    }

    pub fn select_registered_supplier(&mut self, id: Option<CounterpartyId>) {
        self.draft.select_registered(id);
    }

    pub fn set_one_time_field(&mut self, field: OneTimeField, value: impl Into<String>) {
        self.draft.set_one_time_field(field, value);
    }

    pub fn toggle_supplier_kind(&mut self, kind: SupplierKind) {
        self.draft.toggle_supplier_kind(kind);
    }

    pub fn clear_supplier_selection(&mut self) {
        self.draft.clear_supplier_selection();
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.draft.set_mode(mode);
    }

    pub fn clear_selection(&mut self) {
        self.draft.clear_selection();
    }

    // -- orders ------------------------------------------------------------

    /// Open orders, fetched on first use.
    pub async fn list_orders(&mut self) -> Result<&[OrderRef], WorkflowError> {
        if !self.orders.is_loaded() {
            self.ensure_open()?;
            let company_id = self.context.require_company()?;
            let orders = self.gateway.list_orders(company_id, self.context.timezone()).await?;
            self.ensure_open()?;
            self.orders.store(orders);
            debug!("Loaded {} open orders", self.orders.orders().len());
        }
        Ok(self.orders.orders())
    }

    /// Orders placed with `supplier` (all orders for `None`). No gateway call.
    pub fn orders_for_supplier(&self, supplier: Option<CounterpartyId>) -> Vec<&OrderRef> {
        self.orders.filter_by_supplier(supplier)
    }

    /// Select an order and load its lines.
    ///
    /// A failed line load is returned as an error but the order stays
    /// selected with no lines; it is not retried.
    pub async fn select_order(&mut self, order_id: OrderId) -> Result<&[OrderLineItem], WorkflowError> {
        self.ensure_open()?;
        let order = self
            .orders
            .find(order_id)
            .cloned()
            .ok_or(WorkflowError::UnknownOrder(order_id))?;

        if self.draft.select_order(&order) {
            info!("Selected order {}", order.order_number);
            let result = self.gateway.get_order_items(order_id, self.context.timezone()).await;
            self.ensure_open()?;

            let failure = result.as_ref().err().cloned();
            self.draft.set_order_lines(order_id, result);
            if let Some(err) = failure {
                warn!("Loading lines of order {} failed: {}", order.order_number, err);
                return Err(err.into());
            }
        }

        Ok(self
            .draft
            .order_selection()
            .map(|s| s.lines())
            .unwrap_or_default())
    }

    pub fn clear_order(&mut self) {
        self.draft.clear_order();
    }

    /// Add one line of the selected order. Returns `false` if the line is
    /// unknown or its product is already in the shipment.
    pub fn add_order_line(&mut self, order_item_id: OrderItemId) -> bool {
        let Some(selection) = self.draft.order_selection() else {
            return false;
        };
        let (Some(order_id), Some(line)) = (
            selection.order_id(),
            selection
                .lines()
                .iter()
                .find(|l| l.order_item_id == order_item_id)
                .cloned(),
        ) else {
            return false;
        };
        let order_number = selection.order_number().to_string();
        self.draft
            .items_mut()
            .add_from_order_line(&line, order_id, &order_number)
    }

    /// Add every remaining line of the selected order.
    pub fn add_all_from_order(&mut self) -> usize {
        let Some(selection) = self.draft.order_selection() else {
            return 0;
        };
        let Some(order_id) = selection.order_id() else {
            return 0;
        };
        let lines = selection.lines().to_vec();
        let order_number = selection.order_number().to_string();
        self.draft
            .items_mut()
            .add_all_from_order(&lines, order_id, &order_number)
    }

    // -- items -------------------------------------------------------------

    pub fn add_from_search(&mut self, product: &ProductSearchResult) {
        self.draft.items_mut().add_from_search(product);
    }

    pub fn remove_item(&mut self, key: &ItemKey) {
        self.draft.items_mut().remove_item(key);
    }

    pub fn set_quantity(&mut self, key: &ItemKey, quantity: i64) -> bool {
        self.draft.items_mut().set_quantity(key, quantity)
    }

    pub fn set_unit_cost(&mut self, key: &ItemKey, cost: f64) -> bool {
        self.draft.items_mut().set_unit_cost(key, cost)
    }

    pub fn total_amount(&self) -> f64 {
        self.draft.items().total_amount()
    }

    pub fn filtered_items(&self, query: &str) -> Vec<&LineItem> {
        self.draft.items().filter(query)
    }

    // -- search ------------------------------------------------------------

    pub async fn search_products(&self, query: &str) -> SearchOutcome {
        self.search
            .search(self.gateway.as_ref(), &self.context, query, &self.teardown)
            .await
    }

    pub fn search_results(&self) -> Vec<ProductSearchResult> {
        self.search.results()
    }

    pub fn clear_search(&self) {
        self.search.clear();
    }

    // -- import ------------------------------------------------------------

    pub async fn import_rows(&mut self, rows: &[ImportRow]) -> Result<ImportReport, ImportError> {
        if self.teardown.is_cancelled() {
            return Err(ImportError::TornDown);
        }
        ImportReconciler::new(self.gateway.as_ref(), &self.context, &self.teardown)
            .reconcile(rows, &mut self.draft.items)
            .await
    }

    // -- free text ---------------------------------------------------------

    pub fn set_tracking_number(&mut self, value: impl Into<String>) {
        self.draft.set_tracking_number(value);
    }

    pub fn set_notes(&mut self, value: impl Into<String>) {
        self.draft.set_notes(value);
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.draft.set_title(value);
    }

    // -- save --------------------------------------------------------------

    /// First failing save precondition, if any.
    pub fn can_save(&self) -> Result<(), SaveRejection> {
        build_request(&self.draft, &self.context, chrono::Utc::now()).map(|_| ())
    }

    pub fn is_saving(&self) -> bool {
        self.saver.is_busy()
    }

    /// Submit the draft. On success the draft starts over empty.
    pub async fn save(&mut self) -> Result<String, SaveError> {
        let shipment_number = self.saver.save(&self.draft, &self.context).await?;
        self.draft = ShipmentDraft::new();
        self.search.clear();
        Ok(shipment_number)
    }

    // -- lifecycle ---------------------------------------------------------

    /// Close the workflow: stop imports and searches, drop late responses.
    pub fn teardown(&self) {
        self.teardown.cancel();
        self.search.clear();
    }

    pub fn is_torn_down(&self) -> bool {
        self.teardown.is_cancelled()
    }
}
