//! In-memory gateway.
//!
//! Intended for tests/dev. Serves canned data, records every call, and can be
//! told to fail or stall specific procedures.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use storebase_core::{CompanyId, OrderId, StoreId};

use crate::error::{GatewayError, GatewayResult};
use crate::model::{
    Counterparty, CreateShipmentRequest, Currency, OrderLineItem, OrderRef, ProductSearchPage,
    ProductSearchResult, ShipmentCreated,
};
use crate::procedure::{RemoteProcedureGateway, procedures};

#[derive(Debug, Default)]
struct State {
    counterparties: Vec<Counterparty>,
    orders: Vec<OrderRef>,
    order_items: HashMap<OrderId, Vec<OrderLineItem>>,
    products: Vec<ProductSearchResult>,
    currency: Option<Currency>,
    failures: HashMap<&'static str, GatewayError>,
    latency: HashMap<&'static str, Duration>,
    search_latency: HashMap<String, Duration>,
    calls: Vec<&'static str>,
    search_queries: Vec<String>,
    created: Vec<CreateShipmentRequest>,
}

/// Deterministic [`RemoteProcedureGateway`] backed by plain collections.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: RwLock<State>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counterparty(self, counterparty: Counterparty) -> Self {
        self.state.write().unwrap().counterparties.push(counterparty);
        self
    }

    pub fn with_order(self, order: OrderRef, lines: Vec<OrderLineItem>) -> Self {
        {
            let mut state = self.state.write().unwrap();
            state.order_items.insert(order.order_id, lines);
            state.orders.push(order);
        }
        self
    }

    pub fn with_product(self, product: ProductSearchResult) -> Self {
        self.state.write().unwrap().products.push(product);
        self
    }

    pub fn with_currency(self, currency: Currency) -> Self {
        self.state.write().unwrap().currency = Some(currency);
        self
    }

    /// Make every call to `procedure` fail with `error` until [`Self::heal`].
    pub fn fail(&self, procedure: &'static str, error: GatewayError) {
        self.state.write().unwrap().failures.insert(procedure, error);
    }

    pub fn heal(&self, procedure: &'static str) {
        self.state.write().unwrap().failures.remove(procedure);
    }

    /// Delay every call to `procedure`.
    pub fn set_latency(&self, procedure: &'static str, latency: Duration) {
        self.state.write().unwrap().latency.insert(procedure, latency);
    }

    /// Delay product searches for one specific query (trimmed, case-insensitive).
    pub fn set_search_latency(&self, query: &str, latency: Duration) {
        self.state
            .write()
            .unwrap()
            .search_latency
            .insert(query.trim().to_lowercase(), latency);
    }

    /// Procedure names in call order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.read().unwrap().calls.clone()
    }

    pub fn call_count(&self, procedure: &str) -> usize {
        self.state
            .read()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == procedure)
            .count()
    }

    /// Queries that actually reached the search procedure.
    pub fn search_queries(&self) -> Vec<String> {
        self.state.read().unwrap().search_queries.clone()
    }

    /// Every accepted create-shipment request.
    pub fn created_shipments(&self) -> Vec<CreateShipmentRequest> {
        self.state.read().unwrap().created.clone()
    }

    /// Record the call, then apply configured latency and failure.
    async fn enter(&self, procedure: &'static str, extra_delay: Option<Duration>) -> GatewayResult<()> {
        let (delay, failure) = {
            let mut state = self.state.write().unwrap();
            state.calls.push(procedure);
            (
                state.latency.get(procedure).copied(),
                state.failures.get(procedure).cloned(),
            )
        };

        if let Some(d) = delay.into_iter().chain(extra_delay).max() {
            tokio::time::sleep(d).await;
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteProcedureGateway for InMemoryGateway {
    async fn list_counterparties(&self, _company_id: CompanyId) -> GatewayResult<Vec<Counterparty>> {
        self.enter(procedures::LIST_COUNTERPARTIES, None).await?;
        Ok(self.state.read().unwrap().counterparties.clone())
    }

    async fn list_orders(&self, _company_id: CompanyId, _timezone: &str) -> GatewayResult<Vec<OrderRef>> {
        self.enter(procedures::LIST_ORDERS, None).await?;
        Ok(self.state.read().unwrap().orders.clone())
    }

    async fn get_order_items(&self, order_id: OrderId, _timezone: &str) -> GatewayResult<Vec<OrderLineItem>> {
        self.enter(procedures::GET_ORDER_ITEMS, None).await?;
        self.state
            .read()
            .unwrap()
            .order_items
            .get(&order_id)
            .cloned()
            .ok_or_else(|| GatewayError::business(format!("order {order_id} not found")))
    }

    async fn search_products(
        &self,
        _company_id: CompanyId,
        _store_id: StoreId,
        query: &str,
        _timezone: &str,
    ) -> GatewayResult<ProductSearchPage> {
        let needle = query.trim().to_lowercase();
        let extra = {
            let mut state = self.state.write().unwrap();
            state.search_queries.push(query.trim().to_string());
            state.search_latency.get(&needle).copied()
        };
        self.enter(procedures::SEARCH_PRODUCTS, extra).await?;

        let state = self.state.read().unwrap();
        let products = state
            .products
            .iter()
            .filter(|p| {
                [
                    p.name(),
                    p.product_name.as_str(),
                    p.sku(),
                    p.product_sku.as_str(),
                    p.variant_sku.as_deref().unwrap_or_default(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();

        Ok(ProductSearchPage {
            products,
            currency: state.currency.clone(),
        })
    }

    async fn get_base_currency(&self, _company_id: CompanyId) -> GatewayResult<Option<Currency>> {
        self.enter(procedures::GET_BASE_CURRENCY, None).await?;
        Ok(self.state.read().unwrap().currency.clone())
    }

    async fn create_shipment(&self, request: &CreateShipmentRequest) -> GatewayResult<ShipmentCreated> {
        self.enter(procedures::CREATE_SHIPMENT, None).await?;
        let mut state = self.state.write().unwrap();
        state.created.push(request.clone());
        Ok(ShipmentCreated {
            shipment_number: format!("SH-{:05}", state.created.len()),
        })
    }
}
