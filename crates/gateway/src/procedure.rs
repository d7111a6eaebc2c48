//! The gateway trait.

use async_trait::async_trait;

use storebase_core::{CompanyId, OrderId, StoreId};

use crate::error::GatewayResult;
use crate::model::{
    Counterparty, CreateShipmentRequest, Currency, OrderLineItem, OrderRef, ProductSearchPage,
    ProductSearchResult, ShipmentCreated,
};

/// Names of the stored procedures behind each gateway operation.
pub mod procedures {
    pub const LIST_COUNTERPARTIES: &str = "get_counterparty_info";
    pub const LIST_ORDERS: &str = "inventory_get_order_info";
    pub const GET_ORDER_ITEMS: &str = "inventory_get_order_items";
    pub const SEARCH_PRODUCTS: &str = "get_inventory_page_v6";
    pub const GET_BASE_CURRENCY: &str = "get_base_currency";
    pub const CREATE_SHIPMENT: &str = "inventory_create_shipment_v3";
}

/// Request/response boundary to the remote stored procedures.
///
/// Implementations must not retry on their own; the workflow decides what to
/// surface and nothing is retried automatically.
#[async_trait]
pub trait RemoteProcedureGateway: Send + Sync {
    /// Registered counterparties of a company.
    async fn list_counterparties(&self, company_id: CompanyId) -> GatewayResult<Vec<Counterparty>>;

    /// Orders that can be shipped against.
    async fn list_orders(&self, company_id: CompanyId, timezone: &str) -> GatewayResult<Vec<OrderRef>>;

    /// Lines of one order.
    async fn get_order_items(&self, order_id: OrderId, timezone: &str) -> GatewayResult<Vec<OrderLineItem>>;

    /// Free-text inventory search.
    async fn search_products(
        &self,
        company_id: CompanyId,
        store_id: StoreId,
        query: &str,
        timezone: &str,
    ) -> GatewayResult<ProductSearchPage>;

    /// Exact SKU lookup. `Ok(None)` means "not found".
    ///
    /// The default runs a search on the SKU and picks the first exact match,
    /// preferring a non-variant product over its variants.
    async fn search_product_by_sku(
        &self,
        company_id: CompanyId,
        store_id: StoreId,
        sku: &str,
        timezone: &str,
    ) -> GatewayResult<Option<ProductSearchResult>> {
        let sku = sku.trim();
        if sku.is_empty() {
            return Ok(None);
        }
        let page = self.search_products(company_id, store_id, sku, timezone).await?;
        let mut matches: Vec<ProductSearchResult> = page
            .products
            .into_iter()
            .filter(|p| p.matches_sku(sku))
            .collect();
        let base = matches.iter().position(|p| !p.is_variant()).unwrap_or(0);
        if matches.is_empty() {
            Ok(None)
        } else {
            Ok(Some(matches.swap_remove(base)))
        }
    }

    /// The company's base currency, if configured.
    async fn get_base_currency(&self, company_id: CompanyId) -> GatewayResult<Option<Currency>>;

    /// Create the shipment. Exactly one call per save.
    async fn create_shipment(&self, request: &CreateShipmentRequest) -> GatewayResult<ShipmentCreated>;
}
