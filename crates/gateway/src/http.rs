//! HTTP gateway: PostgREST-style RPC over `reqwest`.
//!
//! Every operation is `POST {base_url}/rest/v1/rpc/{procedure}` with a JSON
//! object of `p_`-prefixed arguments. Most procedures answer with an envelope
//! `{ success, data, message, error }`.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use storebase_core::{CompanyId, OrderId, StoreId};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::model::{
    Counterparty, CreateShipmentRequest, Currency, OrderLineItem, OrderRef, ProductSearchPage,
    ShipmentCreated,
};
use crate::procedure::{RemoteProcedureGateway, procedures};

const SEARCH_PAGE_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl<T> Envelope<T> {
    fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "request was not successful".to_string())
    }

    fn into_data(self, procedure: &str) -> GatewayResult<T> {
        if !self.success {
            return Err(GatewayError::business(self.failure_message()));
        }
        self.data
            .ok_or_else(|| GatewayError::decode(format!("{procedure}: missing data")))
    }
}

#[derive(Debug, Deserialize)]
struct CreateShipmentResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    shipment_number: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BaseCurrencyResponse {
    #[serde(default)]
    base_currency: Option<Currency>,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
}

/// [`RemoteProcedureGateway`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn rpc_url(&self, procedure: &str) -> String {
        format!(
            "{}/rest/v1/rpc/{}",
            self.config.base_url.trim_end_matches('/'),
            procedure
        )
    }

    /// Call a procedure and decode its raw JSON body.
    async fn call<T: DeserializeOwned>(&self, procedure: &'static str, args: Value) -> GatewayResult<T> {
        let mut req = self.client.post(self.rpc_url(procedure)).json(&args);
        if let Some(key) = &self.config.api_key {
            req = req.header("apikey", key);
        }
        if let Some(token) = self.config.auth_token.as_ref().or(self.config.api_key.as_ref()) {
            req = req.bearer_auth(token);
        }

        tracing::debug!(procedure, "calling remote procedure");
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(procedure, error = %e, "remote procedure transport failure");
            GatewayError::transport(e.to_string())
        })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::transport(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(procedure, status = status.as_u16(), "remote procedure returned error status");
            return Err(match serde_json::from_str::<PostgrestError>(&body) {
                Ok(err) if !err.message.trim().is_empty() => GatewayError::business(err.message),
                _ => GatewayError::transport(format!("{procedure} failed with HTTP {}", status.as_u16())),
            });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::decode(format!("{procedure}: {e}")))
    }
}

/// Prefix every key of a serialized argument struct with `p_`.
fn rpc_args<T: serde::Serialize>(args: &T) -> GatewayResult<Value> {
    let value = serde_json::to_value(args).map_err(|e| GatewayError::decode(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(Value::Object(
            map.into_iter()
                .map(|(k, v)| (format!("p_{k}"), v))
                .collect::<Map<String, Value>>(),
        )),
        other => Err(GatewayError::decode(format!("expected object arguments, got {other}"))),
    }
}

#[async_trait]
impl RemoteProcedureGateway for HttpGateway {
    async fn list_counterparties(&self, company_id: CompanyId) -> GatewayResult<Vec<Counterparty>> {
        let env: Envelope<Vec<Counterparty>> = self
            .call(procedures::LIST_COUNTERPARTIES, json!({ "p_company_id": company_id }))
            .await?;
        env.into_data(procedures::LIST_COUNTERPARTIES)
    }

    async fn list_orders(&self, company_id: CompanyId, timezone: &str) -> GatewayResult<Vec<OrderRef>> {
        let env: Envelope<Vec<OrderRef>> = self
            .call(
                procedures::LIST_ORDERS,
                json!({ "p_company_id": company_id, "p_timezone": timezone }),
            )
            .await?;
        env.into_data(procedures::LIST_ORDERS)
    }

    async fn get_order_items(&self, order_id: OrderId, timezone: &str) -> GatewayResult<Vec<OrderLineItem>> {
        let env: Envelope<Vec<OrderLineItem>> = self
            .call(
                procedures::GET_ORDER_ITEMS,
                json!({ "p_order_id": order_id, "p_timezone": timezone }),
            )
            .await?;
        env.into_data(procedures::GET_ORDER_ITEMS)
    }

    async fn search_products(
        &self,
        company_id: CompanyId,
        store_id: StoreId,
        query: &str,
        timezone: &str,
    ) -> GatewayResult<ProductSearchPage> {
        let env: Envelope<ProductSearchPage> = self
            .call(
                procedures::SEARCH_PRODUCTS,
                json!({
                    "p_company_id": company_id,
                    "p_store_id": store_id,
                    "p_page": 1,
                    "p_limit": SEARCH_PAGE_LIMIT,
                    "p_search": query.trim(),
                    "p_availability": null,
                    "p_brand_id": null,
                    "p_category_id": null,
                    "p_timezone": timezone,
                }),
            )
            .await?;
        env.into_data(procedures::SEARCH_PRODUCTS)
    }

    async fn get_base_currency(&self, company_id: CompanyId) -> GatewayResult<Option<Currency>> {
        let resp: BaseCurrencyResponse = self
            .call(procedures::GET_BASE_CURRENCY, json!({ "p_company_id": company_id }))
            .await?;
        Ok(resp.base_currency)
    }

    async fn create_shipment(&self, request: &CreateShipmentRequest) -> GatewayResult<ShipmentCreated> {
        let args = rpc_args(request)?;
        let resp: CreateShipmentResponse = self.call(procedures::CREATE_SHIPMENT, args).await?;

        if !resp.success {
            let msg = resp
                .error
                .or(resp.message)
                .unwrap_or_else(|| "Failed to create shipment".to_string());
            return Err(GatewayError::business(msg));
        }

        resp.shipment_number
            .map(|shipment_number| ShipmentCreated { shipment_number })
            .ok_or_else(|| GatewayError::decode("create shipment succeeded without a shipment number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::model::ShipmentItemPayload;

    async fn gateway_for(server: &MockServer) -> HttpGateway {
        let config = GatewayConfig::new(server.uri())
            .with_api_key("anon")
            .with_auth_token("session");
        HttpGateway::new(config).unwrap()
    }

    #[tokio::test]
    async fn list_counterparties_unwraps_envelope_and_sends_auth() {
        let server = MockServer::start().await;
        let company_id = CompanyId::new();

        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/get_counterparty_info"))
            .and(header("apikey", "anon"))
            .and(header("authorization", "Bearer session"))
            .and(body_partial_json(json!({ "p_company_id": company_id })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{
                    "counterparty_id": "0191d1a4-5f0e-7c2b-8a8e-3f4d2c1b0a99",
                    "name": "Acme",
                    "type": "Suppliers",
                    "is_internal": false
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let cps = gateway.list_counterparties(company_id).await.unwrap();
        assert_eq!(cps.len(), 1);
        assert_eq!(cps[0].name, "Acme");
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_a_business_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/inventory_get_order_info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "company has no orders module"
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let err = gateway.list_orders(CompanyId::new(), "UTC").await.unwrap_err();
        assert_eq!(err, GatewayError::business("company has no orders module"));
    }

    #[tokio::test]
    async fn http_error_with_message_is_business_and_without_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/get_base_currency"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "P0001",
                "message": "permission denied for company"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/inventory_get_order_items"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let err = gateway.get_base_currency(CompanyId::new()).await.unwrap_err();
        assert_eq!(err, GatewayError::business("permission denied for company"));

        let err = gateway.get_order_items(OrderId::new(), "UTC").await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(msg) if msg.contains("502")));
    }

    #[tokio::test]
    async fn search_decodes_items_alias_and_currency() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/get_inventory_page_v6"))
            .and(body_partial_json(json!({ "p_search": "shirt", "p_page": 1 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "items": [{
                        "product_id": "0191d1a4-5f0e-7c2b-8a8e-3f4d2c1b0a99",
                        "product_name": "Shirt",
                        "product_sku": "SH-1",
                        "display_name": "Shirt",
                        "display_sku": "SH-1",
                        "stock": { "quantity_on_hand": 7, "quantity_available": 5 },
                        "price": { "cost": 1200.0, "selling": 2500.0 }
                    }],
                    "currency": { "code": "USD", "symbol": "$" }
                }
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let page = gateway
            .search_products(CompanyId::new(), StoreId::new(), "  shirt ", "UTC")
            .await
            .unwrap();
        assert_eq!(page.products.len(), 1);
        assert_eq!(page.products[0].stock.quantity_on_hand, 7);
        assert_eq!(page.currency, Some(Currency::new("USD", "$")));
    }

    #[tokio::test]
    async fn create_shipment_prefixes_arguments() {
        let server = MockServer::start().await;
        let company_id = CompanyId::new();

        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/inventory_create_shipment_v3"))
            .and(body_partial_json(json!({
                "p_company_id": company_id,
                "p_timezone": "Asia/Seoul",
                "p_items": [{ "sku": "SKU-A", "quantity_shipped": 2, "unit_cost": 100.0 }],
                "p_tracking_number": "TRK-1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "shipment_number": "SH-20260101-001"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let request = CreateShipmentRequest {
            company_id,
            user_id: None,
            items: vec![ShipmentItemPayload {
                sku: "SKU-A".into(),
                quantity: 2,
                unit_cost: 100.0,
            }],
            time: Utc::now(),
            timezone: "Asia/Seoul".into(),
            order_ids: vec![],
            counterparty_id: None,
            supplier_info: None,
            tracking_number: Some("TRK-1".into()),
            notes: None,
            title: None,
        };
        let created = gateway.create_shipment(&request).await.unwrap();
        assert_eq!(created.shipment_number, "SH-20260101-001");
    }

    #[tokio::test]
    async fn create_shipment_failure_surfaces_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/inventory_create_shipment_v3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "SKU SKU-Z does not exist"
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let request = CreateShipmentRequest {
            company_id: CompanyId::new(),
            user_id: None,
            items: vec![],
            time: Utc::now(),
            timezone: "UTC".into(),
            order_ids: vec![],
            counterparty_id: None,
            supplier_info: None,
            tracking_number: None,
            notes: None,
            title: None,
        };
        let err = gateway.create_shipment(&request).await.unwrap_err();
        assert_eq!(err, GatewayError::business("SKU SKU-Z does not exist"));
    }

    #[test]
    fn rpc_args_rejects_non_objects() {
        assert!(rpc_args(&vec![1, 2]).is_err());
        let args = rpc_args(&json!({ "a": 1 })).unwrap();
        assert_eq!(args, json!({ "p_a": 1 }));
    }
}
