//! Wire models exchanged with the remote procedures.
//!
//! Field names follow the procedures' JSON (snake_case); optional columns
//! default so older procedure versions still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storebase_core::{
    CompanyId, CounterpartyId, OrderId, OrderItemId, ProductId, UserId, ValueObject, VariantId,
};

/// Display currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    #[serde(alias = "currency_code")]
    pub code: String,
    pub symbol: String,
}

impl ValueObject for Currency {}

impl Default for Currency {
    fn default() -> Self {
        Self {
            code: "KRW".to_string(),
            symbol: "₩".to_string(),
        }
    }
}

impl Currency {
    pub fn new(code: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
        }
    }

    /// Format an amount with the currency symbol and thousands separators,
    /// e.g. `₩12,500` or `$1,234.50`.
    pub fn format_amount(&self, amount: f64) -> String {
        let negative = amount < 0.0;
        let abs = amount.abs();
        let rendered = if abs.fract() == 0.0 {
            format!("{abs:.0}")
        } else {
            format!("{abs:.2}")
        };
        let (int_part, frac_part) = match rendered.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (rendered.as_str(), None),
        };

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (idx, ch) in int_part.chars().enumerate() {
            if idx > 0 && (int_part.len() - idx) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if negative { "-" } else { "" };
        match frac_part {
            Some(f) => format!("{sign}{}{grouped}.{f}", self.symbol),
            None => format!("{sign}{}{grouped}", self.symbol),
        }
    }
}

/// Registered counterparty (from `get_counterparty_info`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub counterparty_id: CounterpartyId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_internal: bool,
}

impl Counterparty {
    pub fn is_supplier(&self) -> bool {
        self.kind == "Suppliers"
    }

    /// Badges shown next to the name in supplier pickers.
    pub fn badges(&self) -> Vec<&'static str> {
        let mut badges = Vec::new();
        if self.is_internal {
            badges.push("INTERNAL");
        }
        if self.is_supplier() {
            badges.push("SUPPLIER");
        }
        badges
    }
}

/// Order status as reported by `inventory_get_order_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Process,
    #[serde(other)]
    Other,
}

/// Purchase order available for shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRef {
    pub order_id: OrderId,
    pub order_number: String,
    #[serde(default)]
    pub order_date: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<CounterpartyId>,
    #[serde(default)]
    pub supplier_name: String,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub status: OrderStatus,
}

impl OrderRef {
    /// Only pending and in-process orders can still be shipped against.
    pub fn is_open(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Process)
    }

    pub fn label(&self) -> String {
        if self.supplier_name.is_empty() {
            self.order_number.clone()
        } else {
            format!("{} - {}", self.order_number, self.supplier_name)
        }
    }
}

/// Line of a purchase order (from `inventory_get_order_items`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub order_item_id: OrderItemId,
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub quantity_ordered: i64,
    pub remaining_quantity: i64,
    #[serde(default)]
    pub unit_price: f64,
}

impl OrderLineItem {
    pub fn is_remaining(&self) -> bool {
        self.remaining_quantity > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductStock {
    #[serde(default)]
    pub quantity_on_hand: i64,
    #[serde(default)]
    pub quantity_available: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductPrice {
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub selling: f64,
}

/// Product (or one variant of a product) returned by inventory search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSearchResult {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub product_sku: String,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub variant_name: Option<String>,
    #[serde(default)]
    pub variant_sku: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub display_sku: String,
    #[serde(default)]
    pub stock: ProductStock,
    #[serde(default)]
    pub price: ProductPrice,
}

impl ProductSearchResult {
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.product_name
        } else {
            &self.display_name
        }
    }

    pub fn sku(&self) -> &str {
        if self.display_sku.is_empty() {
            &self.product_sku
        } else {
            &self.display_sku
        }
    }

    pub fn is_variant(&self) -> bool {
        self.variant_id.is_some()
    }

    /// Exact, case-insensitive SKU match against display, product, or variant SKU.
    pub fn matches_sku(&self, sku: &str) -> bool {
        let wanted = sku.trim();
        if wanted.is_empty() {
            return false;
        }
        self.display_sku.eq_ignore_ascii_case(wanted)
            || self.product_sku.eq_ignore_ascii_case(wanted)
            || self
                .variant_sku
                .as_deref()
                .is_some_and(|v| v.eq_ignore_ascii_case(wanted))
    }

    pub fn matches_variant_name(&self, name: &str) -> bool {
        self.variant_name
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(name.trim()))
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductSearchPage {
    #[serde(alias = "items", default)]
    pub products: Vec<ProductSearchResult>,
    #[serde(default)]
    pub currency: Option<Currency>,
}

/// Item line sent to `inventory_create_shipment`. Internal ids are not sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentItemPayload {
    pub sku: String,
    #[serde(rename = "quantity_shipped")]
    pub quantity: u64,
    pub unit_cost: f64,
}

/// Contact card for a supplier that is not registered. Only non-empty fields
/// are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeSupplierPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Arguments of the create-shipment procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateShipmentRequest {
    pub company_id: CompanyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub items: Vec<ShipmentItemPayload>,
    pub time: DateTime<Utc>,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_ids: Vec<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_id: Option<CounterpartyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_info: Option<OneTimeSupplierPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Successful create-shipment result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentCreated {
    pub shipment_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn currency_formats_with_grouping() {
        let krw = Currency::default();
        assert_eq!(krw.format_amount(0.0), "₩0");
        assert_eq!(krw.format_amount(12_500.0), "₩12,500");
        assert_eq!(krw.format_amount(1_234_567.0), "₩1,234,567");

        let usd = Currency::new("USD", "$");
        assert_eq!(usd.format_amount(1234.5), "$1,234.50");
        assert_eq!(usd.format_amount(-999.0), "-$999");
    }

    #[test]
    fn base_currency_decodes_from_currency_code() {
        let c: Currency = serde_json::from_value(json!({"currency_code": "USD", "symbol": "$"})).unwrap();
        assert_eq!(c, Currency::new("USD", "$"));
    }

    #[test]
    fn counterparty_badges() {
        let cp: Counterparty = serde_json::from_value(json!({
            "counterparty_id": "0191d1a4-5f0e-7c2b-8a8e-3f4d2c1b0a99",
            "name": "Acme",
            "type": "Suppliers",
            "is_internal": true
        }))
        .unwrap();
        assert_eq!(cp.badges(), vec!["INTERNAL", "SUPPLIER"]);
        assert_eq!(cp.email, None);
    }

    #[test]
    fn unknown_order_status_is_not_open() {
        let order: OrderRef = serde_json::from_value(json!({
            "order_id": "0191d1a4-5f0e-7c2b-8a8e-3f4d2c1b0a99",
            "order_number": "ORD-1",
            "supplier_name": "Acme",
            "status": "complete"
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Other);
        assert!(!order.is_open());
        assert_eq!(order.label(), "ORD-1 - Acme");
    }

    #[test]
    fn sku_match_checks_all_sku_columns() {
        let product = ProductSearchResult {
            product_id: ProductId::new(),
            product_name: "Shirt".into(),
            product_sku: "SH-1".into(),
            variant_id: Some(VariantId::new()),
            variant_name: Some("Red / Large".into()),
            variant_sku: Some("SH-1-RL".into()),
            display_name: "Shirt - Red / Large".into(),
            display_sku: "SH-1-RL".into(),
            stock: ProductStock::default(),
            price: ProductPrice::default(),
        };
        assert!(product.matches_sku("sh-1"));
        assert!(product.matches_sku(" SH-1-rl "));
        assert!(!product.matches_sku("SH"));
        assert!(!product.matches_sku(""));
        assert!(product.matches_variant_name("red / large"));
    }

    #[test]
    fn create_request_omits_empty_optionals() {
        let req = CreateShipmentRequest {
            company_id: CompanyId::new(),
            user_id: None,
            items: vec![ShipmentItemPayload {
                sku: "SKU-A".into(),
                quantity: 2,
                unit_cost: 100.0,
            }],
            time: Utc::now(),
            timezone: "UTC".into(),
            order_ids: vec![],
            counterparty_id: None,
            supplier_info: Some(OneTimeSupplierPayload {
                name: "Acme".into(),
                phone: None,
                email: Some("a@acme.test".into()),
                address: None,
            }),
            tracking_number: None,
            notes: None,
            title: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("order_ids"));
        assert!(!obj.contains_key("tracking_number"));
        assert_eq!(value["items"][0]["quantity_shipped"], json!(2));
        assert_eq!(value["supplier_info"], json!({"name": "Acme", "email": "a@acme.test"}));
    }
}
