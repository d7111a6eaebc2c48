//! Shipment line items, merged by product identity.
//!
//! The working set holds at most one [`LineItem`] per [`ItemKey`]; every add
//! path (search, order, import) goes through the same lookup so duplicates can
//! never appear.

use serde::Serialize;

use storebase_core::{Entity, OrderId, OrderItemId, ProductId, VariantId};
use storebase_gateway::{OrderLineItem, ProductSearchResult};

/// Aggregation key: product plus optional variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ItemKey {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
}

impl ItemKey {
    pub fn new(product_id: ProductId, variant_id: Option<VariantId>) -> Self {
        Self {
            product_id,
            variant_id,
        }
    }

    pub fn of_product(product: &ProductSearchResult) -> Self {
        Self::new(product.product_id, product.variant_id)
    }

    pub fn of_order_line(line: &OrderLineItem) -> Self {
        Self::new(line.product_id, line.variant_id)
    }
}

/// Where a line item first came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineSource {
    Search,
    Order {
        order_id: OrderId,
        order_item_id: OrderItemId,
        order_number: String,
    },
    Import {
        row_number: Option<usize>,
    },
}

/// One line of the shipment being built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    key: ItemKey,
    pub display_name: String,
    pub sku: String,
    quantity: u64,
    unit_cost: f64,
    /// Advisory ceiling (stock on hand or remaining order quantity); not enforced.
    pub max_quantity: i64,
    pub source: LineSource,
}

impl LineItem {
    pub fn key(&self) -> ItemKey {
        self.key
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn unit_cost(&self) -> f64 {
        self.unit_cost
    }

    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.unit_cost
    }

    pub fn source_order_id(&self) -> Option<OrderId> {
        match &self.source {
            LineSource::Order { order_id, .. } => Some(*order_id),
            _ => None,
        }
    }

    pub fn exceeds_max(&self) -> bool {
        self.max_quantity > 0 && self.quantity as i64 > self.max_quantity
    }

    fn order_number(&self) -> &str {
        match &self.source {
            LineSource::Order { order_number, .. } => order_number,
            _ => "-",
        }
    }
}

impl Entity for LineItem {
    type Id = ItemKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }
}

/// Non-negative, finite cost; anything else becomes zero.
pub(crate) fn sanitize_cost(cost: f64) -> f64 {
    if cost.is_finite() && cost > 0.0 { cost } else { 0.0 }
}

/// Result of merging one import row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Added,
    Updated,
}

/// Ordered, deduplicated working set of shipment lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemAggregator {
    items: Vec<LineItem>,
}

impl ItemAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    pub fn get(&self, key: &ItemKey) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id() == key)
    }

    fn get_mut(&mut self, key: &ItemKey) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.id() == key)
    }

    /// Add one unit of a searched product, or bump the existing line by one.
    pub fn add_from_search(&mut self, product: &ProductSearchResult) {
        let key = ItemKey::of_product(product);
        if let Some(existing) = self.get_mut(&key) {
            existing.quantity = existing.quantity.saturating_add(1);
            return;
        }
        self.items.push(LineItem {
            key,
            display_name: product.name().to_string(),
            sku: product.sku().to_string(),
            quantity: 1,
            unit_cost: sanitize_cost(product.price.cost),
            max_quantity: product.stock.quantity_on_hand,
            source: LineSource::Search,
        });
    }

    /// Add the remaining quantity of one order line. Returns `false` when the
    /// line has nothing remaining or its product is already in the set.
    pub fn add_from_order_line(&mut self, line: &OrderLineItem, order_id: OrderId, order_number: &str) -> bool {
        let key = ItemKey::of_order_line(line);
        if !line.is_remaining() || self.get(&key).is_some() {
            return false;
        }
        self.items.push(LineItem {
            key,
            display_name: line.product_name.clone(),
            sku: line.sku.clone(),
            quantity: line.remaining_quantity as u64,
            unit_cost: sanitize_cost(line.unit_price),
            max_quantity: line.remaining_quantity,
            source: LineSource::Order {
                order_id,
                order_item_id: line.order_item_id,
                order_number: order_number.to_string(),
            },
        });
        true
    }

    /// Bulk version of [`Self::add_from_order_line`]; returns how many lines were added.
    pub fn add_all_from_order(&mut self, lines: &[OrderLineItem], order_id: OrderId, order_number: &str) -> usize {
        lines
            .iter()
            .filter(|line| self.add_from_order_line(line, order_id, order_number))
            .count()
    }

    /// Merge an imported row: existing lines gain the quantity and take the
    /// imported cost, new products are appended.
    pub fn merge_import(
        &mut self,
        product: &ProductSearchResult,
        quantity: u64,
        cost: f64,
        row_number: Option<usize>,
    ) -> Merge {
        let key = ItemKey::of_product(product);
        if let Some(existing) = self.get_mut(&key) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            existing.unit_cost = sanitize_cost(cost);
            return Merge::Updated;
        }
        self.items.push(LineItem {
            key,
            display_name: product.name().to_string(),
            sku: product.sku().to_string(),
            quantity,
            unit_cost: sanitize_cost(cost),
            max_quantity: product.stock.quantity_on_hand,
            source: LineSource::Import { row_number },
        });
        Merge::Added
    }

    /// Remove a line. Removing an absent key is a no-op.
    pub fn remove_item(&mut self, key: &ItemKey) {
        self.items.retain(|i| i.id() != key);
    }

    /// Set a line's quantity, clamped at zero. Returns `false` if absent.
    pub fn set_quantity(&mut self, key: &ItemKey, quantity: i64) -> bool {
        match self.get_mut(key) {
            Some(item) => {
                item.quantity = quantity.max(0) as u64;
                true
            }
            None => false,
        }
    }

    /// Overwrite a line's unit cost. Negative or non-finite costs become zero.
    pub fn set_unit_cost(&mut self, key: &ItemKey, cost: f64) -> bool {
        match self.get_mut(key) {
            Some(item) => {
                item.unit_cost = sanitize_cost(cost);
                true
            }
            None => false,
        }
    }

    /// Σ quantity × unit cost, computed on every call.
    pub fn total_amount(&self) -> f64 {
        self.items.iter().map(LineItem::line_total).sum()
    }

    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .fold(0u64, |acc, i| acc.saturating_add(i.quantity))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Lines whose name, SKU, or source order number contains `query`
    /// (case-insensitive). An empty query returns everything.
    pub fn filter(&self, query: &str) -> Vec<&LineItem> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.items.iter().collect();
        }
        self.items
            .iter()
            .filter(|i| {
                i.display_name.to_lowercase().contains(&query)
                    || i.sku.to_lowercase().contains(&query)
                    || i.order_number().to_lowercase().contains(&query)
            })
            .collect()
    }
}
