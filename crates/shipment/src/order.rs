//! Order side of the selection.

use storebase_core::{CounterpartyId, OrderId};
use storebase_gateway::{GatewayError, OrderLineItem, OrderRef};

use crate::draft::ShipmentDraft;
use crate::selection::Selection;

/// Order sub-state: the chosen order and its shippable lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSelection {
    order: Option<OrderRef>,
    lines: Vec<OrderLineItem>,
    lines_error: Option<GatewayError>,
}

impl OrderSelection {
    fn for_order(order: &OrderRef) -> Self {
        Self {
            order: Some(order.clone()),
            lines: Vec::new(),
            lines_error: None,
        }
    }

    pub fn order(&self) -> Option<&OrderRef> {
        self.order.as_ref()
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order.as_ref().map(|o| o.order_id)
    }

    pub fn order_number(&self) -> &str {
        self.order.as_ref().map(|o| o.order_number.as_str()).unwrap_or_default()
    }

    /// Supplier of the selected order, shown next to it. Display only: the
    /// draft stays in Order mode.
    pub fn supplier_hint(&self) -> Option<CounterpartyId> {
        self.order.as_ref().and_then(|o| o.supplier_id)
    }

    /// Lines that still have quantity to ship.
    pub fn lines(&self) -> &[OrderLineItem] {
        &self.lines
    }

    /// Why loading the lines failed, if it did.
    pub fn lines_error(&self) -> Option<&GatewayError> {
        self.lines_error.as_ref()
    }
}

/// Orders of the company, fetched once per workflow. Only open orders are kept.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: Option<Vec<OrderRef>>,
}

impl OrderBook {
    pub fn seeded(orders: Vec<OrderRef>) -> Self {
        let mut book = Self::default();
        book.store(orders);
        book
    }

    pub fn is_loaded(&self) -> bool {
        self.orders.is_some()
    }

    pub fn store(&mut self, orders: Vec<OrderRef>) {
        self.orders = Some(orders.into_iter().filter(OrderRef::is_open).collect());
    }

    pub fn orders(&self) -> &[OrderRef] {
        self.orders.as_deref().unwrap_or_default()
    }

    pub fn find(&self, order_id: OrderId) -> Option<&OrderRef> {
        self.orders().iter().find(|o| o.order_id == order_id)
    }

    /// Orders placed with `supplier`; every order when no supplier is given.
    pub fn filter_by_supplier(&self, supplier: Option<CounterpartyId>) -> Vec<&OrderRef> {
        self.orders()
            .iter()
            .filter(|o| supplier.is_none() || o.supplier_id == supplier)
            .collect()
    }
}

impl ShipmentDraft {
    /// Select an order. Returns `false` when it was already selected.
    ///
    /// Any other order (or none) before this one means the item set is
    /// cleared: items belong to the order they were picked from.
    pub fn select_order(&mut self, order: &OrderRef) -> bool {
        if self.selected_order_id() == Some(order.order_id) {
            return false;
        }
        self.items.clear();
        self.selection = Selection::Order(OrderSelection::for_order(order));
        true
    }

    /// Attach the result of loading an order's lines.
    ///
    /// Ignored (returns `false`) unless `order_id` is still the selected
    /// order. A failure leaves the order selected with no lines.
    pub fn set_order_lines(
        &mut self,
        order_id: OrderId,
        result: Result<Vec<OrderLineItem>, GatewayError>,
    ) -> bool {
        let Selection::Order(selection) = &mut self.selection else {
            return false;
        };
        if selection.order_id() != Some(order_id) {
            return false;
        }
        match result {
            Ok(lines) => {
                selection.lines = lines.into_iter().filter(OrderLineItem::is_remaining).collect();
                selection.lines_error = None;
            }
            Err(err) => {
                selection.lines.clear();
                selection.lines_error = Some(err);
            }
        }
        true
    }

    /// Unset the order and its lines, staying in Order mode.
    pub fn clear_order(&mut self) {
        if let Selection::Order(selection) = &mut self.selection {
            *selection = OrderSelection::default();
            self.items.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::fixtures::{order_line, product};
    use crate::selection::SelectionMode;
    use storebase_gateway::OrderStatus;

    fn order(number: &str, supplier: Option<CounterpartyId>, status: OrderStatus) -> OrderRef {
        OrderRef {
            order_id: OrderId::new(),
            order_number: number.to_string(),
            order_date: Some("2026-10-01".to_string()),
            supplier_id: supplier,
            supplier_name: "Acme".to_string(),
            total_amount: 1000.0,
            status,
        }
    }

    #[test]
    fn selecting_an_order_enters_order_mode_and_hints_supplier() {
        let supplier = CounterpartyId::new();
        let o = order("ORD-1", Some(supplier), OrderStatus::Pending);
        let mut draft = ShipmentDraft::new();

        assert!(draft.select_order(&o));
        assert_eq!(draft.selection_mode(), SelectionMode::Order);
        let selection = draft.order_selection().unwrap();
        assert_eq!(selection.order_id(), Some(o.order_id));
        assert_eq!(selection.supplier_hint(), Some(supplier));
        assert!(draft.supplier_selection().is_none());
    }

    #[test]
    fn reselecting_same_order_keeps_items_other_order_clears_them() {
        let first = order("ORD-1", None, OrderStatus::Pending);
        let second = order("ORD-2", None, OrderStatus::Process);
        let mut draft = ShipmentDraft::new();
        draft.select_order(&first);
        draft.items_mut().add_from_search(&product("A", 1.0));

        assert!(!draft.select_order(&first));
        assert_eq!(draft.items().len(), 1);

        assert!(draft.select_order(&second));
        assert!(draft.items().is_empty());
    }

    #[test]
    fn lines_are_filtered_to_remaining_quantity() {
        let o = order("ORD-1", None, OrderStatus::Pending);
        let mut draft = ShipmentDraft::new();
        draft.select_order(&o);

        let applied = draft.set_order_lines(o.order_id, Ok(vec![order_line("A", 3, 1.0), order_line("B", 0, 1.0)]));

        assert!(applied);
        let lines = draft.order_selection().unwrap().lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].sku, "A");
    }

    #[test]
    fn failed_line_load_keeps_order_selected() {
        let o = order("ORD-1", None, OrderStatus::Pending);
        let mut draft = ShipmentDraft::new();
        draft.select_order(&o);

        draft.set_order_lines(o.order_id, Err(GatewayError::transport("timeout")));

        let selection = draft.order_selection().unwrap();
        assert_eq!(selection.order_id(), Some(o.order_id));
        assert!(selection.lines().is_empty());
        assert!(selection.lines_error().is_some());
    }

    #[test]
    fn stale_line_results_are_ignored() {
        let first = order("ORD-1", None, OrderStatus::Pending);
        let second = order("ORD-2", None, OrderStatus::Pending);
        let mut draft = ShipmentDraft::new();
        draft.select_order(&first);
        draft.select_order(&second);

        assert!(!draft.set_order_lines(first.order_id, Ok(vec![order_line("A", 1, 1.0)])));
        assert!(draft.order_selection().unwrap().lines().is_empty());
    }

    #[test]
    fn clear_order_stays_in_order_mode() {
        let o = order("ORD-1", None, OrderStatus::Pending);
        let mut draft = ShipmentDraft::new();
        draft.select_order(&o);
        draft.items_mut().add_from_search(&product("A", 1.0));

        draft.clear_order();

        assert_eq!(draft.selection_mode(), SelectionMode::Order);
        assert_eq!(draft.selected_order_id(), None);
        assert!(draft.items().is_empty());
    }

    #[test]
    fn order_book_keeps_open_orders_and_filters_by_supplier() {
        let acme = CounterpartyId::new();
        let other = CounterpartyId::new();
        let book = OrderBook::seeded(vec![
            order("ORD-1", Some(acme), OrderStatus::Pending),
            order("ORD-2", Some(other), OrderStatus::Process),
            order("ORD-3", Some(acme), OrderStatus::Other),
        ]);

        assert_eq!(book.orders().len(), 2);
        assert_eq!(book.filter_by_supplier(None).len(), 2);
        let for_acme = book.filter_by_supplier(Some(acme));
        assert_eq!(for_acme.len(), 1);
        assert_eq!(for_acme[0].order_number, "ORD-1");
    }
}
