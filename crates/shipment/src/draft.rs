//! The shipment being built.

use storebase_core::OrderId;

use crate::items::ItemAggregator;
use crate::order::OrderSelection;
use crate::selection::{Selection, SelectionMode};
use crate::supplier::{OneTimeSupplier, SupplierKind, SupplierSelection};

/// Working copy of a shipment: who it comes from, what is in it, and the
/// free-text fields.
///
/// Created empty when the workflow opens, mutated through the selection,
/// supplier, order and item operations, and consumed once by a save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentDraft {
    pub(crate) selection: Selection,
    pub(crate) supplier_kind: SupplierKind,
    pub(crate) items: ItemAggregator,
    tracking_number: String,
    notes: String,
    title: String,
}

impl ShipmentDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    /// Which supplier form is showing. Independent of the active mode.
    pub fn supplier_kind(&self) -> SupplierKind {
        self.supplier_kind
    }

    pub fn items(&self) -> &ItemAggregator {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut ItemAggregator {
        &mut self.items
    }

    pub fn order_selection(&self) -> Option<&OrderSelection> {
        match &self.selection {
            Selection::Order(order) => Some(order),
            _ => None,
        }
    }

    pub fn supplier_selection(&self) -> Option<&SupplierSelection> {
        match &self.selection {
            Selection::Supplier(supplier) => Some(supplier),
            _ => None,
        }
    }

    /// The selected order, if any.
    pub fn selected_order_id(&self) -> Option<OrderId> {
        self.order_selection().and_then(OrderSelection::order_id)
    }

    /// One-time fields currently held (empty when not in one-time supplier mode).
    pub fn one_time_supplier(&self) -> OneTimeSupplier {
        match &self.selection {
            Selection::Supplier(SupplierSelection::OneTime(fields)) => fields.clone(),
            _ => OneTimeSupplier::default(),
        }
    }

    pub fn tracking_number(&self) -> &str {
        &self.tracking_number
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_tracking_number(&mut self, value: impl Into<String>) {
        self.tracking_number = value.into();
    }

    pub fn set_notes(&mut self, value: impl Into<String>) {
        self.notes = value.into();
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.title = value.into();
    }

    /// Replace the selection. The item set is emptied whenever the mode
    /// changes.
    pub(crate) fn replace_selection(&mut self, next: Selection) {
        if next.mode() != self.selection.mode() {
            self.items.clear();
        }
        self.selection = next;
    }
}
