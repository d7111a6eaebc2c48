//! Selection mode: a shipment comes either from an order or from a supplier.
//!
//! [`Selection`] is a sum type, so order state and supplier state can never be
//! populated at the same time. Switching variants drops the other side.

use serde::Serialize;

use crate::draft::ShipmentDraft;
use crate::order::OrderSelection;
use crate::supplier::{OneTimeSupplier, SupplierKind, SupplierSelection};

/// Which source is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    None,
    Order,
    Supplier,
}

/// Active source together with its sub-state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selection {
    #[default]
    None,
    Order(OrderSelection),
    Supplier(SupplierSelection),
}

impl Selection {
    pub fn mode(&self) -> SelectionMode {
        match self {
            Selection::None => SelectionMode::None,
            Selection::Order(_) => SelectionMode::Order,
            Selection::Supplier(_) => SelectionMode::Supplier,
        }
    }
}

impl ShipmentDraft {
    /// Switch the active mode, discarding the other mode's state.
    ///
    /// Selecting the current mode again is a no-op. Any actual change empties
    /// the item set. Entering Supplier mode opens the form matching the
    /// current supplier kind.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        if mode == self.selection_mode() {
            return;
        }
        match mode {
            SelectionMode::None => self.replace_selection(Selection::None),
            SelectionMode::Order => self.replace_selection(Selection::Order(OrderSelection::default())),
            SelectionMode::Supplier => {
                let supplier = match self.supplier_kind {
                    SupplierKind::Existing => SupplierSelection::Registered(None),
                    SupplierKind::OneTime => SupplierSelection::OneTime(OneTimeSupplier::default()),
                };
                self.replace_selection(Selection::Supplier(supplier));
            }
        }
    }

    /// Back to no source at all.
    pub fn clear_selection(&mut self) {
        self.set_mode(SelectionMode::None);
    }
}
