//! Supplier side of the selection: a registered counterparty or a one-time
//! contact card.

use std::str::FromStr;

use serde::Serialize;

use storebase_core::{CounterpartyId, DomainError, ValueObject};
use storebase_gateway::{Counterparty, OneTimeSupplierPayload};

use crate::draft::ShipmentDraft;
use crate::selection::{Selection, SelectionMode};

/// Which supplier form the user is filling in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierKind {
    #[default]
    Existing,
    OneTime,
}

/// Contact details of a supplier that is not registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OneTimeSupplier {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl ValueObject for OneTimeSupplier {}

impl OneTimeSupplier {
    /// True when every field is blank after trimming.
    pub fn is_empty(&self) -> bool {
        [&self.name, &self.phone, &self.email, &self.address]
            .iter()
            .all(|f| f.trim().is_empty())
    }

    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn set(&mut self, field: OneTimeField, value: impl Into<String>) {
        let value = value.into();
        match field {
            OneTimeField::Name => self.name = value,
            OneTimeField::Phone => self.phone = value,
            OneTimeField::Email => self.email = value,
            OneTimeField::Address => self.address = value,
        }
    }

    /// Wire payload with trimmed values; blank optional fields are omitted.
    pub fn to_payload(&self) -> OneTimeSupplierPayload {
        fn non_empty(value: &str) -> Option<String> {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }

        OneTimeSupplierPayload {
            name: self.name.trim().to_string(),
            phone: non_empty(&self.phone),
            email: non_empty(&self.email),
            address: non_empty(&self.address),
        }
    }
}

/// One field of the one-time supplier form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneTimeField {
    Name,
    Phone,
    Email,
    Address,
}

impl FromStr for OneTimeField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "phone" => Ok(Self::Phone),
            "email" => Ok(Self::Email),
            "address" => Ok(Self::Address),
            other => Err(DomainError::validation(format!(
                "unknown supplier field: {other}"
            ))),
        }
    }
}

/// Supplier sub-state. Registered and one-time are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplierSelection {
    Registered(Option<CounterpartyId>),
    OneTime(OneTimeSupplier),
}

/// Picker entry for a registered supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierOption {
    pub counterparty_id: CounterpartyId,
    pub name: String,
    pub badges: Vec<&'static str>,
}

impl SupplierOption {
    pub fn label(&self) -> String {
        if self.badges.is_empty() {
            self.name.clone()
        } else {
            format!("{} [{}]", self.name, self.badges.join(", "))
        }
    }
}

impl From<&Counterparty> for SupplierOption {
    fn from(c: &Counterparty) -> Self {
        Self {
            counterparty_id: c.counterparty_id,
            name: c.name.clone(),
            badges: c.badges(),
        }
    }
}

/// Registered counterparties, fetched once per workflow.
#[derive(Debug, Clone, Default)]
pub struct SupplierDirectory {
    counterparties: Option<Vec<Counterparty>>,
}

impl SupplierDirectory {
    pub fn seeded(counterparties: Vec<Counterparty>) -> Self {
        Self {
            counterparties: Some(counterparties),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.counterparties.is_some()
    }

    pub fn store(&mut self, counterparties: Vec<Counterparty>) {
        self.counterparties = Some(counterparties);
    }

    pub fn counterparties(&self) -> &[Counterparty] {
        self.counterparties.as_deref().unwrap_or_default()
    }

    pub fn find(&self, id: CounterpartyId) -> Option<&Counterparty> {
        self.counterparties().iter().find(|c| c.counterparty_id == id)
    }

    pub fn options(&self) -> Vec<SupplierOption> {
        self.counterparties().iter().map(SupplierOption::from).collect()
    }
}

impl ShipmentDraft {
    /// Pick a registered supplier. `None` clears the registered pick.
    pub fn select_registered(&mut self, id: Option<CounterpartyId>) {
        match id {
            Some(id) => {
                self.supplier_kind = SupplierKind::Existing;
                self.replace_selection(Selection::Supplier(SupplierSelection::Registered(Some(id))));
            }
            None => {
                if matches!(self.selection, Selection::Supplier(SupplierSelection::Registered(_))) {
                    self.replace_selection(Selection::None);
                }
            }
        }
    }

    /// Update one field of the one-time supplier form.
    ///
    /// Any non-blank field puts the draft in Supplier mode; blanking the last
    /// field drops back to no selection.
    pub fn set_one_time_field(&mut self, field: OneTimeField, value: impl Into<String>) {
        self.supplier_kind = SupplierKind::OneTime;
        let mut fields = self.one_time_supplier();
        fields.set(field, value);

        if fields.is_empty() {
            if self.selection_mode() == SelectionMode::Supplier {
                self.replace_selection(Selection::None);
            }
            return;
        }
        self.replace_selection(Selection::Supplier(SupplierSelection::OneTime(fields)));
    }

    /// Switch between the registered picker and the one-time form.
    ///
    /// Switching to existing discards one-time fields. Switching to one-time
    /// discards the registered pick and any order selection; the mode stays
    /// None until a field is typed.
    pub fn toggle_supplier_kind(&mut self, kind: SupplierKind) {
        if kind == self.supplier_kind {
            return;
        }
        self.supplier_kind = kind;
        match kind {
            SupplierKind::Existing => {
                if matches!(self.selection, Selection::Supplier(SupplierSelection::OneTime(_))) {
                    self.selection = Selection::Supplier(SupplierSelection::Registered(None));
                }
            }
            SupplierKind::OneTime => self.replace_selection(Selection::None),
        }
    }

    /// Drop both supplier representations.
    pub fn clear_supplier_selection(&mut self) {
        if self.selection_mode() == SelectionMode::Supplier {
            self.replace_selection(Selection::None);
        }
    }
}
