//! Validating and submitting the draft.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use storebase_core::CompanyContext;
use storebase_gateway::{CreateShipmentRequest, GatewayError, RemoteProcedureGateway, ShipmentItemPayload};

use crate::draft::ShipmentDraft;
use crate::selection::Selection;
use crate::supplier::SupplierSelection;

pub const SAVE_FAILED_MESSAGE: &str = "Failed to create shipment. Please try again.";

/// Precondition that stopped a save. Checked in declaration order.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SaveRejection {
    #[error("Please add at least one item to the shipment")]
    NoItems,

    #[error("Please select an order or a supplier")]
    NoSelection,

    #[error("Please select a supplier")]
    NoRegisteredSupplier,

    #[error("Please enter the supplier name")]
    MissingSupplierName,

    #[error("Company not selected. Please select a company first.")]
    NoCompany,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaveError {
    #[error(transparent)]
    Rejected(#[from] SaveRejection),

    #[error("A save is already in progress")]
    Busy,

    #[error("{}", .0.user_message(SAVE_FAILED_MESSAGE))]
    Gateway(GatewayError),
}

/// Build the create-shipment request, or say which precondition failed.
///
/// Zero-quantity lines are not shipped and do not count as items.
pub fn build_request(
    draft: &ShipmentDraft,
    context: &CompanyContext,
    now: DateTime<Utc>,
) -> Result<CreateShipmentRequest, SaveRejection> {
    let items: Vec<ShipmentItemPayload> = draft
        .items()
        .iter()
        .filter(|line| line.quantity() > 0)
        .map(|line| ShipmentItemPayload {
            sku: line.sku.clone(),
            quantity: line.quantity(),
            unit_cost: line.unit_cost(),
        })
        .collect();
    if items.is_empty() {
        return Err(SaveRejection::NoItems);
    }

    let (order_ids, counterparty_id, supplier_info) = match draft.selection() {
        Selection::None => return Err(SaveRejection::NoSelection),
        Selection::Order(order) => match order.order_id() {
            Some(order_id) => (vec![order_id], None, None),
            None => return Err(SaveRejection::NoSelection),
        },
        Selection::Supplier(SupplierSelection::Registered(id)) => match id {
            Some(id) => (Vec::new(), Some(*id), None),
            None => return Err(SaveRejection::NoRegisteredSupplier),
        },
        Selection::Supplier(SupplierSelection::OneTime(fields)) => {
            if !fields.has_name() {
                return Err(SaveRejection::MissingSupplierName);
            }
            (Vec::new(), None, Some(fields.to_payload()))
        }
    };

    let company_id = context.require_company().map_err(|_| SaveRejection::NoCompany)?;

    Ok(CreateShipmentRequest {
        company_id,
        user_id: context.user_id(),
        items,
        time: now,
        timezone: context.timezone().to_string(),
        order_ids,
        counterparty_id,
        supplier_info,
        tracking_number: trimmed(draft.tracking_number()),
        notes: trimmed(draft.notes()),
        title: trimmed(draft.title()),
    })
}

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Clears the busy flag when the save finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Issues exactly one create-shipment call per accepted save. Never retries.
pub struct SaveOrchestrator<G: ?Sized> {
    gateway: Arc<G>,
    busy: AtomicBool,
}

impl<G> SaveOrchestrator<G>
where
    G: RemoteProcedureGateway + ?Sized,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Validate and submit. Returns the generated shipment number.
    pub async fn save(&self, draft: &ShipmentDraft, context: &CompanyContext) -> Result<String, SaveError> {
        let request = build_request(draft, context, Utc::now())?;

        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SaveError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        info!(
            "Creating shipment with {} item(s) for company {}",
            request.items.len(),
            request.company_id
        );
        match self.gateway.create_shipment(&request).await {
            Ok(created) => {
                info!("Shipment {} created", created.shipment_number);
                Ok(created.shipment_number)
            }
            Err(err) => {
                warn!("Create shipment failed: {}", err);
                Err(SaveError::Gateway(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::fixtures::{order_line, product};
    use crate::supplier::OneTimeField;
    use std::time::Duration;
    use storebase_core::{CompanyId, CounterpartyId, OrderId, StoreId, UserId};
    use storebase_gateway::{InMemoryGateway, OrderRef, procedures};

    fn test_context() -> CompanyContext {
        CompanyContext::new(CompanyId::new(), Some(StoreId::new()), "Asia/Seoul")
    }

    fn test_order() -> OrderRef {
        OrderRef {
            order_id: OrderId::new(),
            order_number: "ORD-9".to_string(),
            order_date: None,
            supplier_id: None,
            supplier_name: String::new(),
            total_amount: 0.0,
            status: Default::default(),
        }
    }

    /// Items are added after the selection: changing the mode empties them.
    fn with_item(mut draft: ShipmentDraft) -> ShipmentDraft {
        draft.items_mut().add_from_search(&product("SKU-1", 500.0));
        draft
    }

    fn registered_draft() -> ShipmentDraft {
        let mut draft = ShipmentDraft::new();
        draft.select_registered(Some(CounterpartyId::new()));
        with_item(draft)
    }

    #[test]
    fn preconditions_fail_in_order() {
        let ctx = test_context();
        let now = Utc::now();

        let mut draft = ShipmentDraft::new();
        draft.select_registered(Some(CounterpartyId::new()));
        assert_eq!(build_request(&draft, &ctx, now), Err(SaveRejection::NoItems));

        let draft = with_item(ShipmentDraft::new());
        assert_eq!(build_request(&draft, &ctx, now), Err(SaveRejection::NoSelection));

        let mut draft = ShipmentDraft::new();
        draft.set_mode(crate::selection::SelectionMode::Supplier);
        let draft = with_item(draft);
        assert_eq!(build_request(&draft, &ctx, now), Err(SaveRejection::NoRegisteredSupplier));

        let mut draft = ShipmentDraft::new();
        draft.set_one_time_field(OneTimeField::Phone, "010-0000");
        let draft = with_item(draft);
        assert_eq!(build_request(&draft, &ctx, now), Err(SaveRejection::MissingSupplierName));

        let draft = registered_draft();
        assert_eq!(
            build_request(&draft, &CompanyContext::detached("UTC"), now),
            Err(SaveRejection::NoCompany)
        );
    }

    #[test]
    fn zero_quantity_lines_do_not_count() {
        let mut draft = registered_draft();
        let key = draft.items().iter().next().unwrap().key();
        draft.items_mut().set_quantity(&key, 0);

        assert_eq!(build_request(&draft, &test_context(), Utc::now()), Err(SaveRejection::NoItems));
    }

    #[test]
    fn order_request_carries_order_id_and_trimmed_texts() {
        let order = test_order();
        let ctx = test_context().with_user(UserId::new());
        let mut draft = ShipmentDraft::new();
        draft.select_order(&order);
        draft.items_mut().add_all_from_order(&[order_line("A", 3, 250.0)], order.order_id, "ORD-9");
        draft.items_mut().add_from_search(&product("B", 10.0));
        let zero = draft.items().iter().last().unwrap().key();
        draft.items_mut().set_quantity(&zero, 0);
        draft.set_tracking_number("  TRK-1 ");
        draft.set_notes("   ");

        let request = build_request(&draft, &ctx, Utc::now()).unwrap();

        assert_eq!(request.order_ids, vec![order.order_id]);
        assert_eq!(request.counterparty_id, None);
        assert_eq!(request.supplier_info, None);
        assert_eq!(request.user_id, ctx.user_id());
        assert_eq!(request.timezone, "Asia/Seoul");
        assert_eq!(request.tracking_number.as_deref(), Some("TRK-1"));
        assert_eq!(request.notes, None);
        assert_eq!(
            request.items,
            vec![ShipmentItemPayload {
                sku: "A".to_string(),
                quantity: 3,
                unit_cost: 250.0
            }]
        );
    }

    #[test]
    fn one_time_request_sends_supplier_card() {
        let mut draft = ShipmentDraft::new();
        draft.set_one_time_field(OneTimeField::Name, " Acme ");
        draft.set_one_time_field(OneTimeField::Email, "a@acme.test");
        let draft = with_item(draft);

        let request = build_request(&draft, &test_context(), Utc::now()).unwrap();

        let info = request.supplier_info.unwrap();
        assert_eq!(info.name, "Acme");
        assert_eq!(info.email.as_deref(), Some("a@acme.test"));
        assert_eq!(info.phone, None);
        assert!(request.order_ids.is_empty());
    }

    #[tokio::test]
    async fn rejected_save_makes_no_call() {
        let gateway = Arc::new(InMemoryGateway::new());
        let saver = SaveOrchestrator::new(gateway.clone());

        let err = saver.save(&ShipmentDraft::new(), &test_context()).await.unwrap_err();

        assert_eq!(err, SaveError::Rejected(SaveRejection::NoItems));
        assert_eq!(err.to_string(), "Please add at least one item to the shipment");
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn business_errors_verbatim_transport_errors_generic() {
        let gateway = Arc::new(InMemoryGateway::new());
        let saver = SaveOrchestrator::new(gateway.clone());
        let draft = registered_draft();

        gateway.fail(procedures::CREATE_SHIPMENT, GatewayError::business("Supplier is inactive"));
        let err = saver.save(&draft, &test_context()).await.unwrap_err();
        assert_eq!(err.to_string(), "Supplier is inactive");

        gateway.fail(procedures::CREATE_SHIPMENT, GatewayError::transport("connection reset"));
        let err = saver.save(&draft, &test_context()).await.unwrap_err();
        assert_eq!(err.to_string(), SAVE_FAILED_MESSAGE);

        assert_eq!(gateway.call_count(procedures::CREATE_SHIPMENT), 2);
        assert!(!saver.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn second_save_while_busy_is_rejected() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.set_latency(procedures::CREATE_SHIPMENT, Duration::from_secs(2));
        let saver = SaveOrchestrator::new(gateway.clone());
        let draft = registered_draft();
        let ctx = test_context();

        let (first, second) = tokio::join!(saver.save(&draft, &ctx), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            saver.save(&draft, &ctx).await
        });

        assert_eq!(first, Ok("SH-00001".to_string()));
        assert_eq!(second, Err(SaveError::Busy));
        assert_eq!(gateway.created_shipments().len(), 1);
    }
}
