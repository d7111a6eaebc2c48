//! Reconciling imported rows against the item set.
//!
//! Rows are resolved one at a time, in input order, against a scratch copy of
//! the items. Resolved rows are merged; unresolved ones are collected as
//! misses. The copy replaces the real item set only after the last row, so an
//! aborted import leaves the draft untouched.

use std::fmt;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use storebase_core::{CompanyContext, CompanyId, DomainError, StoreId};
use storebase_gateway::{GatewayError, ProductSearchResult, RemoteProcedureGateway};

use crate::items::{ItemAggregator, Merge};

/// One row of an import sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    /// 1-based sheet row (header is row 1), when the row came from a sheet.
    pub row_number: Option<usize>,
    pub sku: String,
    pub variant_name: Option<String>,
    pub cost: f64,
    pub quantity: u64,
}

impl ImportRow {
    pub fn new(sku: impl Into<String>, cost: f64, quantity: u64) -> Self {
        Self {
            row_number: None,
            sku: sku.into(),
            variant_name: None,
            cost,
            quantity,
        }
    }

    pub fn with_variant(mut self, variant_name: impl Into<String>) -> Self {
        let name = variant_name.into();
        self.variant_name = (!name.trim().is_empty()).then_some(name);
        self
    }

    pub fn at_row(mut self, row_number: usize) -> Self {
        self.row_number = Some(row_number);
        self
    }
}

/// Why a row could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    NotFound,
    /// The SKU only exists as variants and no variant name was given.
    VariantRequired,
    VariantNotFound(String),
    LookupFailed(GatewayError),
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::NotFound | MissReason::LookupFailed(_) => f.write_str("SKU not found"),
            MissReason::VariantRequired => f.write_str("Variant Name is required for this product"),
            MissReason::VariantNotFound(name) => write!(f, "Variant \"{name}\" not found"),
        }
    }
}

/// An unresolved row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportMiss {
    pub row_number: Option<usize>,
    pub sku: String,
    pub reason: MissReason,
}

impl fmt::Display for ImportMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row_number {
            Some(row) => write!(f, "Row {row}: {} - {}", self.sku, self.reason),
            None => write!(f, "{} - {}", self.sku, self.reason),
        }
    }
}

/// Outcome of a completed import. Misses are a warning, not a failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub added: usize,
    pub updated: usize,
    pub misses: Vec<ImportMiss>,
}

impl ImportReport {
    pub fn committed(&self) -> usize {
        self.added + self.updated
    }

    pub fn has_misses(&self) -> bool {
        !self.misses.is_empty()
    }

    /// SKUs of the unresolved rows, in input order.
    pub fn not_found_skus(&self) -> Vec<&str> {
        self.misses.iter().map(|m| m.sku.as_str()).collect()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("No valid SKUs found in the import file. Please check the file format.")]
    NoRows,

    #[error("Company or Store not selected. Please select a company and store first.")]
    MissingContext(#[source] DomainError),

    #[error("import cancelled")]
    TornDown,
}

/// Pick the product a row refers to from the exact-SKU matches.
///
/// With a variant name, a product that has variants must have one with that
/// name; a product without variants ignores the name. Without a variant name,
/// a SKU that only exists as variants is ambiguous.
pub fn resolve_row(
    matches: &[ProductSearchResult],
    variant_name: Option<&str>,
) -> Result<ProductSearchResult, MissReason> {
    if matches.is_empty() {
        return Err(MissReason::NotFound);
    }
    let base = matches.iter().find(|p| !p.is_variant());
    let has_variants = matches.iter().any(ProductSearchResult::is_variant);

    match variant_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) if has_variants => matches
            .iter()
            .find(|p| p.matches_variant_name(name))
            .cloned()
            .ok_or_else(|| MissReason::VariantNotFound(name.to_string())),
        Some(_) => Ok(base.unwrap_or(&matches[0]).clone()),
        None => match base {
            Some(product) => Ok(product.clone()),
            None => Err(MissReason::VariantRequired),
        },
    }
}

/// Resolves rows through the gateway and merges them into an item set.
pub struct ImportReconciler<'a, G: ?Sized> {
    gateway: &'a G,
    context: &'a CompanyContext,
    cancel: &'a CancellationToken,
}

impl<'a, G> ImportReconciler<'a, G>
where
    G: RemoteProcedureGateway + ?Sized,
{
    pub fn new(gateway: &'a G, context: &'a CompanyContext, cancel: &'a CancellationToken) -> Self {
        Self {
            gateway,
            context,
            cancel,
        }
    }

    pub async fn reconcile(
        &self,
        rows: &[ImportRow],
        items: &mut ItemAggregator,
    ) -> Result<ImportReport, ImportError> {
        if rows.is_empty() {
            return Err(ImportError::NoRows);
        }
        let (company_id, store_id) = self
            .context
            .require_store()
            .map_err(ImportError::MissingContext)?;

        let mut scratch = items.clone();
        let mut report = ImportReport::default();

        for row in rows {
            if self.cancel.is_cancelled() {
                warn!("Import cancelled after {} of {} rows", report.committed() + report.misses.len(), rows.len());
                return Err(ImportError::TornDown);
            }

            match self.lookup(company_id, store_id, row).await {
                Ok(product) => match scratch.merge_import(&product, row.quantity, row.cost, row.row_number) {
                    Merge::Added => report.added += 1,
                    Merge::Updated => report.updated += 1,
                },
                Err(reason) => report.misses.push(ImportMiss {
                    row_number: row.row_number,
                    sku: row.sku.clone(),
                    reason,
                }),
            }
        }

        if self.cancel.is_cancelled() {
            return Err(ImportError::TornDown);
        }
        *items = scratch;

        info!(
            "Import finished: {} added, {} updated, {} not found",
            report.added,
            report.updated,
            report.misses.len()
        );
        Ok(report)
    }

    async fn lookup(
        &self,
        company_id: CompanyId,
        store_id: StoreId,
        row: &ImportRow,
    ) -> Result<ProductSearchResult, MissReason> {
        let timezone = self.context.timezone();
        let sku = row.sku.trim();

        let Some(variant_name) = row.variant_name.as_deref() else {
            return match self.gateway.search_product_by_sku(company_id, store_id, sku, timezone).await {
                Ok(Some(product)) if product.is_variant() => Err(MissReason::VariantRequired),
                Ok(Some(product)) => Ok(product),
                Ok(None) => Err(MissReason::NotFound),
                Err(err) => {
                    warn!("SKU lookup for '{}' failed: {}", sku, err);
                    Err(MissReason::LookupFailed(err))
                }
            };
        };

        match self.gateway.search_products(company_id, store_id, sku, timezone).await {
            Ok(page) => {
                let matches: Vec<_> = page.products.into_iter().filter(|p| p.matches_sku(sku)).collect();
                resolve_row(&matches, Some(variant_name))
            }
            Err(err) => {
                warn!("SKU lookup for '{}' failed: {}", sku, err);
                Err(MissReason::LookupFailed(err))
            }
        }
    }
}
