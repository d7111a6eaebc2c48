//! Company/store context threaded through the workflows.

use crate::error::{DomainError, DomainResult};
use crate::id::{CompanyId, StoreId, UserId};

/// Ambient app state (current company, store, user, timezone), passed
/// explicitly at construction instead of being read from globals.
///
/// Every field except the timezone may be absent: the user can open the
/// shipment screen before picking a company, and operations that need one
/// report that through [`DomainError::MissingContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyContext {
    company_id: Option<CompanyId>,
    store_id: Option<StoreId>,
    user_id: Option<UserId>,
    timezone: String,
}

impl CompanyContext {
    pub fn new(company_id: CompanyId, store_id: Option<StoreId>, timezone: impl Into<String>) -> Self {
        Self {
            company_id: Some(company_id),
            store_id,
            user_id: None,
            timezone: timezone.into(),
        }
    }

    /// A context with no company selected yet.
    pub fn detached(timezone: impl Into<String>) -> Self {
        Self {
            company_id: None,
            store_id: None,
            user_id: None,
            timezone: timezone.into(),
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn company_id(&self) -> Option<CompanyId> {
        self.company_id
    }

    pub fn store_id(&self) -> Option<StoreId> {
        self.store_id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn require_company(&self) -> DomainResult<CompanyId> {
        self.company_id
            .ok_or(DomainError::missing_context("company"))
    }

    /// Company and store are both needed for inventory lookups.
    pub fn require_store(&self) -> DomainResult<(CompanyId, StoreId)> {
        let company_id = self.require_company()?;
        let store_id = self
            .store_id
            .ok_or(DomainError::missing_context("store"))?;
        Ok((company_id, store_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_context_reports_missing_company() {
        let ctx = CompanyContext::detached("Asia/Seoul");
        assert_eq!(ctx.require_company(), Err(DomainError::MissingContext("company")));
        assert_eq!(ctx.timezone(), "Asia/Seoul");
    }

    #[test]
    fn store_lookup_requires_both_ids() {
        let company_id = CompanyId::new();
        let ctx = CompanyContext::new(company_id, None, "UTC");
        assert_eq!(ctx.require_store(), Err(DomainError::MissingContext("store")));

        let store_id = StoreId::new();
        let ctx = CompanyContext::new(company_id, Some(store_id), "UTC");
        assert_eq!(ctx.require_store(), Ok((company_id, store_id)));
    }
}
