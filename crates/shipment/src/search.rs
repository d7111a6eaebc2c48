//! Debounced product search where only the latest query may land.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use storebase_core::CompanyContext;
use storebase_gateway::{Currency, GatewayError, ProductSearchResult, RemoteProcedureGateway};

/// Quiet period before a query is sent.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// What happened to one call of [`ProductSearch::search`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Results replaced; carries the result count.
    Applied(usize),
    /// Blank query or no company/store: results emptied without a call.
    Cleared,
    /// A newer query arrived; this one was dropped (before or after the call).
    Superseded,
    Failed(GatewayError),
    TornDown,
}

#[derive(Debug, Default)]
struct SearchState {
    query: String,
    results: Vec<ProductSearchResult>,
    currency: Option<Currency>,
}

/// Search box state shared between concurrent keystroke tasks.
///
/// Every call takes a generation number; after the debounce window and again
/// after the gateway answers, a call only proceeds if its generation is still
/// the newest.
#[derive(Debug)]
pub struct ProductSearch {
    debounce: Duration,
    generation: AtomicU64,
    state: Mutex<SearchState>,
}

impl Default for ProductSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductSearch {
    pub fn new() -> Self {
        Self::with_debounce(SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            debounce,
            generation: AtomicU64::new(0),
            state: Mutex::new(SearchState::default()),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    pub async fn search<G>(
        &self,
        gateway: &G,
        context: &CompanyContext,
        query: &str,
        cancel: &CancellationToken,
    ) -> SearchOutcome
    where
        G: RemoteProcedureGateway + ?Sized,
    {
        let generation = self.next_generation();
        let query = query.trim();

        if query.is_empty() {
            self.reset_results("");
            return SearchOutcome::Cleared;
        }
        let Ok((company_id, store_id)) = context.require_store() else {
            self.reset_results(query);
            return SearchOutcome::Cleared;
        };

        tokio::select! {
            _ = cancel.cancelled() => return SearchOutcome::TornDown,
            _ = tokio::time::sleep(self.debounce) => {}
        }
        if !self.is_latest(generation) {
            return SearchOutcome::Superseded;
        }

        let result = gateway
            .search_products(company_id, store_id, query, context.timezone())
            .await;

        if cancel.is_cancelled() {
            return SearchOutcome::TornDown;
        }
        if !self.is_latest(generation) {
            debug!("Dropping stale search response for '{}'", query);
            return SearchOutcome::Superseded;
        }

        match result {
            Ok(page) => {
                let count = page.products.len();
                let mut state = self.state.lock().unwrap();
                state.query = query.to_string();
                state.results = page.products;
                if let Some(currency) = page.currency {
                    state.currency = Some(currency);
                }
                SearchOutcome::Applied(count)
            }
            Err(err) => {
                warn!("Product search for '{}' failed: {}", query, err);
                self.reset_results(query);
                SearchOutcome::Failed(err)
            }
        }
    }

    /// Empty the results and invalidate any search still in flight.
    pub fn clear(&self) {
        self.next_generation();
        self.reset_results("");
    }

    fn reset_results(&self, query: &str) {
        let mut state = self.state.lock().unwrap();
        state.query = query.to_string();
        state.results.clear();
    }

    pub fn query(&self) -> String {
        self.state.lock().unwrap().query.clone()
    }

    pub fn results(&self) -> Vec<ProductSearchResult> {
        self.state.lock().unwrap().results.clone()
    }

    /// Currency reported by the last applied search, if any.
    pub fn currency(&self) -> Option<Currency> {
        self.state.lock().unwrap().currency.clone()
    }
}
