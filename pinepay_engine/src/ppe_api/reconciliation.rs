//! Re-syncs a stored transaction with the provider's record of the order.
//!
//! A reconciliation runs as a detached tokio task that owns its collaborators. It is never tied to the request that
//! triggered it, so it runs to completion even after that request has been answered or dropped. Each trigger results
//! in a single attempt: there are no retries, and failures are only reported through the log.
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use log::*;

use crate::{
    db_types::{Transaction, TransactionUpdate},
    ppe_api::{errors::OrderFlowError, token_cache::TokenCache},
    traits::{KeyValueCache, PaymentProvider, PaymentStore},
};

/// The provider order ids with a reconciliation in progress.
#[derive(Debug, Default, Clone)]
pub(crate) struct InFlight {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    /// Marks `order_id` as being reconciled. Returns `None` if it already is. The mark is cleared when the returned
    /// guard is dropped, including when the task holding it panics.
    pub fn claim(&self, order_id: &str) -> Option<InFlightGuard> {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        let order_id = order_id.to_string();
        ids.insert(order_id.clone()).then(|| InFlightGuard { ids: self.ids.clone(), order_id })
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.ids.lock().unwrap_or_else(|e| e.into_inner()).contains(order_id)
    }
}

pub(crate) struct InFlightGuard {
    ids: Arc<Mutex<HashSet<String>>>,
    order_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.ids.lock().unwrap_or_else(|e| e.into_inner()).remove(&self.order_id);
    }
}

pub(crate) struct ReconciliationJob<B, C, P> {
    pub db: Arc<B>,
    pub provider: Arc<P>,
    pub tokens: Arc<TokenCache<C, P>>,
    pub order_id: String,
}

impl<B, C, P> ReconciliationJob<B, C, P>
where
    B: PaymentStore,
    C: KeyValueCache,
    P: PaymentProvider,
{
    /// Runs the job and logs the outcome. Nothing is returned to whoever triggered it.
    pub async fn run(self) {
        let order_id = self.order_id.clone();
        info!("🩺️ Reconciling transaction for provider order {order_id}");
        match self.reconcile().await {
            Ok(tx) => info!(
                "🩺️ Transaction for provider order {order_id} reconciled. Provider status: {}. {} payment(s).",
                tx.status.as_deref().unwrap_or("unknown"),
                tx.payments.len()
            ),
            Err(OrderFlowError::PersistenceError { source, .. }) if source.is_not_found() => {
                error!("🩺️ Provider order {order_id} has no stored transaction. Nothing was reconciled.")
            },
            Err(e) => error!("🩺️ Reconciliation of provider order {order_id} failed. {e}"),
        }
    }

    async fn reconcile(&self) -> Result<Transaction, OrderFlowError> {
        let token = self.tokens.get_token().await?;
        let details = self.provider.get_order_details(&token, &self.order_id).await?;
        trace!("🩺️ Provider reports status {} for order {}", details.data.status, self.order_id);
        let update = TransactionUpdate::from(details.data);
        self.db.update_transaction_by_order_id(&self.order_id, update).await.map_err(|e| {
            OrderFlowError::persistence(format!("update the transaction for provider order {}", self.order_id), e)
        })
    }
}
