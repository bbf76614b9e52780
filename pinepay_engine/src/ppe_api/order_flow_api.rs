use std::{fmt::Debug, sync::Arc};

use log::*;
use pine_labs_tools::{OrderResponse, RefundRequest, RefundResponse};
use tokio::task::JoinHandle;

use crate::{
    db_types::{Order, OrderUpdate, Transaction},
    ppe_api::{
        errors::OrderFlowError,
        order_objects::{PlaceOrderRequest, UpdateOrderPayload},
        reconciliation::{InFlight, ReconciliationJob},
        status::validate_status_update,
        token_cache::TokenCache,
    },
    traits::{KeyValueCache, PaymentProvider, PaymentStore},
};

/// `OrderFlowApi` places orders with the payment provider, keeps the local order and transaction records in step
/// with it, and issues refunds.
///
/// | Operation                        | Provider calls           | Local writes                     |
/// |----------------------------------|--------------------------|----------------------------------|
/// | [`Self::place_order`]            | token, create order      | transaction, then order          |
/// | [`Self::update_order`]           | none                     | order status                     |
/// | [`Self::refund_order`]           | token, refund            | none                             |
/// | [`Self::reconcile`]              | token, order details     | transaction (in a detached task) |
///
/// The API is cheap to clone. Clones share the store, provider, token cache and the set of in-flight
/// reconciliations.
pub struct OrderFlowApi<B, C, P> {
    db: Arc<B>,
    provider: Arc<P>,
    tokens: Arc<TokenCache<C, P>>,
    in_flight: InFlight,
}

impl<B, C, P> Clone for OrderFlowApi<B, C, P> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            provider: Arc::clone(&self.provider),
            tokens: Arc::clone(&self.tokens),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<B, C, P> Debug for OrderFlowApi<B, C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, C, P> OrderFlowApi<B, C, P>
where
    C: KeyValueCache,
    P: PaymentProvider,
{
    pub fn new(db: B, cache: C, provider: P) -> Self {
        let provider = Arc::new(provider);
        let tokens = Arc::new(TokenCache::new(cache, Arc::clone(&provider)));
        Self { db: Arc::new(db), provider, tokens, in_flight: InFlight::default() }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn token_cache(&self) -> &TokenCache<C, P> {
        &self.tokens
    }
}

impl<B, C, P> OrderFlowApi<B, C, P>
where
    B: PaymentStore + 'static,
    C: KeyValueCache + 'static,
    P: PaymentProvider + 'static,
{
    /// Places a new order with the provider and records it locally.
    ///
    /// Each step only runs if the previous one succeeded:
    /// 1. Obtain an access token.
    /// 2. Create the order with the provider.
    /// 3. Reject the provider's answer if any of its fields is empty.
    /// 4. Store the [`Transaction`]. If this fails, no order is written.
    /// 5. Store a `Pending` [`Order`] that references the transaction by its provider order id.
    ///
    /// Steps 4 and 5 are not atomic. If step 5 fails, the transaction is left without an order. Such orphans are
    /// kept rather than rolled back, and can be listed with [`Self::find_orphaned_transactions`].
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<OrderResponse, OrderFlowError> {
        let reference = request.merchant_order_reference.clone();
        let token = self.tokens.get_token().await?;
        let payload = request.to_provider_request();
        let response = self.provider.create_order(&token, &payload).await.map_err(|e| {
            warn!("🔄️ The provider did not create an order for merchant reference {reference}. {e}");
            OrderFlowError::from(e)
        })?;
        check_order_response(&response).map_err(|e| {
            error!("🔄️ Unusable create-order response for merchant reference {reference}. Nothing was stored. {e}");
            e
        })?;
        let order_id = response.order_id.clone();
        debug!("🔄️ Provider order {order_id} created for merchant reference {reference}");
        let tx = request.to_new_transaction(&response);
        self.db.insert_transaction(tx).await.map_err(|e| {
            error!("🔄️ Could not store the transaction for provider order {order_id}. {e}");
            OrderFlowError::persistence(format!("store the transaction for provider order {order_id}"), e)
        })?;
        let order = request.to_new_order(&response);
        let order = self.db.insert_order(order).await.map_err(|e| {
            error!(
                "🔄️ Could not store the order for provider order {order_id}. Its transaction has been stored and is \
                 now an orphan. {e}"
            );
            OrderFlowError::persistence(format!("store the order for provider order {order_id}"), e)
        })?;
        info!("🔄️ Order #{} placed for merchant reference {reference}. Provider order {order_id}", order.id);
        Ok(response)
    }

    /// Changes the status of the order whose transaction reference is `reference_id`.
    ///
    /// `reference_id` must not be empty, and the requested status must pass [`validate_status_update`]. Whether the
    /// order may move to the new status is decided by the store, and a missing order is reported as such.
    pub async fn update_order(&self, reference_id: &str, payload: UpdateOrderPayload) -> Result<Order, OrderFlowError> {
        if reference_id.is_empty() {
            return Err(OrderFlowError::ValidationError("transaction reference ID is required".to_string()));
        }
        let status = validate_status_update(payload.status.as_deref().unwrap_or(""))?;
        let update = OrderUpdate { status };
        let order = self.db.update_order_by_reference(reference_id, update).await.map_err(|e| {
            debug!("🔄️ Order {reference_id} was not updated. {e}");
            OrderFlowError::persistence(format!("update order {reference_id}"), e)
        })?;
        info!("🔄️ Order {reference_id} is {}", order.status);
        Ok(order)
    }

    pub async fn fetch_order(&self, reference_id: &str) -> Result<Option<Order>, OrderFlowError> {
        self.db
            .fetch_order_by_reference(reference_id)
            .await
            .map_err(|e| OrderFlowError::persistence(format!("fetch order {reference_id}"), e))
    }

    /// Asks the provider to refund (part of) the order `order_id`. The provider's answer is returned as-is. No local
    /// records are changed; use [`Self::reconcile`] to pick up the new provider state.
    pub async fn refund_order(
        &self,
        order_id: &str,
        refund: RefundRequest,
    ) -> Result<RefundResponse, OrderFlowError> {
        if order_id.is_empty() {
            return Err(OrderFlowError::ValidationError("provider order ID is required".to_string()));
        }
        let token = self.tokens.get_token().await?;
        let response = self.provider.refund(&token, order_id, &refund).await.map_err(|e| {
            warn!("🔄️ Refund for provider order {order_id} failed. {e}");
            OrderFlowError::from(e)
        })?;
        info!("🔄️ Refund of {} requested for provider order {order_id}", refund.order_amount.value);
        Ok(response)
    }

    /// Starts a detached reconciliation of the transaction for `order_id` and returns its handle.
    ///
    /// The job is independent of the caller: dropping the handle, or the future that called this method, does not
    /// stop it. If a reconciliation for the same order is already running, no new job is started and `None` is
    /// returned.
    pub fn reconcile(&self, order_id: &str) -> Option<JoinHandle<()>> {
        if order_id.is_empty() {
            warn!("🩺️ Ignoring a reconciliation request without a provider order id");
            return None;
        }
        let Some(guard) = self.in_flight.claim(order_id) else {
            info!("🩺️ A reconciliation of provider order {order_id} is already running. Skipping this one.");
            return None;
        };
        let job = ReconciliationJob {
            db: Arc::clone(&self.db),
            provider: Arc::clone(&self.provider),
            tokens: Arc::clone(&self.tokens),
            order_id: order_id.to_string(),
        };
        let handle = tokio::spawn(async move {
            let _guard = guard;
            job.run().await;
        });
        Some(handle)
    }

    /// Transactions that have no order, i.e. placements that failed between the two local writes.
    pub async fn find_orphaned_transactions(&self) -> Result<Vec<Transaction>, OrderFlowError> {
        self.db
            .fetch_orphaned_transactions()
            .await
            .map_err(|e| OrderFlowError::persistence("fetch orphaned transactions", e))
    }
}

fn check_order_response(response: &OrderResponse) -> Result<(), OrderFlowError> {
    let missing = [
        ("order_id", response.order_id.is_empty()),
        ("token", response.token.is_empty()),
        ("redirect_url", response.redirect_url.is_empty()),
    ]
    .into_iter()
    .filter_map(|(field, empty)| empty.then_some(field))
    .collect::<Vec<_>>();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(OrderFlowError::DecodeError(format!("create-order response has empty fields: {}", missing.join(", "))))
    }
}
