//! Request handler definitions
//!
//! Define each route and its handler here. The handlers are thin: they unpack the request, call the
//! [`OrderFlowApi`] and turn the result into a response. Anything longer belongs in the engine.
//!
//! Handlers are generic over the store, cache and provider so that the routes can be exercised against test doubles.
//! Since actix cannot register generic handlers directly, each route is declared with the [`route!`] macro, which
//! generates a `...Route` service factory for it:
//!
//! ```nocompile
//!     route!(place_order => Post "/orders" impl PaymentStore, KeyValueCache, PaymentProvider);
//!     // registers `place_order::<B, C, P>` as `PlaceOrderRoute::<B, C, P>::new()`
//! ```
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use pine_labs_tools::RefundRequest;
use pinepay_engine::{
    order_objects::{PlaceOrderRequest, UpdateOrderPayload},
    KeyValueCache,
    OrderFlowApi,
    PaymentProvider,
    PaymentStore,
};
use serde_json::json;

use crate::{config::ServerConfig, errors::ServerError};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Orders  ----------------------------------------------------
route!(place_order => Post "/orders" impl PaymentStore, KeyValueCache, PaymentProvider);
/// Route handler for placing a new order.
///
/// The order is created with Pine Labs first and then recorded locally. The response carries the checkout token and
/// the URL of the hosted payment page that the customer should be redirected to.
pub async fn place_order<B, C, P>(
    body: web::Json<PlaceOrderRequest>,
    api: web::Data<OrderFlowApi<B, C, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore + 'static,
    C: KeyValueCache + 'static,
    P: PaymentProvider + 'static,
{
    let request = body.into_inner();
    debug!("💻️ POST new order for merchant reference {}", request.merchant_order_reference);
    let response = api.place_order(request).await.map_err(|e| {
        debug!("💻️ Could not place order. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(response))
}

route!(order_by_reference => Get "/orders/{reference_id}" impl PaymentStore, KeyValueCache, PaymentProvider);
pub async fn order_by_reference<B, C, P>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, C, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore + 'static,
    C: KeyValueCache + 'static,
    P: PaymentProvider + 'static,
{
    let reference_id = path.into_inner();
    debug!("💻️ GET order {reference_id}");
    let order = api
        .fetch_order(&reference_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No order exists with transaction reference {reference_id}")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order => Patch "/orders/{reference_id}" impl PaymentStore, KeyValueCache, PaymentProvider);
/// Route handler for changing the status of an order.
///
/// The body is `{"status": "success"}`, with one of `pending`, `success` or `failed`. An empty or missing status
/// leaves the order unchanged. Orders can only leave the `Pending` state, so any other change yields `409 Conflict`.
pub async fn update_order<B, C, P>(
    path: web::Path<String>,
    body: web::Json<UpdateOrderPayload>,
    api: web::Data<OrderFlowApi<B, C, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore + 'static,
    C: KeyValueCache + 'static,
    P: PaymentProvider + 'static,
{
    let reference_id = path.into_inner();
    let payload = body.into_inner();
    debug!("💻️ PATCH order {reference_id} with status {:?}", payload.status);
    let order = api.update_order(&reference_id, payload).await?;
    Ok(HttpResponse::Ok().json(order))
}

// ----------------------------------------------   Refunds  ---------------------------------------------------
route!(refund_order => Post "/orders/{order_id}/refund" impl PaymentStore, KeyValueCache, PaymentProvider);
/// Route handler for refunds. The provider's answer is passed straight through.
///
/// If `PPG_RECONCILE_AFTER_REFUND` is set, a successful refund also starts a reconciliation of the order, so that
/// the stored transaction picks up the refund. The response does not wait for it.
pub async fn refund_order<B, C, P>(
    path: web::Path<String>,
    body: web::Json<RefundRequest>,
    api: web::Data<OrderFlowApi<B, C, P>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore + 'static,
    C: KeyValueCache + 'static,
    P: PaymentProvider + 'static,
{
    let order_id = path.into_inner();
    let refund = body.into_inner();
    debug!("💻️ POST refund of {} for order {order_id}", refund.order_amount.value);
    let response = api.refund_order(&order_id, refund).await?;
    if config.reconcile_after_refund && api.reconcile(&order_id).is_none() {
        debug!("💻️ Reconciliation already in progress for order {order_id}. Not starting another after the refund.");
    }
    Ok(HttpResponse::Ok().json(response))
}

// ----------------------------------------------   Sync  ------------------------------------------------------
route!(sync_order => Post "/orders/{order_id}/sync" impl PaymentStore, KeyValueCache, PaymentProvider);
/// Route handler that re-syncs the stored transaction for an order with the provider.
///
/// The work happens in the background, so this always answers `202 Accepted` straight away. The body says whether a
/// new reconciliation was started, or whether one was already running for the order.
pub async fn sync_order<B, C, P>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, C, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentStore + 'static,
    C: KeyValueCache + 'static,
    P: PaymentProvider + 'static,
{
    let order_id = path.into_inner();
    debug!("💻️ POST sync for order {order_id}");
    let started = api.reconcile(&order_id).is_some();
    let message = if started { "Reconciliation started" } else { "Reconciliation already in progress" };
    Ok(HttpResponse::Accepted().json(json!({ "order_id": order_id, "started": started, "message": message })))
}
