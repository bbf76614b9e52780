use std::time::Duration;

use actix_web::{
    dev::Server,
    error::JsonPayloadError,
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpRequest,
    HttpServer,
    Scope,
};
use log::*;
use pine_labs_tools::PineLabsApi;
use pinepay_engine::{KeyValueCache, MemoryCache, OrderFlowApi, PaymentProvider, PaymentStore, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    orphan_worker::start_orphan_worker,
    routes::{
        health,
        OrderByReferenceRoute,
        PlaceOrderRoute,
        RefundOrderRoute,
        SyncOrderRoute,
        UpdateOrderRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let provider =
        PineLabsApi::new(config.pine_labs.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let api = OrderFlowApi::new(db, MemoryCache::new(), provider);
    match config.orphan_sweep_interval {
        Some(interval) => {
            let _ = start_orphan_worker(api.clone(), interval);
        },
        None => info!("🧹️ The orphaned transaction sweep is disabled"),
    }
    let srv = create_server_instance(config, api)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance<B, C, P>(config: ServerConfig, api: OrderFlowApi<B, C, P>) -> Result<Server, ServerError>
where
    B: PaymentStore + 'static,
    C: KeyValueCache + 'static,
    P: PaymentProvider + 'static,
{
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ppg::access_log"))
            .app_data(web::Data::new(api.clone()))
            .app_data(web::Data::new(config.clone()))
            .service(health)
            .service(api_scope::<B, C, P>())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// All the `/api` routes. The caller supplies the [`OrderFlowApi`] and [`ServerConfig`] as app data.
pub fn api_scope<B, C, P>() -> Scope
where
    B: PaymentStore + 'static,
    C: KeyValueCache + 'static,
    P: PaymentProvider + 'static,
{
    web::scope("/api")
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(PlaceOrderRoute::<B, C, P>::new())
        .service(OrderByReferenceRoute::<B, C, P>::new())
        .service(UpdateOrderRoute::<B, C, P>::new())
        .service(RefundOrderRoute::<B, C, P>::new())
        .service(SyncOrderRoute::<B, C, P>::new())
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejected request body for {}. {err}", req.path());
    ServerError::InvalidRequestBody(err.to_string()).into()
}
