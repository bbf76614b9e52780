//! # Pine Labs payment gateway server
//! This module hosts the HTTP surface of the payment gateway. It is responsible for:
//! Accepting order placements and forwarding them to Pine Labs.
//! Recording status updates for stored orders.
//! Forwarding refunds and triggering background reconciliations with Pine Labs.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/orders`: Place a new order.
//! * `GET /api/orders/{reference_id}`: Fetch a stored order.
//! * `PATCH /api/orders/{reference_id}`: Change the status of a stored order.
//! * `POST /api/orders/{order_id}/refund`: Refund an order.
//! * `POST /api/orders/{order_id}/sync`: Re-sync the stored transaction with Pine Labs.

pub mod cli;
pub mod config;
pub mod errors;
pub mod orphan_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
