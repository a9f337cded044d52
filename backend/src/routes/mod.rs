//! Route definitions for the Clinic Stock Management Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - consolidated stock views and alerts
        .nest("/stock", stock_routes())
        // Protected routes - pharmacy sales
        .nest("/sales", sales_routes())
        // Protected routes - stock transfers
        .nest("/transfers", transfer_routes())
        // Protected routes - purchase receipts
        .nest("/purchases", purchase_routes())
}

/// Consolidated stock routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(handlers::get_stock_summary))
        .route("/batches", get(handlers::get_stock_batches))
        .route("/low", get(handlers::get_low_stock))
        .route("/low/summary", get(handlers::get_low_stock_summary))
        .route("/expiring", get(handlers::get_expiring_batches))
        .route("/entries", post(handlers::add_direct_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Pharmacy sale routes (protected)
fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_sale))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock transfer routes (protected)
fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_transfer))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Purchase receipt routes (protected)
fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/:purchase_id/receive", put(handlers::mark_items_received))
        .route_layer(middleware::from_fn(auth_middleware))
}
