//! HTTP handlers for consolidated stock views and alerts

use axum::{extract::State, Json};
use axum_extra::extract::Query;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{
    DirectStockEntryInput, ExpiringBatch, LowStockAlert, LowStockSummary, StockFilter,
    StockPosition,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{AlertService, StockService};
use crate::AppState;

/// Location filter accepted by the stock view endpoints. Single ids and id
/// lists combine; a record matches when its resolved location is in either
/// set.
#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub branch_id: Option<Uuid>,
    #[serde(default)]
    pub branch_ids: Vec<Uuid>,
    pub warehouse_id: Option<Uuid>,
    #[serde(default)]
    pub warehouse_ids: Vec<Uuid>,
}

impl LocationQuery {
    fn into_filter(self) -> StockFilter {
        let mut filter = StockFilter {
            branch_ids: self.branch_ids,
            warehouse_ids: self.warehouse_ids,
        };
        if let Some(id) = self.branch_id {
            if !filter.branch_ids.contains(&id) {
                filter.branch_ids.push(id);
            }
        }
        if let Some(id) = self.warehouse_id {
            if !filter.warehouse_ids.contains(&id) {
                filter.warehouse_ids.push(id);
            }
        }
        filter
    }
}

/// Collapsed stock-on-hand summary, incoming stock included
pub async fn get_stock_summary(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<LocationQuery>,
) -> AppResult<Json<Vec<StockPosition>>> {
    let service = StockService::new(state.db);
    let positions = service.summary_positions(&query.into_filter()).await;
    Ok(Json(positions))
}

/// Per-batch reconciled stock view
pub async fn get_stock_batches(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<LocationQuery>,
) -> AppResult<Json<Vec<StockPosition>>> {
    let service = StockService::new(state.db);
    let positions = service.batch_positions(&query.into_filter()).await;
    Ok(Json(positions))
}

/// Low-stock alerts for the caller's visible locations
pub async fn get_low_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<LocationQuery>,
) -> AppResult<Json<Vec<LowStockAlert>>> {
    let default_days = state.config.stock.default_expiry_alert_days;
    let service = AlertService::new(state.db, default_days);
    let alerts = service
        .low_stock(&current_user.0, query.into_filter())
        .await?;
    Ok(Json(alerts))
}

/// Low-stock positions grouped by branch and warehouse
pub async fn get_low_stock_summary(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<LowStockSummary>> {
    let default_days = state.config.stock.default_expiry_alert_days;
    let service = AlertService::new(state.db, default_days);
    let summary = service.low_stock_summary(&current_user.0).await?;
    Ok(Json(summary))
}

/// Batches expiring inside the configured alert window
pub async fn get_expiring_batches(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<LocationQuery>,
) -> AppResult<Json<Vec<ExpiringBatch>>> {
    let default_days = state.config.stock.default_expiry_alert_days;
    let service = AlertService::new(state.db, default_days);
    let batches = service
        .expiring_soon(&current_user.0, query.into_filter())
        .await?;
    Ok(Json(batches))
}

/// Response for a direct stock entry
#[derive(Debug, Serialize)]
pub struct DirectStockResponse {
    pub message: String,
    pub ledger_id: Uuid,
}

/// Add a ledger row directly at a branch or warehouse (admin only)
pub async fn add_direct_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<DirectStockEntryInput>,
) -> AppResult<Json<DirectStockResponse>> {
    let service = StockService::new(state.db);
    let ledger_id = service.add_direct_stock(&current_user.0, input).await?;
    Ok(Json(DirectStockResponse {
        message: "Stock added successfully".to_string(),
        ledger_id,
    }))
}
