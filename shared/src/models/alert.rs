//! Low-stock and expiry alert models

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::types::LocationType;

/// A low-stock alert row with resolved location names for display.
#[derive(Debug, Clone, Serialize)]
pub struct LowStockAlert {
    pub name: String,
    pub stock_quantity: i64,
    pub min_stock_level: i64,
    pub unit: String,
    pub price: Decimal,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub warehouse_id: Option<Uuid>,
    pub warehouse_name: Option<String>,
    pub location_type: LocationType,
}

/// A batch expiring inside the configured alert window.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiringBatch {
    pub id: Uuid,
    pub name: String,
    pub batch_number: String,
    pub expiry_date: String,
    pub stock_quantity: i64,
    pub unit: String,
    pub branch_id: Option<Uuid>,
    pub branch_name: Option<String>,
    pub warehouse_id: Option<Uuid>,
    pub warehouse_name: Option<String>,
    pub location_type: LocationType,
}

/// Low-stock positions grouped by location for the summary report.
#[derive(Debug, Clone, Serialize)]
pub struct LowStockSummary {
    pub by_branch: Vec<BranchLowStock>,
    pub by_warehouse: Vec<WarehouseLowStock>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchLowStock {
    pub branch_id: Uuid,
    pub branch_name: String,
    pub items: Vec<LowStockLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarehouseLowStock {
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub items: Vec<LowStockLine>,
}

/// Compact per-item line inside a summary group.
#[derive(Debug, Clone, Serialize)]
pub struct LowStockLine {
    pub name: String,
    pub stock_quantity: i64,
    pub min_stock_level: i64,
    pub unit: String,
}
