//! Consolidated stock models
//!
//! A stock position is a derived projection: it is recomputed on every
//! aggregation call from pending purchase receipts and the ledger, and is
//! never written back to the store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::catalog::ItemStatus;
use crate::types::{LocationRef, LocationType};

/// Identity of one aggregated stock position.
///
/// `batch` is `None` when batches are collapsed. `price` is rounded to two
/// decimal places before keying so floating-point noise cannot split
/// positions that belong together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StockKey {
    pub name: String,
    pub batch: Option<String>,
    pub price: Decimal,
    pub location: LocationRef,
}

impl StockKey {
    /// The grouping key used by FEFO reconciliation: same item, price and
    /// location regardless of batch.
    pub fn group(&self) -> (String, Decimal, LocationRef) {
        (self.name.clone(), self.price, self.location)
    }
}

/// One aggregated stock position (ephemeral, request-scoped).
#[derive(Debug, Clone, Serialize)]
pub struct StockPosition {
    pub id: Uuid,
    pub name: String,
    pub batch_number: String,
    pub price: Decimal,
    /// Signed during aggregation; reconciliation guarantees every retained
    /// position ends non-negative.
    pub stock_quantity: i64,
    pub expiry_date: Option<String>,
    pub manufacturer: Option<String>,
    pub unit: String,
    pub min_stock_level: i64,
    pub low_stock_warning_enabled: bool,
    pub expiry_tracking_enabled: bool,
    pub item_status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discontinued_reason: Option<String>,
    pub branch_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub location_type: LocationType,
    /// Ledger creation time of the earliest contributing row; FEFO
    /// tie-break for batches sharing an expiry date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Location filter for aggregation. Empty means unrestricted; a non-empty
/// filter matches records whose *resolved* location is in either id set
/// (OR semantics).
#[derive(Debug, Clone, Default)]
pub struct StockFilter {
    pub branch_ids: Vec<Uuid>,
    pub warehouse_ids: Vec<Uuid>,
}

impl StockFilter {
    pub fn branch(id: Uuid) -> Self {
        Self {
            branch_ids: vec![id],
            warehouse_ids: Vec::new(),
        }
    }

    pub fn warehouse(id: Uuid) -> Self {
        Self {
            branch_ids: Vec::new(),
            warehouse_ids: vec![id],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.branch_ids.is_empty() && self.warehouse_ids.is_empty()
    }

    /// Whether a resolved location passes the filter. Records that resolve
    /// to no known location never match a restricted filter.
    pub fn matches(&self, location: LocationRef) -> bool {
        if self.is_empty() {
            return true;
        }
        match location {
            LocationRef::Branch(id) => self.branch_ids.contains(&id),
            LocationRef::Warehouse(id) => self.warehouse_ids.contains(&id),
            LocationRef::Unknown => false,
        }
    }
}

/// One ledger batch consumed by a FEFO deduction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchDeduction {
    pub ledger_id: Uuid,
    pub batch_number: String,
    pub expiry_date: Option<String>,
    pub price: Decimal,
    pub quantity: i64,
}

/// Input for a direct (admin) ledger entry at a location.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectStockEntryInput {
    pub name: String,
    pub batch_number: String,
    pub price: Decimal,
    pub quantity: i64,
    pub expiry_date: Option<String>,
    pub manufacturer: Option<String>,
    /// Defaults to the sellable purpose when omitted.
    pub purpose: Option<String>,
    pub min_stock_level: Option<i64>,
    pub branch_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches_resolved_location_only() {
        let branch = Uuid::new_v4();
        let warehouse = Uuid::new_v4();
        let filter = StockFilter {
            branch_ids: vec![branch],
            warehouse_ids: vec![warehouse],
        };

        assert!(filter.matches(LocationRef::Branch(branch)));
        assert!(filter.matches(LocationRef::Warehouse(warehouse)));
        assert!(!filter.matches(LocationRef::Branch(Uuid::new_v4())));
        assert!(!filter.matches(LocationRef::Unknown));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = StockFilter::default();
        assert!(filter.matches(LocationRef::Unknown));
        assert!(filter.matches(LocationRef::Branch(Uuid::new_v4())));
    }
}
