//! Stock transfer models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::stock::BatchDeduction;
use crate::types::LocationKind;

/// Input for creating a stock transfer between two locations.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransferInput {
    pub transfer_date: String,
    pub from_type: LocationKind,
    pub from_id: Uuid,
    pub to_type: LocationKind,
    pub to_id: Uuid,
    pub items: Vec<TransferLineInput>,
    pub notes: Option<String>,
}

/// One requested transfer line. A batch number pins the deduction to that
/// batch; otherwise FEFO picks at the source.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferLineInput {
    pub item_name: String,
    pub batch_number: Option<String>,
    pub quantity: i64,
}

/// A persisted transfer line with the batch movements that actually
/// happened at the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferLine {
    pub item_name: String,
    pub batch_number: Option<String>,
    pub quantity: i64,
    pub actual_deductions: Vec<BatchDeduction>,
}

/// A completed stock transfer.
#[derive(Debug, Clone, Serialize)]
pub struct StockTransfer {
    pub id: Uuid,
    pub transfer_number: String,
    pub transfer_date: String,
    pub from_type: LocationKind,
    pub from_id: Uuid,
    pub to_type: LocationKind,
    pub to_id: Uuid,
    pub items: Vec<TransferLine>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
