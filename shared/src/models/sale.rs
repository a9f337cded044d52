//! Pharmacy sale models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::stock::BatchDeduction;

/// Input for creating a pharmacy sale.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleInput {
    pub branch_id: Uuid,
    pub patient_id: Option<Uuid>,
    pub patient_name: Option<String>,
    pub items: Vec<SaleLineInput>,
    pub total_amount: Decimal,
    pub payment_mode: Option<String>,
}

/// One requested sale line.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleLineInput {
    pub medicine_name: String,
    pub quantity: i64,
    pub price: Option<Decimal>,
}

/// A persisted sale line carrying the batches FEFO actually consumed.
///
/// When a single batch satisfied the line, `batch_number`/`expiry_date`
/// mirror that batch for display; multi-batch lines keep the detail in
/// `deductions` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub medicine_name: String,
    pub quantity: i64,
    pub price: Option<Decimal>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<String>,
    pub deductions: Vec<BatchDeduction>,
}

/// A completed pharmacy sale.
#[derive(Debug, Clone, Serialize)]
pub struct PharmacySale {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub patient_id: Option<Uuid>,
    pub patient_name: Option<String>,
    pub items: Vec<SaleLine>,
    pub total_amount: Decimal,
    pub payment_mode: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
