//! Pharmacy sales
//!
//! A sale deducts stock by FEFO at the branch and records per-line batch
//! attribution in the persisted item list. Every line is pre-verified for
//! availability before any deduction starts so one short line cannot leave
//! the others partially applied.

use chrono::Utc;
use shared::{
    validate_item_name, validate_quantity, CreateSaleInput, LocationRef, PharmacySale, SaleLine,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::deduction::DeductionService;

/// Sale creation backed by FEFO deduction.
#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
    deduction: DeductionService,
}

impl SaleService {
    pub fn new(db: PgPool) -> Self {
        let deduction = DeductionService::new(db.clone());
        Self { db, deduction }
    }

    /// Create a pharmacy sale, consuming ledger batches in FEFO order.
    pub async fn create_sale(
        &self,
        created_by: Uuid,
        input: CreateSaleInput,
    ) -> AppResult<PharmacySale> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A sale needs at least one item".to_string(),
            });
        }
        for line in &input.items {
            validate_item_name(&line.medicine_name).map_err(|msg| AppError::Validation {
                field: "medicine_name".to_string(),
                message: msg.to_string(),
            })?;
            validate_quantity(line.quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
            })?;
        }

        let location = LocationRef::Branch(input.branch_id);

        // Pre-verification: every line must be coverable before any
        // deduction mutates the ledger.
        for line in &input.items {
            let available = self
                .deduction
                .available_at(line.medicine_name.trim(), location)
                .await?;
            if available < line.quantity {
                return Err(AppError::InsufficientStock(format!(
                    "Insufficient stock for {}. Total available at this branch: {}",
                    line.medicine_name.trim(),
                    available
                )));
            }
        }

        let mut items = Vec::with_capacity(input.items.len());
        for line in &input.items {
            let name = line.medicine_name.trim().to_string();
            let deductions = self
                .deduction
                .deduct(&name, line.quantity, location, None)
                .await?;

            // When a single batch covered the line, surface it directly
            // for display; multi-batch lines keep the detail in the
            // deduction list.
            let (batch_number, expiry_date) = match deductions.as_slice() {
                [only] => (Some(only.batch_number.clone()), only.expiry_date.clone()),
                _ => (None, None),
            };

            items.push(SaleLine {
                medicine_name: name,
                quantity: line.quantity,
                price: line.price,
                batch_number,
                expiry_date,
                deductions,
            });
        }

        let sale = PharmacySale {
            id: Uuid::new_v4(),
            branch_id: input.branch_id,
            patient_id: input.patient_id,
            patient_name: input.patient_name,
            items,
            total_amount: input.total_amount.round_dp(2),
            payment_mode: input.payment_mode,
            created_by,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO pharmacy_sales
                (id, branch_id, patient_id, patient_name, items, total_amount,
                 payment_mode, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(sale.id)
        .bind(sale.branch_id)
        .bind(sale.patient_id)
        .bind(&sale.patient_name)
        .bind(sqlx::types::Json(&sale.items))
        .bind(sale.total_amount)
        .bind(&sale.payment_mode)
        .bind(sale.created_by)
        .bind(sale.created_at)
        .execute(&self.db)
        .await?;

        tracing::info!(
            "Recorded pharmacy sale {} with {} lines at branch {}",
            sale.id,
            sale.items.len(),
            sale.branch_id
        );

        Ok(sale)
    }
}
