//! Stock transfers between locations
//!
//! A transfer deducts stock at the source by FEFO (or from a pinned batch)
//! and lands each deducted batch at the destination, incrementing an
//! existing ledger row or creating one. The persisted transfer carries the
//! per-item batch movements that actually happened.

use chrono::Utc;
use shared::{
    BatchDeduction, CreateTransferInput, LocationKind, StockTransfer, TransferLine,
    PURPOSE_FOR_SALE,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::deduction::DeductionService;

/// Transfer creation backed by FEFO deduction at the source.
#[derive(Clone)]
pub struct TransferService {
    db: PgPool,
    deduction: DeductionService,
}

impl TransferService {
    pub fn new(db: PgPool) -> Self {
        let deduction = DeductionService::new(db.clone());
        Self { db, deduction }
    }

    /// Create a stock transfer, moving batches from source to destination.
    pub async fn create_transfer(
        &self,
        created_by: Uuid,
        input: CreateTransferInput,
    ) -> AppResult<StockTransfer> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A transfer needs at least one item".to_string(),
            });
        }
        if input.from_type == input.to_type && input.from_id == input.to_id {
            return Err(AppError::Validation {
                field: "to_id".to_string(),
                message: "Source and destination must differ".to_string(),
            });
        }

        let transfer_number = generate_transfer_number();
        let source = input.from_type.at(input.from_id);

        let mut items = Vec::new();
        for line in &input.items {
            let name = line.item_name.trim().to_string();
            // Blank or zero-quantity lines are skipped, not rejected.
            if name.is_empty() || line.quantity <= 0 {
                continue;
            }
            let batch = line
                .batch_number
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty());

            let deductions = self
                .deduction
                .deduct(&name, line.quantity, source, batch)
                .await?;

            for deduction in &deductions {
                self.receive_batch(&input, &name, deduction).await?;
            }

            items.push(TransferLine {
                item_name: name,
                batch_number: batch.map(str::to_string),
                quantity: line.quantity,
                actual_deductions: deductions,
            });
        }

        let transfer = StockTransfer {
            id: Uuid::new_v4(),
            transfer_number,
            transfer_date: input.transfer_date,
            from_type: input.from_type,
            from_id: input.from_id,
            to_type: input.to_type,
            to_id: input.to_id,
            items,
            notes: input.notes,
            created_by,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO stock_transfers
                (id, transfer_number, transfer_date, from_type, from_id,
                 to_type, to_id, items, notes, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(transfer.id)
        .bind(&transfer.transfer_number)
        .bind(&transfer.transfer_date)
        .bind(kind_str(transfer.from_type))
        .bind(transfer.from_id)
        .bind(kind_str(transfer.to_type))
        .bind(transfer.to_id)
        .bind(sqlx::types::Json(&transfer.items))
        .bind(&transfer.notes)
        .bind(transfer.created_by)
        .bind(transfer.created_at)
        .execute(&self.db)
        .await?;

        tracing::info!(
            "Recorded stock transfer {} ({} lines)",
            transfer.transfer_number,
            transfer.items.len()
        );

        Ok(transfer)
    }

    /// Land one deducted batch at the destination: increment the matching
    /// ledger row or create a new one. A destination row missing its
    /// expiry inherits the source batch's.
    async fn receive_batch(
        &self,
        input: &CreateTransferInput,
        name: &str,
        deduction: &BatchDeduction,
    ) -> AppResult<()> {
        let (dest_branch, dest_warehouse) = match input.to_type {
            LocationKind::Branch => (Some(input.to_id), None),
            LocationKind::Warehouse => (None, Some(input.to_id)),
        };

        let existing: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM medicines
            WHERE name = $1 AND batch_number = $2 AND mrp = $3
              AND purpose = $4
              AND branch_id IS NOT DISTINCT FROM $5
              AND godown_id IS NOT DISTINCT FROM $6
            "#,
        )
        .bind(name)
        .bind(&deduction.batch_number)
        .bind(deduction.price)
        .bind(PURPOSE_FOR_SALE)
        .bind(dest_branch)
        .bind(dest_warehouse)
        .fetch_optional(&self.db)
        .await?;

        if let Some(dest_id) = existing {
            sqlx::query(
                r#"
                UPDATE medicines
                SET stock_quantity = stock_quantity + $1,
                    expiry_date = CASE
                        WHEN (expiry_date IS NULL OR expiry_date = '') THEN $2
                        ELSE expiry_date
                    END
                WHERE id = $3
                "#,
            )
            .bind(deduction.quantity)
            .bind(&deduction.expiry_date)
            .bind(dest_id)
            .execute(&self.db)
            .await?;
        } else {
            // Carry the manufacturer over from the source row.
            let manufacturer: Option<String> =
                sqlx::query_scalar("SELECT manufacturer FROM medicines WHERE id = $1")
                    .bind(deduction.ledger_id)
                    .fetch_optional(&self.db)
                    .await?
                    .flatten();

            sqlx::query(
                r#"
                INSERT INTO medicines
                    (id, name, batch_number, mrp, unit_price, stock_quantity,
                     expiry_date, manufacturer, purpose, min_stock_level,
                     branch_id, godown_id, created_at)
                VALUES ($1, $2, $3, $4, $4, $5, $6, $7, $8, 0, $9, $10, $11)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(&deduction.batch_number)
            .bind(deduction.price)
            .bind(deduction.quantity)
            .bind(&deduction.expiry_date)
            .bind(&manufacturer)
            .bind(PURPOSE_FOR_SALE)
            .bind(dest_branch)
            .bind(dest_warehouse)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;
        }

        Ok(())
    }
}

fn kind_str(kind: LocationKind) -> &'static str {
    match kind {
        LocationKind::Branch => "branch",
        LocationKind::Warehouse => "warehouse",
    }
}

/// Transfer numbers are date-prefixed with a derived suffix; sequential
/// numbering is owned by an external service.
fn generate_transfer_number() -> String {
    let today = Utc::now();
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "TRF{}-{}",
        today.format("%y%m%d"),
        &suffix[..8].to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_number_shape() {
        let number = generate_transfer_number();
        assert!(number.starts_with("TRF"));
        // TRF + yymmdd + '-' + 8 hex chars
        assert_eq!(number.len(), 3 + 6 + 1 + 8);
    }
}
