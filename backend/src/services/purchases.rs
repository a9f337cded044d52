//! Purchase receipt handling
//!
//! Marking a purchase received stamps its receipt date — which removes it
//! from the pending/incoming view — and folds every line into the ledger:
//! lines referencing an existing ledger row increment it, the rest create
//! fresh rows.

use chrono::Utc;
use shared::{coerce::coerce_non_empty, PendingReceiptItem, ReceiptResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, FromRow)]
struct PurchaseEntryRow {
    id: Uuid,
    supplier_id: Option<Uuid>,
    branch_id: Option<Uuid>,
    godown_id: Option<Uuid>,
    items: sqlx::types::Json<Vec<serde_json::Value>>,
    items_received_date: Option<String>,
}

/// Purchase receipt operations against the ledger.
#[derive(Clone)]
pub struct PurchaseService {
    db: PgPool,
}

impl PurchaseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stamp a purchase entry received and fold its lines into the ledger.
    pub async fn mark_items_received(
        &self,
        purchase_id: Uuid,
        received_date: &str,
    ) -> AppResult<ReceiptResult> {
        let row: PurchaseEntryRow = sqlx::query_as(
            r#"
            SELECT id, supplier_id, branch_id, godown_id, items, items_received_date
            FROM purchase_entries
            WHERE id = $1
            "#,
        )
        .bind(purchase_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase entry".to_string()))?;

        if row.items_received_date.is_some() {
            return Err(AppError::Validation {
                field: "purchase_id".to_string(),
                message: "Purchase entry is already marked received".to_string(),
            });
        }

        sqlx::query("UPDATE purchase_entries SET items_received_date = $1 WHERE id = $2")
            .bind(received_date)
            .bind(purchase_id)
            .execute(&self.db)
            .await?;

        let mut updated_rows = 0;
        let mut created_rows = 0;

        for line in &row.items.0 {
            let item = PendingReceiptItem::from_line(line, row.branch_id, row.godown_id);
            // Receipt lands the purchased quantity; free quantity only
            // counts toward the pending view.
            if item.quantity <= 0 {
                continue;
            }

            let linked_id = coerce_non_empty(line.get("medicine_id"))
                .and_then(|raw| Uuid::parse_str(&raw).ok());

            if let Some(medicine_id) = linked_id {
                sqlx::query(
                    "UPDATE medicines SET stock_quantity = stock_quantity + $1 WHERE id = $2",
                )
                .bind(item.quantity)
                .bind(medicine_id)
                .execute(&self.db)
                .await?;
                updated_rows += 1;
            } else {
                sqlx::query(
                    r#"
                    INSERT INTO medicines
                        (id, name, batch_number, mrp, unit_price, stock_quantity,
                         expiry_date, manufacturer, purpose, min_stock_level,
                         supplier_id, branch_id, godown_id, created_at)
                    VALUES ($1, $2, $3, $4, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(&item.name)
                .bind(&item.batch_number)
                .bind(item.price)
                .bind(item.quantity)
                .bind(&item.expiry_date)
                .bind(&item.manufacturer)
                .bind(&item.purpose)
                .bind(10_i64)
                .bind(row.supplier_id)
                .bind(row.branch_id)
                .bind(row.godown_id)
                .bind(Utc::now())
                .execute(&self.db)
                .await?;
                created_rows += 1;
            }
        }

        tracing::info!(
            "Purchase {} received: {} ledger rows updated, {} created",
            row.id,
            updated_rows,
            created_rows
        );

        Ok(ReceiptResult {
            purchase_id,
            received_date: received_date.to_string(),
            updated_rows,
            created_rows,
        })
    }
}
