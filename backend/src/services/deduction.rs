//! FEFO stock deduction
//!
//! Sales and transfers consume ledger batches in First-Expired-First-Out
//! order: earliest expiry first, batches with no recorded expiry last, ties
//! broken by ledger creation time. The availability check runs before any
//! mutation so a short request either fully applies or not at all. Each row
//! decrement is an independent update — there is no multi-row transaction,
//! which is an accepted best-effort trade-off.

use shared::{coerce::expiry_or_far_future, BatchDeduction, LocationRef, PURPOSE_FOR_SALE};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::stock::LedgerRow;

/// FEFO deduction against the inventory ledger.
#[derive(Clone)]
pub struct DeductionService {
    db: PgPool,
}

impl DeductionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Deduct `quantity` units of `item_name` at `location`, consuming
    /// batches in FEFO order. A `batch_number` pins the deduction to that
    /// batch. Returns one record per ledger row touched.
    pub async fn deduct(
        &self,
        item_name: &str,
        quantity: i64,
        location: LocationRef,
        batch_number: Option<&str>,
    ) -> AppResult<Vec<BatchDeduction>> {
        if quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Deduction quantity must be positive".to_string(),
            });
        }

        let mut rows = self.fetch_candidates(item_name, location, batch_number).await?;
        if rows.is_empty() {
            return Err(AppError::InsufficientStock(format!(
                "No stock available for {} at this location",
                item_name
            )));
        }

        fefo_sort(&mut rows);

        let plan = plan_deductions(&rows, quantity).map_err(|available| {
            AppError::InsufficientStock(format!(
                "Insufficient stock for {}. Requested: {}, Available: {}",
                item_name, quantity, available
            ))
        })?;

        for deduction in &plan {
            sqlx::query("UPDATE medicines SET stock_quantity = stock_quantity - $1 WHERE id = $2")
                .bind(deduction.quantity)
                .bind(deduction.ledger_id)
                .execute(&self.db)
                .await?;
        }

        Ok(plan)
    }

    /// Total sellable quantity of an item at a location, for sale
    /// pre-verification.
    pub async fn available_at(&self, item_name: &str, location: LocationRef) -> AppResult<i64> {
        let rows = self.fetch_candidates(item_name, location, None).await?;
        Ok(rows.iter().map(|r| r.stock_quantity.max(0)).sum())
    }

    async fn fetch_candidates(
        &self,
        item_name: &str,
        location: LocationRef,
        batch_number: Option<&str>,
    ) -> AppResult<Vec<LedgerRow>> {
        const BASE: &str = r#"
            SELECT id, name, batch_number, mrp, unit_price, stock_quantity,
                   expiry_date, manufacturer, purpose, min_stock_level,
                   branch_id, godown_id, created_at
            FROM medicines
            WHERE name = $1 AND stock_quantity > 0 AND purpose = $2
        "#;

        let (location_clause, location_id) = match location {
            LocationRef::Branch(id) => ("AND branch_id = $3", id),
            LocationRef::Warehouse(id) => ("AND godown_id = $3", id),
            LocationRef::Unknown => return Err(AppError::MissingLocation),
        };

        let rows: Vec<LedgerRow> = if let Some(batch) = batch_number {
            sqlx::query_as(&format!(
                "{} {} AND batch_number = $4",
                BASE, location_clause
            ))
            .bind(item_name)
            .bind(PURPOSE_FOR_SALE)
            .bind(location_id)
            .bind(batch)
            .fetch_all(&self.db)
            .await?
        } else {
            sqlx::query_as(&format!("{} {}", BASE, location_clause))
                .bind(item_name)
                .bind(PURPOSE_FOR_SALE)
                .bind(location_id)
                .fetch_all(&self.db)
                .await?
        };

        Ok(rows)
    }
}

/// Sort candidate rows into consumption order: expiry ascending with
/// missing expiry treated as furthest from expiring, then earliest created.
pub(crate) fn fefo_sort(rows: &mut [LedgerRow]) {
    rows.sort_by_key(|row| {
        (
            expiry_or_far_future(row.expiry_date.as_deref()),
            row.created_at,
        )
    });
}

/// Compute the per-batch consumption plan for `quantity` units.
///
/// All-or-nothing: returns `Err(total_available)` when the rows cannot
/// cover the request, leaving the ledger untouched.
pub(crate) fn plan_deductions(rows: &[LedgerRow], quantity: i64) -> Result<Vec<BatchDeduction>, i64> {
    let total_available: i64 = rows.iter().map(|r| r.stock_quantity.max(0)).sum();
    if total_available < quantity {
        return Err(total_available);
    }

    let mut remaining = quantity;
    let mut plan = Vec::new();
    for row in rows {
        if remaining <= 0 {
            break;
        }
        let available = row.stock_quantity.max(0);
        if available == 0 {
            continue;
        }
        let take = available.min(remaining);
        plan.push(BatchDeduction {
            ledger_id: row.id,
            batch_number: row
                .batch_number
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            expiry_date: row.expiry_date.clone(),
            price: row.price(),
            quantity: take,
        });
        remaining -= take;
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    fn row(batch: &str, quantity: i64, expiry: Option<&str>, age_days: i64) -> LedgerRow {
        LedgerRow {
            id: Uuid::new_v4(),
            name: "Amoxicillin".to_string(),
            batch_number: Some(batch.to_string()),
            mrp: Some(Decimal::new(1000, 2)),
            unit_price: None,
            stock_quantity: quantity,
            expiry_date: expiry.map(str::to_string),
            manufacturer: None,
            purpose: Some(PURPOSE_FOR_SALE.to_string()),
            min_stock_level: None,
            branch_id: Some(Uuid::new_v4()),
            warehouse_id: None,
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    fn batches(plan: &[BatchDeduction]) -> Vec<(&str, i64)> {
        plan.iter()
            .map(|d| (d.batch_number.as_str(), d.quantity))
            .collect()
    }

    #[test]
    fn test_earliest_expiry_consumed_first() {
        let mut rows = vec![
            row("LATE", 10, Some("2024-06-01"), 1),
            row("EARLY", 10, Some("2024-01-01"), 1),
        ];
        fefo_sort(&mut rows);

        let plan = plan_deductions(&rows, 4).unwrap();
        assert_eq!(batches(&plan), vec![("EARLY", 4)]);
    }

    #[test]
    fn test_missing_expiry_consumed_last() {
        let mut rows = vec![
            row("UNDATED", 5, None, 10),
            row("DATED", 5, Some("2025-01-01"), 1),
        ];
        fefo_sort(&mut rows);

        let plan = plan_deductions(&rows, 7).unwrap();
        assert_eq!(batches(&plan), vec![("DATED", 5), ("UNDATED", 2)]);
    }

    #[test]
    fn test_unparseable_expiry_treated_as_missing() {
        let mut rows = vec![
            row("GARBAGE", 5, Some("no idea"), 1),
            row("DATED", 5, Some("2025-01-01"), 1),
        ];
        fefo_sort(&mut rows);

        let plan = plan_deductions(&rows, 6).unwrap();
        assert_eq!(batches(&plan), vec![("DATED", 5), ("GARBAGE", 1)]);
    }

    #[test]
    fn test_created_at_breaks_expiry_ties() {
        let mut rows = vec![
            row("NEWER", 5, Some("2025-01-01"), 1),
            row("OLDER", 5, Some("2025-01-01"), 30),
        ];
        fefo_sort(&mut rows);

        let plan = plan_deductions(&rows, 6).unwrap();
        assert_eq!(batches(&plan), vec![("OLDER", 5), ("NEWER", 1)]);
    }

    #[test]
    fn test_all_or_nothing_when_insufficient() {
        let rows = vec![
            row("A", 3, Some("2024-01-01"), 1),
            row("B", 2, Some("2024-06-01"), 1),
        ];

        // 6 > 5 available: no partial plan.
        assert_eq!(plan_deductions(&rows, 6), Err(5));
    }

    #[test]
    fn test_walk_spans_multiple_batches_exactly() {
        let mut rows = vec![
            row("A", 5, Some("2024-02-01"), 1),
            row("B", 8, Some("2024-05-01"), 1),
        ];
        fefo_sort(&mut rows);

        let plan = plan_deductions(&rows, 7).unwrap();
        assert_eq!(batches(&plan), vec![("A", 5), ("B", 2)]);
        // B is left with 6 once the plan is applied.
        let consumed_from_b = plan.iter().find(|d| d.batch_number == "B").unwrap();
        assert_eq!(8 - consumed_from_b.quantity, 6);
    }

    #[test]
    fn test_exact_availability_is_satisfiable() {
        let rows = vec![row("A", 5, None, 1)];
        let plan = plan_deductions(&rows, 5).unwrap();
        assert_eq!(batches(&plan), vec![("A", 5)]);
    }
}
