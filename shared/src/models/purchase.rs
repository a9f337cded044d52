//! Purchase entry models
//!
//! Purchase line items are stored as JSON documents; everything read out of
//! them goes through the [`crate::coerce`] helpers.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::coerce::{coerce_decimal, coerce_i64, coerce_non_empty, coerce_trimmed};
use crate::types::LocationRef;

/// The only purpose that counts toward sellable stock.
pub const PURPOSE_FOR_SALE: &str = "for_sale";

/// A purchase line awaiting physical receipt.
///
/// Contributes `quantity + free_quantity` to the incoming-stock view while
/// the parent purchase has no received date.
#[derive(Debug, Clone)]
pub struct PendingReceiptItem {
    pub name: String,
    pub batch_number: String,
    /// MRP rounded to two decimals at construction.
    pub price: Decimal,
    pub quantity: i64,
    pub free_quantity: i64,
    pub expiry_date: Option<String>,
    pub manufacturer: Option<String>,
    pub purpose: String,
    pub branch_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub location: LocationRef,
}

impl PendingReceiptItem {
    /// Decode one stored line item, taking the owning location from the
    /// parent purchase entry.
    pub fn from_line(line: &Value, branch_id: Option<Uuid>, warehouse_id: Option<Uuid>) -> Self {
        let purpose = coerce_non_empty(line.get("item_purpose"))
            .or_else(|| coerce_non_empty(line.get("purpose")))
            .unwrap_or_else(|| PURPOSE_FOR_SALE.to_string());

        Self {
            name: coerce_trimmed(line.get("medicine_name")),
            batch_number: coerce_trimmed(line.get("batch_number")),
            price: coerce_decimal(line.get("mrp")).round_dp(2),
            quantity: coerce_i64(line.get("quantity"), 0),
            free_quantity: coerce_i64(line.get("free_quantity"), 0),
            expiry_date: coerce_non_empty(line.get("expiry_date")),
            manufacturer: coerce_non_empty(line.get("manufacturer")),
            purpose,
            branch_id,
            warehouse_id,
            location: LocationRef::resolve(branch_id, warehouse_id),
        }
    }

    pub fn is_sellable(&self) -> bool {
        self.purpose == PURPOSE_FOR_SALE
    }

    /// Total units this line adds to incoming stock.
    pub fn incoming_quantity(&self) -> i64 {
        self.quantity + self.free_quantity
    }
}

/// Outcome of marking a purchase entry received.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptResult {
    pub purchase_id: Uuid,
    pub received_date: String,
    /// Ledger rows incremented (lines that referenced an existing row).
    pub updated_rows: usize,
    /// Ledger rows newly created for lines with no linked row.
    pub created_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_line_coerces_dirty_fields() {
        let line = json!({
            "medicine_name": "  Amoxicillin 500mg ",
            "batch_number": "B-01",
            "mrp": "12.499",
            "quantity": "10",
            "free_quantity": null,
            "expiry_date": "",
            "manufacturer": "Cipla",
        });
        let item = PendingReceiptItem::from_line(&line, None, None);

        assert_eq!(item.name, "Amoxicillin 500mg");
        assert_eq!(item.price, Decimal::new(1250, 2));
        assert_eq!(item.quantity, 10);
        assert_eq!(item.free_quantity, 0);
        assert_eq!(item.expiry_date, None);
        assert_eq!(item.manufacturer.as_deref(), Some("Cipla"));
        assert!(item.is_sellable());
        assert_eq!(item.incoming_quantity(), 10);
    }

    #[test]
    fn test_from_line_non_sale_purpose() {
        let line = json!({
            "medicine_name": "Gloves",
            "item_purpose": "clinic_use",
            "quantity": 5,
        });
        let item = PendingReceiptItem::from_line(&line, None, None);
        assert!(!item.is_sellable());
    }

    #[test]
    fn test_from_line_resolves_warehouse_over_branch() {
        let branch = Uuid::new_v4();
        let warehouse = Uuid::new_v4();
        let item =
            PendingReceiptItem::from_line(&json!({}), Some(branch), Some(warehouse));
        assert_eq!(item.location, LocationRef::Warehouse(warehouse));
    }
}
