//! Validation helpers for stock operations.
//!
//! Pure checks shared by the services; HTTP handlers surface failures as
//! validation errors.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Validate an item name is usable as an aggregation/catalog key.
pub fn validate_item_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Item name must not be empty");
    }
    Ok(())
}

/// Validate a requested quantity for a sale, transfer or stock entry.
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a unit price / MRP value.
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Validate that a record names at least one owning location.
pub fn validate_location_pair(
    branch_id: Option<Uuid>,
    warehouse_id: Option<Uuid>,
) -> Result<(), &'static str> {
    if branch_id.is_none() && warehouse_id.is_none() {
        return Err("Either a branch or a warehouse is required");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_name_rejects_blank() {
        assert!(validate_item_name("Amoxicillin").is_ok());
        assert!(validate_item_name("   ").is_err());
        assert!(validate_item_name("").is_err());
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_price_cannot_be_negative() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(-1, 2)).is_err());
    }

    #[test]
    fn test_location_pair_requires_one() {
        assert!(validate_location_pair(None, None).is_err());
        assert!(validate_location_pair(Some(Uuid::new_v4()), None).is_ok());
        assert!(validate_location_pair(None, Some(Uuid::new_v4())).is_ok());
    }
}
