//! Item master catalog lookup
//!
//! The catalog supplies policy attributes (status, minimum stock, alert
//! enablement, unit label) merged into every aggregated stock position.
//! It is loaded once per aggregation call and never written here.

use std::collections::HashMap;

use shared::{CatalogEntry, ItemStatus};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Debug, FromRow)]
struct ItemMasterRow {
    name: String,
    item_status: Option<String>,
    min_stock_level: Option<i64>,
    low_stock_threshold: Option<i64>,
    low_stock_warning_enabled: Option<bool>,
    expiry_tracking_enabled: Option<bool>,
    unit_id: Option<Uuid>,
    discontinued_reason: Option<String>,
}

#[derive(Debug, FromRow)]
struct UnitRow {
    id: Uuid,
    name: String,
}

/// In-memory snapshot of the item master keyed by trimmed item name.
///
/// Matching is by exact string equality after trimming; case is preserved
/// as-is, so two items differing only by case are distinct entries.
#[derive(Debug, Default)]
pub struct ItemCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl ItemCatalog {
    pub fn from_entries(entries: HashMap<String, CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Policy attributes for an item; missing items get the default entry
    /// (active, no thresholds, alerts disabled).
    pub fn lookup(&self, name: &str) -> CatalogEntry {
        self.entries.get(name.trim()).cloned().unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name.trim())
    }
}

/// Read-only access to the item master and unit collections.
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

impl CatalogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Load the full catalog with unit names resolved.
    pub async fn load(&self) -> AppResult<ItemCatalog> {
        let units: Vec<UnitRow> = sqlx::query_as("SELECT id, name FROM item_units")
            .fetch_all(&self.db)
            .await?;
        let unit_names: HashMap<Uuid, String> =
            units.into_iter().map(|u| (u.id, u.name)).collect();

        let rows: Vec<ItemMasterRow> = sqlx::query_as(
            r#"
            SELECT name, item_status, min_stock_level, low_stock_threshold,
                   low_stock_warning_enabled, expiry_tracking_enabled,
                   unit_id, discontinued_reason
            FROM item_master
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut entries = HashMap::new();
        for row in rows {
            let name = row.name.trim().to_string();
            if name.is_empty() {
                continue;
            }

            let item_status = match row.item_status.as_deref() {
                Some("INACTIVE") => ItemStatus::Inactive,
                _ => ItemStatus::Active,
            };
            // An explicit low-stock threshold overrides the legacy
            // min-stock-level field when both are set.
            let min_stock_level = row
                .low_stock_threshold
                .or(row.min_stock_level)
                .unwrap_or(0)
                .max(0);
            let unit = row
                .unit_id
                .and_then(|id| unit_names.get(&id).cloned())
                .unwrap_or_default();

            entries.insert(
                name,
                CatalogEntry {
                    item_status,
                    min_stock_level,
                    low_stock_warning_enabled: row.low_stock_warning_enabled.unwrap_or(false),
                    expiry_tracking_enabled: row.expiry_tracking_enabled.unwrap_or(false),
                    unit,
                    discontinued_reason: row.discontinued_reason,
                },
            );
        }

        Ok(ItemCatalog::from_entries(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(name: &str, entry: CatalogEntry) -> ItemCatalog {
        let mut entries = HashMap::new();
        entries.insert(name.to_string(), entry);
        ItemCatalog::from_entries(entries)
    }

    #[test]
    fn test_lookup_trims_the_query() {
        let catalog = catalog_with(
            "Amoxicillin",
            CatalogEntry {
                min_stock_level: 5,
                ..CatalogEntry::default()
            },
        );
        assert_eq!(catalog.lookup("  Amoxicillin  ").min_stock_level, 5);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let catalog = catalog_with(
            "Amoxicillin",
            CatalogEntry {
                min_stock_level: 5,
                ..CatalogEntry::default()
            },
        );
        // Case differences are distinct items; the lookup falls back to
        // the default entry.
        assert_eq!(catalog.lookup("amoxicillin").min_stock_level, 0);
    }

    #[test]
    fn test_missing_item_gets_defaults() {
        let catalog = ItemCatalog::default();
        let entry = catalog.lookup("Unknown Item");
        assert_eq!(entry.item_status, ItemStatus::Active);
        assert_eq!(entry.min_stock_level, 0);
        assert!(!entry.low_stock_warning_enabled);
        assert!(!entry.expiry_tracking_enabled);
        assert_eq!(entry.unit, "");
    }
}
