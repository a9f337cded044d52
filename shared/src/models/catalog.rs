//! Item master catalog models

use serde::{Deserialize, Serialize};

/// Lifecycle status of an item in the master catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ItemStatus {
    #[default]
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "INACTIVE")]
    Inactive,
}

/// Policy attributes for one item name, merged into every stock position.
///
/// The catalog is the policy source of truth; quantity always comes from
/// the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub item_status: ItemStatus,
    /// Minimum stock before the low-stock alert fires. An explicit
    /// low-stock threshold on the master record overrides the legacy
    /// min-stock-level field when both are set.
    pub min_stock_level: i64,
    pub low_stock_warning_enabled: bool,
    pub expiry_tracking_enabled: bool,
    pub unit: String,
    pub discontinued_reason: Option<String>,
}

impl Default for CatalogEntry {
    fn default() -> Self {
        Self {
            item_status: ItemStatus::Active,
            min_stock_level: 0,
            low_stock_warning_enabled: false,
            expiry_tracking_enabled: false,
            unit: String::new(),
            discontinued_reason: None,
        }
    }
}
