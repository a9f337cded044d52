//! Low-stock and expiring-soon derivation
//!
//! Both derivers run over the consolidated stock view with the caller's
//! permission clamp applied to the location filter *before* aggregation,
//! so a restricted caller cannot infer other branches' stock from the
//! shape of an empty-vs-nonempty result.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate, Utc};
use shared::{
    coerce::parse_expiry, BranchLowStock, ExpiringBatch, ItemStatus, LocationType, LowStockAlert,
    LowStockLine, LowStockSummary, StockFilter, StockPosition, Warehouse, WarehouseLowStock,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::services::locations::LocationService;
use crate::services::settings::SettingsService;
use crate::services::stock::StockService;

/// Low-stock and expiry alert views over the consolidated stock map.
#[derive(Clone)]
pub struct AlertService {
    stock: StockService,
    locations: LocationService,
    settings: SettingsService,
}

impl AlertService {
    pub fn new(db: PgPool, default_expiry_alert_days: i64) -> Self {
        Self {
            stock: StockService::new(db.clone()),
            locations: LocationService::new(db.clone()),
            settings: SettingsService::new(db, default_expiry_alert_days),
        }
    }

    /// Low-stock alert rows (collapsed view, pending receipts excluded).
    pub async fn low_stock(
        &self,
        user: &AuthUser,
        requested: StockFilter,
    ) -> AppResult<Vec<LowStockAlert>> {
        let Some(filter) = clamp_filter(user, requested) else {
            return Ok(Vec::new());
        };

        let positions = self.stock.aggregate(&filter, true, false).await;
        let hits: Vec<StockPosition> = positions.into_values().filter(|p| is_low_stock(p)).collect();
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let (branch_names, warehouses) = self.resolve_names(&hits).await;

        let mut alerts = Vec::new();
        for position in hits {
            let warehouse = position.warehouse_id.and_then(|id| warehouses.get(&id));
            // A warehouse's linked branch stands in when the record itself
            // carries none.
            let branch_id = position
                .branch_id
                .or_else(|| warehouse.and_then(|w| w.branch_id));
            alerts.push(LowStockAlert {
                name: position.name,
                stock_quantity: position.stock_quantity,
                min_stock_level: position.min_stock_level,
                unit: position.unit,
                price: position.price,
                branch_id,
                branch_name: branch_id.and_then(|id| branch_names.get(&id).cloned()),
                warehouse_id: position.warehouse_id,
                warehouse_name: warehouse.map(|w| w.name.clone()),
                location_type: position.location_type,
            });
        }
        Ok(alerts)
    }

    /// Batches expiring inside the tenant's alert window (batch-level view,
    /// pending receipts excluded).
    pub async fn expiring_soon(
        &self,
        user: &AuthUser,
        requested: StockFilter,
    ) -> AppResult<Vec<ExpiringBatch>> {
        let Some(filter) = clamp_filter(user, requested) else {
            return Ok(Vec::new());
        };

        let alert_days = self.settings.expiry_alert_days().await;
        let today = Utc::now().date_naive();

        let positions = self.stock.aggregate(&filter, false, false).await;
        let hits: Vec<StockPosition> = positions
            .into_values()
            .filter(|p| expires_within(p, today, alert_days))
            .collect();
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let (branch_names, warehouses) = self.resolve_names(&hits).await;

        let mut batches = Vec::new();
        for position in hits {
            let warehouse = position.warehouse_id.and_then(|id| warehouses.get(&id));
            let branch_id = position
                .branch_id
                .or_else(|| warehouse.and_then(|w| w.branch_id));
            batches.push(ExpiringBatch {
                id: position.id,
                name: position.name,
                batch_number: position.batch_number,
                expiry_date: position.expiry_date.unwrap_or_default(),
                stock_quantity: position.stock_quantity,
                unit: position.unit,
                branch_id,
                branch_name: branch_id.and_then(|id| branch_names.get(&id).cloned()),
                warehouse_id: position.warehouse_id,
                warehouse_name: warehouse.map(|w| w.name.clone()),
                location_type: position.location_type,
            });
        }

        batches.sort_by(|a, b| {
            let left = (
                a.expiry_date.clone(),
                a.branch_name.clone().unwrap_or_default(),
                a.name.clone(),
            );
            let right = (
                b.expiry_date.clone(),
                b.branch_name.clone().unwrap_or_default(),
                b.name.clone(),
            );
            left.cmp(&right)
        });
        Ok(batches)
    }

    /// Low-stock positions grouped by location for the dashboard summary.
    pub async fn low_stock_summary(&self, user: &AuthUser) -> AppResult<LowStockSummary> {
        let Some(filter) = clamp_filter(user, StockFilter::default()) else {
            return Ok(LowStockSummary {
                by_branch: Vec::new(),
                by_warehouse: Vec::new(),
            });
        };

        let positions = self.stock.aggregate(&filter, true, false).await;
        let hits: Vec<StockPosition> = positions.into_values().filter(|p| is_low_stock(p)).collect();
        let (branch_names, warehouses) = self.resolve_names(&hits).await;

        let mut branch_groups: HashMap<Uuid, BranchLowStock> = HashMap::new();
        let mut warehouse_groups: HashMap<Uuid, WarehouseLowStock> = HashMap::new();

        for position in hits {
            let line = LowStockLine {
                name: position.name.clone(),
                stock_quantity: position.stock_quantity,
                min_stock_level: position.min_stock_level,
                unit: position.unit.clone(),
            };
            match position.location_type {
                LocationType::Branch => {
                    if let Some(id) = position.branch_id {
                        branch_groups
                            .entry(id)
                            .or_insert_with(|| BranchLowStock {
                                branch_id: id,
                                branch_name: branch_names
                                    .get(&id)
                                    .cloned()
                                    .unwrap_or_else(|| "Unknown Branch".to_string()),
                                items: Vec::new(),
                            })
                            .items
                            .push(line);
                    }
                }
                LocationType::Warehouse => {
                    if let Some(id) = position.warehouse_id {
                        warehouse_groups
                            .entry(id)
                            .or_insert_with(|| WarehouseLowStock {
                                warehouse_id: id,
                                warehouse_name: warehouses
                                    .get(&id)
                                    .map(|w| w.name.clone())
                                    .unwrap_or_else(|| "Unknown Warehouse".to_string()),
                                items: Vec::new(),
                            })
                            .items
                            .push(line);
                    }
                }
                LocationType::Unknown => {}
            }
        }

        let mut by_branch: Vec<BranchLowStock> = branch_groups.into_values().collect();
        by_branch.sort_by(|a, b| a.branch_name.cmp(&b.branch_name));
        let mut by_warehouse: Vec<WarehouseLowStock> = warehouse_groups.into_values().collect();
        by_warehouse.sort_by(|a, b| a.warehouse_name.cmp(&b.warehouse_name));

        Ok(LowStockSummary {
            by_branch,
            by_warehouse,
        })
    }

    /// Batched display-name resolution, including branches reachable only
    /// through a warehouse link.
    async fn resolve_names(
        &self,
        positions: &[StockPosition],
    ) -> (HashMap<Uuid, String>, HashMap<Uuid, Warehouse>) {
        let warehouse_ids: Vec<Uuid> = positions
            .iter()
            .filter_map(|p| p.warehouse_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let warehouses = self.locations.warehouses(&warehouse_ids).await;

        let mut branch_ids: HashSet<Uuid> = positions.iter().filter_map(|p| p.branch_id).collect();
        for warehouse in warehouses.values() {
            if let Some(branch) = warehouse.branch_id {
                branch_ids.insert(branch);
            }
        }
        let branch_ids: Vec<Uuid> = branch_ids.into_iter().collect();
        let branch_names = self.locations.branch_names(&branch_ids).await;

        (branch_names, warehouses)
    }
}

/// Clamp a requested location filter to what the caller may see.
///
/// Admins pass through unchanged. Everyone else is restricted to their own
/// branch: no requested locations default to it, a request including it
/// narrows to it, and a request for only other locations yields `None`
/// (an empty view). Warehouse filters are honored for admins only.
pub(crate) fn clamp_filter(user: &AuthUser, requested: StockFilter) -> Option<StockFilter> {
    if user.is_admin() {
        return Some(requested);
    }
    let own = user.branch_id?;
    if requested.branch_ids.is_empty() || requested.branch_ids.contains(&own) {
        Some(StockFilter::branch(own))
    } else {
        None
    }
}

/// Low-stock predicate: active items with warnings enabled, a positive
/// minimum level and quantity at or under it. The boundary is inclusive;
/// a zero minimum never alerts.
pub(crate) fn is_low_stock(position: &StockPosition) -> bool {
    position.item_status != ItemStatus::Inactive
        && position.low_stock_warning_enabled
        && position.min_stock_level > 0
        && position.stock_quantity > 0
        && position.stock_quantity <= position.min_stock_level
}

/// Expiring-soon predicate: tracked, in stock, and expiring between today
/// and the end of the alert window, both ends inclusive. Unparseable dates
/// never alert.
pub(crate) fn expires_within(position: &StockPosition, today: NaiveDate, alert_days: i64) -> bool {
    if position.item_status == ItemStatus::Inactive {
        return false;
    }
    if !position.expiry_tracking_enabled {
        return false;
    }
    if position.stock_quantity <= 0 {
        return false;
    }
    let Some(expiry) = position.expiry_date.as_deref().and_then(parse_expiry) else {
        return false;
    };
    let window_end = today + Duration::days(alert_days);
    today <= expiry && expiry <= window_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{LocationRef, UserRole};

    fn position(quantity: i64, min_level: i64, warning: bool) -> StockPosition {
        StockPosition {
            id: Uuid::new_v4(),
            name: "Amoxicillin".to_string(),
            batch_number: String::new(),
            price: rust_decimal::Decimal::new(1000, 2),
            stock_quantity: quantity,
            expiry_date: None,
            manufacturer: None,
            unit: "strip".to_string(),
            min_stock_level: min_level,
            low_stock_warning_enabled: warning,
            expiry_tracking_enabled: false,
            item_status: ItemStatus::Active,
            discontinued_reason: None,
            branch_id: Some(Uuid::new_v4()),
            warehouse_id: None,
            location_type: LocationType::Branch,
            created_at: None,
        }
    }

    fn tracked_position(quantity: i64, expiry: Option<&str>) -> StockPosition {
        let mut p = position(quantity, 0, false);
        p.expiry_tracking_enabled = true;
        p.expiry_date = expiry.map(str::to_string);
        p
    }

    fn admin() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: UserRole::Admin,
            branch_id: None,
        }
    }

    fn staff(branch_id: Option<Uuid>) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: UserRole::Pharmacist,
            branch_id,
        }
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_low_stock_boundary_is_inclusive() {
        // qty == min is included.
        assert!(is_low_stock(&position(10, 10, true)));
        assert!(is_low_stock(&position(1, 10, true)));
        assert!(!is_low_stock(&position(11, 10, true)));
    }

    #[test]
    fn test_zero_min_level_never_alerts() {
        assert!(!is_low_stock(&position(0, 0, true)));
        assert!(!is_low_stock(&position(5, 0, true)));
    }

    #[test]
    fn test_low_stock_requires_warning_enabled() {
        assert!(!is_low_stock(&position(5, 10, false)));
    }

    #[test]
    fn test_inactive_items_never_alert() {
        let mut p = position(5, 10, true);
        p.item_status = ItemStatus::Inactive;
        assert!(!is_low_stock(&p));
    }

    #[test]
    fn test_expiry_window_boundaries_inclusive() {
        let today = day("2023-01-01");
        // 90 days after 2023-01-01 is 2023-04-01: included.
        assert!(expires_within(
            &tracked_position(5, Some("2023-04-01")),
            today,
            90
        ));
        // One day past the window: excluded.
        assert!(!expires_within(
            &tracked_position(5, Some("2023-04-02")),
            today,
            90
        ));
        // Expiring today: included.
        assert!(expires_within(
            &tracked_position(5, Some("2023-01-01")),
            today,
            90
        ));
        // Already expired: excluded.
        assert!(!expires_within(
            &tracked_position(5, Some("2022-12-31")),
            today,
            90
        ));
    }

    #[test]
    fn test_expiry_requires_tracking_and_stock() {
        let today = day("2023-01-01");
        let mut untracked = tracked_position(5, Some("2023-02-01"));
        untracked.expiry_tracking_enabled = false;
        assert!(!expires_within(&untracked, today, 90));

        assert!(!expires_within(
            &tracked_position(0, Some("2023-02-01")),
            today,
            90
        ));
    }

    #[test]
    fn test_unparseable_expiry_never_alerts() {
        let today = day("2023-01-01");
        assert!(!expires_within(&tracked_position(5, Some("soon")), today, 90));
        assert!(!expires_within(&tracked_position(5, None), today, 90));
    }

    #[test]
    fn test_clamp_admin_passes_through() {
        let warehouse = Uuid::new_v4();
        let clamped = clamp_filter(&admin(), StockFilter::warehouse(warehouse)).unwrap();
        assert_eq!(clamped.warehouse_ids, vec![warehouse]);
    }

    #[test]
    fn test_clamp_staff_defaults_to_own_branch() {
        let own = Uuid::new_v4();
        let clamped = clamp_filter(&staff(Some(own)), StockFilter::default()).unwrap();
        assert_eq!(clamped.branch_ids, vec![own]);
        assert!(clamped.warehouse_ids.is_empty());
    }

    #[test]
    fn test_clamp_staff_drops_warehouse_scope() {
        let own = Uuid::new_v4();
        let clamped =
            clamp_filter(&staff(Some(own)), StockFilter::warehouse(Uuid::new_v4())).unwrap();
        assert_eq!(clamped.branch_ids, vec![own]);
        assert!(clamped.warehouse_ids.is_empty());
    }

    #[test]
    fn test_clamp_staff_foreign_branch_sees_nothing() {
        let own = Uuid::new_v4();
        assert!(clamp_filter(&staff(Some(own)), StockFilter::branch(Uuid::new_v4())).is_none());
    }

    #[test]
    fn test_clamp_staff_without_branch_sees_nothing() {
        assert!(clamp_filter(&staff(None), StockFilter::default()).is_none());
    }
}
