//! Consolidated stock aggregation
//!
//! Physical stock is derived by merging two loosely-consistent sources:
//! purchase lines awaiting receipt and the flat per-batch inventory ledger.
//! The merged map is keyed by item, batch (unless collapsed), price and
//! resolved location, then repaired with a FEFO reallocation pass so the
//! per-batch view never shows impossible negative quantities.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    coerce::expiry_or_far_future, validate_location_pair, validate_price, validate_quantity,
    DirectStockEntryInput, LocationRef, PendingReceiptItem, StockFilter, StockKey, StockPosition,
    PURPOSE_FOR_SALE,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::catalog::{CatalogService, ItemCatalog};
use crate::middleware::AuthUser;

/// A row in the inventory ledger: the authoritative, mutable quantity
/// record. The table keeps the legacy `medicines`/`godown_id` names.
#[derive(Debug, Clone, FromRow)]
pub struct LedgerRow {
    pub id: Uuid,
    pub name: String,
    pub batch_number: Option<String>,
    pub mrp: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub stock_quantity: i64,
    /// Free-text legacy dates; parsed leniently wherever ordering matters.
    pub expiry_date: Option<String>,
    pub manufacturer: Option<String>,
    pub purpose: Option<String>,
    pub min_stock_level: Option<i64>,
    pub branch_id: Option<Uuid>,
    #[sqlx(rename = "godown_id")]
    pub warehouse_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl LedgerRow {
    pub fn location(&self) -> LocationRef {
        LocationRef::resolve(self.branch_id, self.warehouse_id)
    }

    /// Effective unit price: MRP, falling back to the sales price, rounded
    /// to two decimals for keying.
    pub fn price(&self) -> Decimal {
        self.mrp
            .or(self.unit_price)
            .unwrap_or(Decimal::ZERO)
            .round_dp(2)
    }

    /// Rows with no purpose recorded still count as sellable for the stock
    /// views; only an explicit other purpose excludes them.
    pub fn is_sellable(&self) -> bool {
        match self.purpose.as_deref() {
            None | Some("") => true,
            Some(p) => p == PURPOSE_FOR_SALE,
        }
    }

    fn trimmed_name(&self) -> String {
        self.name.trim().to_string()
    }

    fn trimmed_batch(&self) -> String {
        self.batch_number
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug, FromRow)]
struct PendingPurchaseRow {
    branch_id: Option<Uuid>,
    godown_id: Option<Uuid>,
    items: sqlx::types::Json<Vec<serde_json::Value>>,
}

/// Stock aggregation over pending receipts and the ledger.
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
    catalog: CatalogService,
}

impl StockService {
    pub fn new(db: PgPool) -> Self {
        let catalog = CatalogService::new(db.clone());
        Self { db, catalog }
    }

    /// Aggregate stock positions from pending purchase receipts and the
    /// ledger into a single keyed map.
    ///
    /// The view feeds advisory alerts, not transactional commits, so a
    /// transient read failure degrades to an empty map instead of
    /// propagating.
    pub async fn aggregate(
        &self,
        filter: &StockFilter,
        collapse_batches: bool,
        include_pending: bool,
    ) -> HashMap<StockKey, StockPosition> {
        match self
            .aggregate_inner(filter, collapse_batches, include_pending)
            .await
        {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("Stock aggregation failed, returning empty view: {}", e);
                HashMap::new()
            }
        }
    }

    async fn aggregate_inner(
        &self,
        filter: &StockFilter,
        collapse_batches: bool,
        include_pending: bool,
    ) -> AppResult<HashMap<StockKey, StockPosition>> {
        let catalog = self.catalog.load().await?;
        let pending = if include_pending {
            self.fetch_pending(filter).await?
        } else {
            Vec::new()
        };
        let ledger = self.fetch_ledger(filter).await?;

        Ok(consolidate(
            &pending,
            &ledger,
            &catalog,
            filter,
            collapse_batches,
        ))
    }

    /// Collapsed summary view, incoming stock included. Sorted by name then
    /// expiry for display.
    pub async fn summary_positions(&self, filter: &StockFilter) -> Vec<StockPosition> {
        let map = self.aggregate(filter, true, true).await;
        let mut list: Vec<StockPosition> = map.into_values().collect();
        list.sort_by(|a, b| {
            let left = (a.name.to_lowercase(), a.expiry_date.clone().unwrap_or_default());
            let right = (b.name.to_lowercase(), b.expiry_date.clone().unwrap_or_default());
            left.cmp(&right)
        });
        list
    }

    /// Batch-level reconciled view. Sorted by name then FEFO expiry order.
    pub async fn batch_positions(&self, filter: &StockFilter) -> Vec<StockPosition> {
        let map = self.aggregate(filter, false, true).await;
        let mut list: Vec<StockPosition> = map.into_values().collect();
        list.sort_by(|a, b| {
            let left = (
                a.name.to_lowercase(),
                expiry_or_far_future(a.expiry_date.as_deref()),
            );
            let right = (
                b.name.to_lowercase(),
                expiry_or_far_future(b.expiry_date.as_deref()),
            );
            left.cmp(&right)
        });
        list
    }

    /// Admin-only direct ledger entry at a branch or warehouse.
    pub async fn add_direct_stock(
        &self,
        user: &AuthUser,
        input: DirectStockEntryInput,
    ) -> AppResult<Uuid> {
        if !user.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can add direct stock".to_string(),
            ));
        }
        validate_location_pair(input.branch_id, input.warehouse_id)
            .map_err(|_| AppError::MissingLocation)?;
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Item name must not be empty".to_string(),
            });
        }
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;
        validate_price(input.price).map_err(|msg| AppError::Validation {
            field: "price".to_string(),
            message: msg.to_string(),
        })?;

        let id = Uuid::new_v4();
        let price = input.price.round_dp(2);
        let purpose = input
            .purpose
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| PURPOSE_FOR_SALE.to_string());

        sqlx::query(
            r#"
            INSERT INTO medicines
                (id, name, batch_number, mrp, unit_price, stock_quantity,
                 expiry_date, manufacturer, purpose, min_stock_level,
                 branch_id, godown_id, created_at)
            VALUES ($1, $2, $3, $4, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(input.batch_number.trim())
        .bind(price)
        .bind(input.quantity)
        .bind(&input.expiry_date)
        .bind(&input.manufacturer)
        .bind(&purpose)
        .bind(input.min_stock_level.unwrap_or(0).max(0))
        .bind(input.branch_id)
        .bind(input.warehouse_id)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        // Make sure the catalog knows the item so policy lookups resolve.
        let known: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM item_master WHERE name = $1")
                .bind(&name)
                .fetch_optional(&self.db)
                .await?;
        if known.is_none() {
            sqlx::query("INSERT INTO item_master (id, name) VALUES ($1, $2)")
                .bind(Uuid::new_v4())
                .bind(&name)
                .execute(&self.db)
                .await?;
        }

        Ok(id)
    }

    async fn fetch_pending(&self, filter: &StockFilter) -> AppResult<Vec<PendingReceiptItem>> {
        const BASE: &str = r#"
            SELECT branch_id, godown_id, items
            FROM purchase_entries
            WHERE items_received_date IS NULL
        "#;

        let rows: Vec<PendingPurchaseRow> = if filter.is_empty() {
            sqlx::query_as(BASE).fetch_all(&self.db).await?
        } else {
            // Location prefilter is a superset; exact matching on the
            // resolved location happens during consolidation.
            sqlx::query_as(&format!(
                "{} AND (branch_id = ANY($1) OR godown_id = ANY($2))",
                BASE
            ))
            .bind(filter.branch_ids.clone())
            .bind(filter.warehouse_ids.clone())
            .fetch_all(&self.db)
            .await?
        };

        let mut items = Vec::new();
        for row in rows {
            for line in &row.items.0 {
                items.push(PendingReceiptItem::from_line(
                    line,
                    row.branch_id,
                    row.godown_id,
                ));
            }
        }
        Ok(items)
    }

    async fn fetch_ledger(&self, filter: &StockFilter) -> AppResult<Vec<LedgerRow>> {
        const BASE: &str = r#"
            SELECT id, name, batch_number, mrp, unit_price, stock_quantity,
                   expiry_date, manufacturer, purpose, min_stock_level,
                   branch_id, godown_id, created_at
            FROM medicines
            WHERE (purpose = 'for_sale' OR purpose IS NULL OR purpose = '')
        "#;

        let rows: Vec<LedgerRow> = if filter.is_empty() {
            sqlx::query_as(BASE).fetch_all(&self.db).await?
        } else {
            sqlx::query_as(&format!(
                "{} AND (branch_id = ANY($1) OR godown_id = ANY($2))",
                BASE
            ))
            .bind(filter.branch_ids.clone())
            .bind(filter.warehouse_ids.clone())
            .fetch_all(&self.db)
            .await?
        };
        Ok(rows)
    }
}

/// Batch metadata remembered per case-folded `(name, batch)` pair: the
/// first non-empty expiry wins, later records missing one inherit it
/// instead of overwriting with blank.
#[derive(Debug, Clone)]
struct BatchMetadata {
    expiry_date: String,
    manufacturer: Option<String>,
}

fn metadata_key(name: &str, batch: &str) -> (String, String) {
    (name.to_lowercase(), batch.to_lowercase())
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Merge pending purchase lines and ledger rows into a keyed position map.
///
/// Pending lines contribute `quantity + free_quantity`; ledger rows
/// contribute their signed `stock_quantity`. Prices are already rounded to
/// two decimals so float noise cannot split keys. In batch mode the result
/// is FEFO-reconciled; in collapsed mode non-positive totals are dropped so
/// no caller ever observes negative stock.
pub(crate) fn consolidate(
    pending: &[PendingReceiptItem],
    ledger: &[LedgerRow],
    catalog: &ItemCatalog,
    filter: &StockFilter,
    collapse_batches: bool,
) -> HashMap<StockKey, StockPosition> {
    let mut metadata: HashMap<(String, String), BatchMetadata> = HashMap::new();

    // First pass: collect known batch metadata from both sources.
    for item in pending.iter().filter(|i| i.is_sellable()) {
        if let Some(expiry) = clean(&item.expiry_date) {
            metadata
                .entry(metadata_key(&item.name, &item.batch_number))
                .or_insert_with(|| BatchMetadata {
                    expiry_date: expiry,
                    manufacturer: item.manufacturer.clone(),
                });
        }
    }
    for row in ledger.iter().filter(|r| r.is_sellable()) {
        if let Some(expiry) = clean(&row.expiry_date) {
            metadata
                .entry(metadata_key(&row.trimmed_name(), &row.trimmed_batch()))
                .or_insert_with(|| BatchMetadata {
                    expiry_date: expiry,
                    manufacturer: clean(&row.manufacturer),
                });
        }
    }

    let mut positions: HashMap<StockKey, StockPosition> = HashMap::new();

    // Pending purchase lines: incoming stock not yet in the ledger.
    for item in pending {
        if !item.is_sellable() || !filter.matches(item.location) {
            continue;
        }
        let key = StockKey {
            name: item.name.clone(),
            batch: (!collapse_batches).then(|| item.batch_number.clone()),
            price: item.price,
            location: item.location,
        };
        let position = positions.entry(key).or_insert_with(|| {
            let entry = catalog.lookup(&item.name);
            let meta = metadata.get(&metadata_key(&item.name, &item.batch_number));
            StockPosition {
                id: Uuid::new_v4(),
                name: item.name.clone(),
                batch_number: item.batch_number.clone(),
                price: item.price,
                stock_quantity: 0,
                expiry_date: clean(&item.expiry_date)
                    .or_else(|| meta.map(|m| m.expiry_date.clone())),
                manufacturer: clean(&item.manufacturer)
                    .or_else(|| meta.and_then(|m| m.manufacturer.clone())),
                unit: entry.unit,
                min_stock_level: entry.min_stock_level,
                low_stock_warning_enabled: entry.low_stock_warning_enabled,
                expiry_tracking_enabled: entry.expiry_tracking_enabled,
                item_status: entry.item_status,
                discontinued_reason: entry.discontinued_reason,
                branch_id: item.branch_id,
                warehouse_id: item.warehouse_id,
                location_type: item.location.location_type(),
                created_at: None,
            }
        });
        position.stock_quantity += item.incoming_quantity();
    }

    // Ledger rows: the authoritative physical quantities.
    for row in ledger {
        if !row.is_sellable() {
            continue;
        }
        let location = row.location();
        if !filter.matches(location) {
            continue;
        }
        let name = row.trimmed_name();
        let batch = row.trimmed_batch();
        let key = StockKey {
            name: name.clone(),
            batch: (!collapse_batches).then(|| batch.clone()),
            price: row.price(),
            location,
        };
        let position = positions.entry(key).or_insert_with(|| {
            let entry = catalog.lookup(&name);
            let meta = metadata.get(&metadata_key(&name, &batch));
            // A row the master never heard of keeps its own minimum level.
            let min_stock_level = if catalog.contains(&name) {
                entry.min_stock_level
            } else {
                row.min_stock_level.unwrap_or(0).max(0)
            };
            StockPosition {
                id: row.id,
                name: name.clone(),
                batch_number: batch.clone(),
                price: row.price(),
                stock_quantity: 0,
                expiry_date: clean(&row.expiry_date)
                    .or_else(|| meta.map(|m| m.expiry_date.clone())),
                manufacturer: clean(&row.manufacturer)
                    .or_else(|| meta.and_then(|m| m.manufacturer.clone())),
                unit: entry.unit,
                min_stock_level,
                low_stock_warning_enabled: entry.low_stock_warning_enabled,
                expiry_tracking_enabled: entry.expiry_tracking_enabled,
                item_status: entry.item_status,
                discontinued_reason: entry.discontinued_reason,
                branch_id: row.branch_id,
                warehouse_id: row.warehouse_id,
                location_type: location.location_type(),
                created_at: None,
            }
        });
        position.stock_quantity += row.stock_quantity;
        // The earliest contributing ledger row supplies the FEFO tie-break.
        match position.created_at {
            Some(existing) if existing <= row.created_at => {}
            _ => position.created_at = Some(row.created_at),
        }
    }

    if collapse_batches {
        positions.retain(|_, p| p.stock_quantity > 0);
        positions
    } else {
        reconcile_fefo(positions)
    }
}

/// Repair negative batch rows by replaying the missing quantity against
/// the oldest-expiry batches of the same `(name, price, location)` group.
///
/// Sales deduct from the ledger by FEFO at transaction time, so a batch row
/// can be driven negative even though the item as a whole has stock. The
/// per-batch view redistributes those deficits in the same order real
/// deductions consume stock; quantity is conserved except for any residual
/// deficit left after every positive batch is exhausted.
pub(crate) fn reconcile_fefo(
    positions: HashMap<StockKey, StockPosition>,
) -> HashMap<StockKey, StockPosition> {
    #[derive(Default)]
    struct Group {
        deficit: i64,
        members: Vec<(StockKey, StockPosition)>,
    }

    let mut groups: HashMap<(String, Decimal, LocationRef), Group> = HashMap::new();
    for (key, mut position) in positions {
        let group = groups.entry(key.group()).or_default();
        if position.stock_quantity < 0 {
            group.deficit += -position.stock_quantity;
            position.stock_quantity = 0;
        }
        group.members.push((key, position));
    }

    let mut result = HashMap::new();
    for (_, mut group) in groups {
        group
            .members
            .sort_by(|(_, a), (_, b)| fefo_order(a).cmp(&fefo_order(b)));

        let mut deficit = group.deficit;
        for (key, mut position) in group.members {
            if deficit > 0 && position.stock_quantity > 0 {
                let take = position.stock_quantity.min(deficit);
                position.stock_quantity -= take;
                deficit -= take;
            }
            if position.stock_quantity > 0 {
                result.insert(key, position);
            }
        }
    }
    result
}

/// FEFO ordering: expiry ascending with missing or unparseable expiry
/// last, then earliest ledger creation.
fn fefo_order(position: &StockPosition) -> (NaiveDate, DateTime<Utc>) {
    (
        expiry_or_far_future(position.expiry_date.as_deref()),
        position.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC),
    )
}
