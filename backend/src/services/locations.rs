//! Branch and warehouse name resolution
//!
//! Display-name lookups for the alert and stock views. These are
//! best-effort: a failed read degrades to an empty map so a broken lookup
//! collection cannot take down an advisory view.

use std::collections::HashMap;

use shared::Warehouse;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct BranchRow {
    id: Uuid,
    name: String,
}

#[derive(Debug, FromRow)]
struct WarehouseRow {
    id: Uuid,
    name: String,
    branch_id: Option<Uuid>,
}

/// Read-only access to the branches and warehouses collections.
#[derive(Clone)]
pub struct LocationService {
    db: PgPool,
}

impl LocationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Batched branch id -> name lookup.
    pub async fn branch_names(&self, ids: &[Uuid]) -> HashMap<Uuid, String> {
        if ids.is_empty() {
            return HashMap::new();
        }
        match sqlx::query_as::<_, BranchRow>("SELECT id, name FROM branches WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(&self.db)
            .await
        {
            Ok(rows) => rows.into_iter().map(|r| (r.id, r.name)).collect(),
            Err(e) => {
                tracing::warn!("Branch name lookup failed: {}", e);
                HashMap::new()
            }
        }
    }

    /// Batched warehouse lookup. Full records are returned so callers can
    /// propagate a warehouse's linked branch onto positions missing one.
    pub async fn warehouses(&self, ids: &[Uuid]) -> HashMap<Uuid, Warehouse> {
        if ids.is_empty() {
            return HashMap::new();
        }
        match sqlx::query_as::<_, WarehouseRow>(
            "SELECT id, name, branch_id FROM godowns WHERE id = ANY($1)",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.db)
        .await
        {
            Ok(rows) => rows
                .into_iter()
                .map(|r| {
                    (
                        r.id,
                        Warehouse {
                            id: r.id,
                            name: r.name,
                            branch_id: r.branch_id,
                        },
                    )
                })
                .collect(),
            Err(e) => {
                tracing::warn!("Warehouse lookup failed: {}", e);
                HashMap::new()
            }
        }
    }
}
