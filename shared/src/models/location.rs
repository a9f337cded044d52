//! Branch and warehouse display models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A clinic branch (display projection; branch CRUD is owned elsewhere).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
}

/// A warehouse, optionally linked to the branch it supplies.
///
/// The link lets alert views show a branch for stock that physically sits
/// in a warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub branch_id: Option<Uuid>,
}
