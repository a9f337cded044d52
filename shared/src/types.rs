//! Common types used across the platform

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The single owning location of a stock record.
///
/// A record is never simultaneously "at" a branch and a warehouse: when both
/// identifiers are present the warehouse wins. A record carrying neither
/// resolves to `Unknown` so it still aggregates under a stable key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LocationRef {
    Branch(Uuid),
    Warehouse(Uuid),
    Unknown,
}

impl LocationRef {
    /// Resolve a record's `(branch_id, warehouse_id)` pair to one location.
    ///
    /// This is the only place the precedence rule lives; every component
    /// that reads location goes through it so aggregation keys stay
    /// consistent.
    pub fn resolve(branch_id: Option<Uuid>, warehouse_id: Option<Uuid>) -> Self {
        match (warehouse_id, branch_id) {
            (Some(warehouse), _) => LocationRef::Warehouse(warehouse),
            (None, Some(branch)) => LocationRef::Branch(branch),
            (None, None) => LocationRef::Unknown,
        }
    }

    pub fn branch_id(&self) -> Option<Uuid> {
        match self {
            LocationRef::Branch(id) => Some(*id),
            _ => None,
        }
    }

    pub fn warehouse_id(&self) -> Option<Uuid> {
        match self {
            LocationRef::Warehouse(id) => Some(*id),
            _ => None,
        }
    }

    pub fn location_type(&self) -> LocationType {
        match self {
            LocationRef::Branch(_) => LocationType::Branch,
            LocationRef::Warehouse(_) => LocationType::Warehouse,
            LocationRef::Unknown => LocationType::Unknown,
        }
    }
}

/// Display tag for a resolved location
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Branch,
    Warehouse,
    Unknown,
}

/// The kind of endpoint a stock transfer moves between.
///
/// Unlike [`LocationRef`] there is no unknown variant: transfer requests
/// must name a concrete source and destination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Branch,
    Warehouse,
}

impl LocationKind {
    /// Build the concrete location for an id of this kind.
    pub fn at(&self, id: Uuid) -> LocationRef {
        match self {
            LocationKind::Branch => LocationRef::Branch(id),
            LocationKind::Warehouse => LocationRef::Warehouse(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warehouse_takes_precedence() {
        let branch = Uuid::new_v4();
        let warehouse = Uuid::new_v4();
        assert_eq!(
            LocationRef::resolve(Some(branch), Some(warehouse)),
            LocationRef::Warehouse(warehouse)
        );
    }

    #[test]
    fn test_branch_when_no_warehouse() {
        let branch = Uuid::new_v4();
        assert_eq!(
            LocationRef::resolve(Some(branch), None),
            LocationRef::Branch(branch)
        );
    }

    #[test]
    fn test_neither_is_unknown() {
        assert_eq!(LocationRef::resolve(None, None), LocationRef::Unknown);
        assert_eq!(LocationRef::Unknown.location_type(), LocationType::Unknown);
    }
}
