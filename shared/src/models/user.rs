//! User roles for the permission clamp
//!
//! Session issuance lives in the external auth service; the backend only
//! validates tokens and reads these claims.

use serde::{Deserialize, Serialize};

/// Roles carried in the access token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Doctor,
    Receptionist,
    Pharmacist,
}

impl UserRole {
    /// Admins see every location; everyone else is clamped to their own
    /// branch before aggregation runs.
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}
