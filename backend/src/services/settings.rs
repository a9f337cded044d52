//! Tenant settings lookup

use sqlx::PgPool;

/// Read-only access to the single tenant settings row.
#[derive(Clone)]
pub struct SettingsService {
    db: PgPool,
    default_expiry_alert_days: i64,
}

impl SettingsService {
    pub fn new(db: PgPool, default_expiry_alert_days: i64) -> Self {
        Self {
            db,
            default_expiry_alert_days,
        }
    }

    /// The expiry alert window in days. Falls back to the configured
    /// default when the settings row is absent, unset or unreadable.
    pub async fn expiry_alert_days(&self) -> i64 {
        let read = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT expiry_alert_days FROM settings LIMIT 1",
        )
        .fetch_optional(&self.db)
        .await;

        match read {
            Ok(Some(Some(days))) if days > 0 => days,
            Ok(_) => self.default_expiry_alert_days,
            Err(e) => {
                tracing::warn!("Settings lookup failed, using default alert window: {}", e);
                self.default_expiry_alert_days
            }
        }
    }
}
