//! Tombstone garbage collection: deleted rows older than
//! `tombstoneMaxAgeDays` are dropped from local storage once the cursor has
//! long since moved past them, so they don't haunt the local database
//! forever just because the backend keeps them around for audit purposes.

use chrono::{DateTime, Utc};
use sync_capabilities::{CapabilityResult, LocalStore};
use sync_types::TableConfig;
use tracing::debug;

/// Removes local rows with `deleted == true` older than `max_age_days`.
/// Safe to run every cycle: a tombstone this old has already been pulled
/// and resolved, and the cursor will never ask for it again.
pub async fn gc_tombstones(
    local: &dyn LocalStore,
    tables: &[TableConfig],
    max_age_days: i64,
    now: DateTime<Utc>,
) -> CapabilityResult<usize> {
    let cutoff = now - chrono::Duration::days(max_age_days);
    let mut removed = 0;

    for table in tables {
        let rows = local.all(&table.name).await?;
        for row in rows {
            if row.deleted && row.updated_at < cutoff {
                local.delete(&table.name, &row.id).await?;
                removed += 1;
            }
        }
    }

    if removed > 0 {
        debug!(removed, "tombstone gc: removed aged-out rows");
    }
    Ok(removed)
}
