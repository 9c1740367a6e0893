//! Orphan sweep: items placed in neither a sub nor a main category.

use rusqlite::Connection;

use crate::error::Result;

/// Delete unplaced items. Any references to them go with them.
///
/// # Errors
///
/// Returns a store error.
pub fn sweep(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM rank_items WHERE sub_category_id IS NULL AND main_category_id IS NULL",
        [],
    )?;
    if deleted > 0 {
        tracing::info!(deleted, "swept orphan items");
    }
    Ok(deleted)
}
