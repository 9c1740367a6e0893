//! Dangling-reference sweep.

use rusqlite::Connection;

use crate::error::Result;

/// Delete references whose target item is missing or no longer sits in a
/// sub category.
///
/// # Errors
///
/// Returns a store error.
pub fn sweep(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM rank_references
         WHERE NOT EXISTS (
             SELECT 1 FROM rank_items i
             WHERE i.item_id = rank_references.item_id
               AND i.sub_category_id IS NOT NULL
         )",
        [],
    )?;
    if deleted > 0 {
        tracing::info!(deleted, "swept dangling references");
    }
    Ok(deleted)
}
