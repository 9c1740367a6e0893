//! Empty-category pruning.

use rusqlite::Connection;
use serde::Serialize;

use crate::error::Result;

/// Outcome of [`prune`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pruned {
    pub sub_categories: usize,
    pub main_categories: usize,
}

/// Delete sub categories without items, then main categories left with no
/// direct items, references, or sub categories.
///
/// # Errors
///
/// Returns a store error.
pub fn prune(conn: &Connection) -> Result<Pruned> {
    let sub_categories = conn.execute(
        "DELETE FROM sub_categories
         WHERE NOT EXISTS (
             SELECT 1 FROM rank_items i
             WHERE i.sub_category_id = sub_categories.sub_category_id
         )",
        [],
    )?;
    let main_categories = conn.execute(
        "DELETE FROM main_categories
         WHERE NOT EXISTS (
             SELECT 1 FROM rank_items i
             WHERE i.main_category_id = main_categories.main_category_id
         )
         AND NOT EXISTS (
             SELECT 1 FROM rank_references r
             WHERE r.main_category_id = main_categories.main_category_id
         )
         AND NOT EXISTS (
             SELECT 1 FROM sub_categories s
             WHERE s.main_category_id = main_categories.main_category_id
         )",
        [],
    )?;

    let pruned = Pruned {
        sub_categories,
        main_categories,
    };
    if sub_categories + main_categories > 0 {
        tracing::info!(sub_categories, main_categories, "pruned empty categories");
    }
    Ok(pruned)
}
