//! Duplicate resolution: several entries sharing one slot of a list.

use std::collections::BTreeSet;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::query;
use crate::error::Result;
use crate::model::{EntryHandle, ListId};
use crate::reposition::set_position;

/// Outcome of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub moved: usize,
    pub unresolved: Vec<EntryHandle>,
}

/// Keep the earliest-created entry of every shared slot; move each later one
/// to the first free slot after it. Entries with no free slot after them stay
/// put and are reported.
///
/// # Errors
///
/// Returns a store error.
pub fn resolve(conn: &Connection) -> Result<Resolution> {
    let mut resolution = Resolution::default();
    for list in lists_with_duplicates(conn)? {
        resolve_list(conn, list, &mut resolution)?;
    }
    if resolution.moved > 0 {
        tracing::info!(moved = resolution.moved, "resolved duplicate positions");
    }
    Ok(resolution)
}

fn lists_with_duplicates(conn: &Connection) -> Result<BTreeSet<ListId>> {
    let mut lists = BTreeSet::new();

    let mut stmt = conn.prepare(
        "SELECT sub_category_id
         FROM rank_items
         WHERE sub_category_id IS NOT NULL AND position IS NOT NULL
         GROUP BY sub_category_id, position
         HAVING COUNT(*) > 1",
    )?;
    for id in stmt.query_map([], |row| row.get::<_, i64>(0))? {
        lists.insert(ListId::Sub(id?));
    }

    let mut stmt = conn.prepare(
        "SELECT main_category_id
         FROM (
             SELECT main_category_id, position FROM rank_items
             WHERE main_category_id IS NOT NULL AND position IS NOT NULL
             UNION ALL
             SELECT main_category_id, position FROM rank_references
             WHERE position IS NOT NULL
         )
         GROUP BY main_category_id, position
         HAVING COUNT(*) > 1",
    )?;
    for id in stmt.query_map([], |row| row.get::<_, i64>(0))? {
        lists.insert(ListId::Main(id?));
    }

    Ok(lists)
}

fn resolve_list(conn: &Connection, list: ListId, resolution: &mut Resolution) -> Result<()> {
    let ranked = query::load_list(conn, list)?;
    let mut slots = ranked.slots();

    // Entries are ordered by (position, created_at, handle), so within a run
    // of equal positions the first one is the keeper.
    let mut previous: Option<i64> = None;
    for entry in &ranked.entries {
        let Some(position) = entry.position() else {
            continue;
        };
        if previous != Some(position) {
            previous = Some(position);
            continue;
        }

        let handle = entry.handle();
        match slots.first_free_after(position) {
            Some(free) => {
                set_position(conn, handle, Some(position), Some(free.as_i64()))?;
                slots.claim(free);
                resolution.moved += 1;
                tracing::debug!(%handle, %list, from = position, to = free.get(), "moved duplicate");
            }
            None => {
                tracing::warn!(%handle, %list, position, "no free slot after duplicate, left unresolved");
                resolution.unresolved.push(handle);
            }
        }
    }
    Ok(())
}
