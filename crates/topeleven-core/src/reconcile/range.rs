//! Range clamp: entries whose stored position falls outside `1..=11`.

use rusqlite::Connection;

use crate::alloc;
use crate::db::query;
use crate::error::Result;
use crate::model::{EntryHandle, ListId, Placement};
use crate::reposition::set_position;

struct Drifted {
    handle: EntryHandle,
    list: ListId,
    position: i64,
}

/// Reassign every out-of-range item and reference to the lowest free slot of
/// its own list, or to the last slot when the list is full.
///
/// A last-slot assignment on a full list creates a duplicate that the
/// duplicate pass then reports as unresolved.
///
/// # Errors
///
/// Returns a store error.
pub fn clamp(conn: &Connection) -> Result<usize> {
    let drifted = drifted_entries(conn)?;
    for entry in &drifted {
        let allocation = alloc::allocate_in(&query::occupied_slots(conn, entry.list)?);
        set_position(
            conn,
            entry.handle,
            Some(entry.position),
            Some(allocation.position.as_i64()),
        )?;
        tracing::debug!(
            handle = %entry.handle,
            list = %entry.list,
            from = entry.position,
            to = allocation.position.get(),
            full = allocation.full,
            "clamped position"
        );
    }
    if !drifted.is_empty() {
        tracing::info!(clamped = drifted.len(), "clamped out-of-range positions");
    }
    Ok(drifted.len())
}

fn drifted_entries(conn: &Connection) -> Result<Vec<Drifted>> {
    let mut entries = Vec::new();

    let mut stmt = conn.prepare(
        "SELECT item_id, position, sub_category_id, main_category_id
         FROM rank_items
         WHERE position IS NOT NULL AND (position < 1 OR position > 11)
         ORDER BY created_at_us, item_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, Option<i64>>(2)?,
            row.get::<_, Option<i64>>(3)?,
        ))
    })?;
    for row in rows {
        let (item_id, position, sub, main) = row?;
        // Unplaced rows belong to the orphan sweep.
        if let Some(list) = Placement::from_columns(sub, main).list() {
            entries.push(Drifted {
                handle: EntryHandle::Item(item_id),
                list,
                position,
            });
        }
    }

    let mut stmt = conn.prepare(
        "SELECT reference_id, position, main_category_id
         FROM rank_references
         WHERE position IS NOT NULL AND (position < 1 OR position > 11)
         ORDER BY created_at_us, reference_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Drifted {
            handle: EntryHandle::Reference(row.get(0)?),
            position: row.get(1)?,
            list: ListId::Main(row.get(2)?),
        })
    })?;
    for row in rows {
        entries.push(row?);
    }

    Ok(entries)
}
