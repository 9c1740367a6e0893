//! Repositioning engine: swap-based moves within one list.
//!
//! Moving entry A to slot `p` swaps with whatever entry B currently holds `p`:
//! B takes A's old position (or becomes unranked if A had none). The cost is
//! two row writes regardless of list shape, and applying the inverse move
//! restores the previous state exactly.
//!
//! Both writes are compare-and-swap updates inside one `IMMEDIATE`
//! transaction; a CAS that matches no row aborts the whole move.

use rusqlite::{Connection, params};
use serde::Serialize;

use crate::db::{Store, now_us, query};
use crate::error::{Result, TopElevenError};
use crate::model::{EntryHandle, ListEntry, ListId, Position};

/// What a move changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub handle: EntryHandle,
    pub list: ListId,
    pub from: Option<i64>,
    pub to: Position,
    /// Entry that held `to` before the move; it now holds [`MoveOutcome::vacated`].
    pub displaced: Option<EntryHandle>,
}

impl MoveOutcome {
    /// Slot the mover left behind. A drifted `from` vacates nothing.
    #[must_use]
    pub fn vacated(&self) -> Option<i64> {
        self.from.filter(|raw| Position::in_range(*raw))
    }

    /// True when the entry already held the target slot.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.from == Some(self.to.as_i64())
    }
}

/// Move `handle` to `new_position`, swapping with the current occupant.
///
/// # Errors
///
/// - `PositionOutOfRange` if `new_position` is outside `1..=11`
/// - `NotFound` if the handle does not resolve
/// - `MissingTargetList` if a direct item has no placement
/// - `ConcurrentModification` if a position changed under the move
pub fn move_entry(store: &mut Store, handle: EntryHandle, new_position: i64) -> Result<MoveOutcome> {
    let to = Position::new(new_position)?;
    store.write(|tx| move_within(tx, handle, to))
}

/// Resolve the list a handle ranks in and its current raw position.
///
/// # Errors
///
/// Returns `NotFound` for an unknown handle, `MissingTargetList` for an
/// unplaced item.
pub fn locate(conn: &Connection, handle: EntryHandle) -> Result<(ListId, Option<i64>)> {
    match handle {
        EntryHandle::Item(id) => {
            let item = query::require_item(conn, id)?;
            let list = item
                .list()
                .ok_or(TopElevenError::MissingTargetList { item_id: id })?;
            Ok((list, item.position))
        }
        EntryHandle::Reference(id) => {
            let reference = query::require_reference(conn, id)?;
            Ok((ListId::Main(reference.main_category_id), reference.position))
        }
    }
}

fn move_within(conn: &Connection, handle: EntryHandle, to: Position) -> Result<MoveOutcome> {
    let (list, from) = locate(conn, handle)?;
    let target = to.as_i64();

    if from == Some(target) {
        tracing::debug!(%handle, %list, position = target, "move is a no-op");
        return Ok(MoveOutcome {
            handle,
            list,
            from,
            to,
            displaced: None,
        });
    }

    let ranked = query::load_list(conn, list)?;
    let displaced = ranked
        .occupant_other_than(target, handle)
        .map(ListEntry::handle);

    // An out-of-range `from` must not spread to the occupant.
    let vacated = from.filter(|raw| Position::in_range(*raw));
    if let Some(other) = displaced {
        set_position(conn, other, Some(target), vacated)?;
    }
    set_position(conn, handle, from, Some(target))?;

    tracing::info!(
        %handle,
        %list,
        from = ?from,
        to = target,
        displaced = ?displaced,
        "moved entry"
    );

    Ok(MoveOutcome {
        handle,
        list,
        from,
        to,
        displaced,
    })
}

/// Compare-and-swap a position column.
///
/// Succeeds only if the row still holds `expected` (NULL-safe comparison).
///
/// # Errors
///
/// Returns `ConcurrentModification` when no row matched, or a store error.
pub(crate) fn set_position(
    conn: &Connection,
    handle: EntryHandle,
    expected: Option<i64>,
    new: Option<i64>,
) -> Result<()> {
    let changed = match handle {
        EntryHandle::Item(id) => conn.execute(
            "UPDATE rank_items SET position = ?1, updated_at_us = ?2 \
             WHERE item_id = ?3 AND position IS ?4",
            params![new, now_us(), id, expected],
        )?,
        EntryHandle::Reference(id) => conn.execute(
            "UPDATE rank_references SET position = ?1 \
             WHERE reference_id = ?2 AND position IS ?3",
            params![new, id, expected],
        )?,
    };

    if changed == 1 {
        tracing::debug!(%handle, from = ?expected, to = ?new, "position written");
        Ok(())
    } else {
        Err(TopElevenError::ConcurrentModification { handle })
    }
}
