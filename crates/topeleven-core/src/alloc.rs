//! Position allocator: lowest free slot of a list.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::query;
use crate::error::Result;
use crate::model::{ListId, Position, SlotMap};

/// Result of an allocation.
///
/// When the list is full the allocator still answers with the last slot, and
/// sets `full` so the caller treats it as a capacity warning rather than a
/// usable free slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotAllocation {
    pub position: Position,
    pub full: bool,
}

impl SlotAllocation {
    /// The slot, only if it is actually free.
    #[must_use]
    pub const fn free(self) -> Option<Position> {
        if self.full { None } else { Some(self.position) }
    }
}

/// Pick the smallest unused slot from an occupancy map.
#[must_use]
pub fn allocate_in(slots: &SlotMap) -> SlotAllocation {
    slots.lowest_free().map_or(
        SlotAllocation {
            position: Position::LAST,
            full: true,
        },
        |position| SlotAllocation {
            position,
            full: false,
        },
    )
}

/// Compute the lowest free slot of `list`. Pure read.
///
/// For a main category the used set is the union of direct item positions
/// and reference positions.
///
/// # Errors
///
/// Returns `NotFound` if the category behind `list` does not exist, or a
/// store error.
pub fn allocate(conn: &Connection, list: ListId) -> Result<SlotAllocation> {
    query::require_list(conn, list)?;
    let allocation = allocate_in(&query::occupied_slots(conn, list)?);
    if allocation.full {
        tracing::warn!(%list, "allocation requested for a full list");
    }
    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use super::{SlotAllocation, allocate, allocate_in};
    use crate::db::Store;
    use crate::error::{ErrorKind, Result};
    use crate::model::{ListId, Position, SlotMap};

    fn pos(raw: i64) -> Position {
        Position::new(raw).expect("valid position")
    }

    fn store_with_lists() -> Store {
        let store = Store::open_in_memory().expect("open store");
        store
            .conn()
            .execute_batch(
                "INSERT INTO main_categories (name, owner, created_at_us) VALUES ('Books', 'ana', 0);
                 INSERT INTO sub_categories (main_category_id, name, owner, created_at_us)
                     VALUES (1, 'Sci-fi', 'ana', 0);",
            )
            .expect("seed");
        store
    }

    fn add_sub_item(store: &Store, position: i64) {
        store
            .conn()
            .execute(
                "INSERT INTO rank_items (title, position, owner, sub_category_id, created_at_us, updated_at_us)
                 VALUES ('x', ?1, 'ana', 1, 0, 0)",
                [position],
            )
            .expect("insert item");
    }

    #[test]
    fn sub_list_gets_first_gap() -> Result<()> {
        let store = store_with_lists();
        for position in [1, 2, 3, 5, 7] {
            add_sub_item(&store, position);
        }
        assert_eq!(
            allocate(store.conn(), ListId::Sub(1))?,
            SlotAllocation {
                position: pos(4),
                full: false
            }
        );
        Ok(())
    }

    #[test]
    fn main_list_counts_items_and_references() -> Result<()> {
        let store = store_with_lists();
        add_sub_item(&store, 1);
        store
            .conn()
            .execute_batch(
                "INSERT INTO rank_items (title, position, owner, main_category_id, created_at_us, updated_at_us)
                     VALUES ('direct', 3, 'ana', 1, 0, 0);
                 INSERT INTO rank_references (main_category_id, item_id, position, created_at_us)
                     VALUES (1, 1, 5, 0);",
            )
            .expect("seed main list");

        assert_eq!(allocate(store.conn(), ListId::Main(1))?.position, pos(1));

        store
            .conn()
            .execute("UPDATE rank_references SET position = 1", [])
            .expect("move reference");
        assert_eq!(allocate(store.conn(), ListId::Main(1))?.position, pos(2));
        Ok(())
    }

    #[test]
    fn full_list_answers_last_slot_with_warning() -> Result<()> {
        let store = store_with_lists();
        for position in 1..=11 {
            add_sub_item(&store, position);
        }
        let allocation = allocate(store.conn(), ListId::Sub(1))?;
        assert!(allocation.full);
        assert_eq!(allocation.position, Position::LAST);
        assert_eq!(allocation.free(), None);
        Ok(())
    }

    #[test]
    fn unranked_and_drifted_rows_do_not_block_slots() {
        let allocation = allocate_in(&SlotMap::from_positions([0, 14]));
        assert_eq!(allocation.free(), Position::new(1).ok());
    }

    #[test]
    fn missing_list_is_not_found() {
        let store = store_with_lists();
        let err = allocate(store.conn(), ListId::Sub(99)).expect_err("missing list");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
