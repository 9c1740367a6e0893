//! Catalog operations: categories, items, references, and list reads.
//!
//! These are the operations upstream handlers call per user action. Each
//! mutation is one [`Store::write`] transaction, and every slot it assigns is
//! checked against the list's current occupancy inside that transaction.

use rusqlite::{Connection, params};

use crate::alloc;
use crate::db::{Store, now_us, query};
use crate::error::{Result, TopElevenError};
use crate::model::{
    ItemContent, ItemPatch, ListId, MainCategory, Placement, Position, RankItem, RankedList,
    Reference, SlotMap, SubCategory,
};

fn require_text(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(TopElevenError::EmptyField { field })
    } else {
        Ok(())
    }
}

/// Resolve the slot for a new entry: an explicit position must be free, an
/// omitted one comes from the allocator and must not be the full-list answer.
fn claim_slot(slots: &SlotMap, list: ListId, explicit: Option<Position>) -> Result<Position> {
    match explicit {
        Some(position) if slots.is_taken(position) => Err(TopElevenError::PositionOccupied {
            list,
            position: position.as_i64(),
        }),
        Some(position) => Ok(position),
        None => {
            let allocation = alloc::allocate_in(slots);
            allocation.free().ok_or_else(|| {
                tracing::warn!(%list, "list is full, refusing auto placement");
                TopElevenError::ListFull { list }
            })
        }
    }
}

fn validate_position(raw: Option<i64>) -> Result<Option<Position>> {
    raw.map(Position::new).transpose()
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Create a main category.
///
/// # Errors
///
/// Returns `EmptyField` for a blank name, or a store error.
pub fn create_main_category(store: &mut Store, name: &str, owner: &str) -> Result<MainCategory> {
    require_text("name", name)?;
    store.write(|tx| {
        let created_at_us = now_us();
        tx.execute(
            "INSERT INTO main_categories (name, owner, created_at_us) VALUES (?1, ?2, ?3)",
            params![name.trim(), owner, created_at_us],
        )?;
        let id = tx.last_insert_rowid();
        tracing::info!(main_category_id = id, owner, "created main category");
        Ok(MainCategory {
            id,
            name: name.trim().to_string(),
            owner: owner.to_string(),
            created_at_us,
        })
    })
}

/// Create a sub category under `main_category_id`.
///
/// # Errors
///
/// Returns `EmptyField`, `NotFound` for the parent, or a store error.
pub fn create_sub_category(
    store: &mut Store,
    main_category_id: i64,
    name: &str,
    owner: &str,
) -> Result<SubCategory> {
    require_text("name", name)?;
    store.write(|tx| {
        query::require_main_category(tx, main_category_id)?;
        let created_at_us = now_us();
        tx.execute(
            "INSERT INTO sub_categories (main_category_id, name, owner, created_at_us)
             VALUES (?1, ?2, ?3, ?4)",
            params![main_category_id, name.trim(), owner, created_at_us],
        )?;
        let id = tx.last_insert_rowid();
        tracing::info!(sub_category_id = id, main_category_id, "created sub category");
        Ok(SubCategory {
            id,
            main_category_id,
            name: name.trim().to_string(),
            owner: owner.to_string(),
            created_at_us,
        })
    })
}

/// Delete a main category with its sub categories, items and references.
///
/// # Errors
///
/// Returns `NotFound`, or a store error.
pub fn delete_main_category(store: &mut Store, id: i64) -> Result<MainCategory> {
    store.write(|tx| {
        let category = query::require_main_category(tx, id)?;
        tx.execute("DELETE FROM main_categories WHERE main_category_id = ?1", [id])?;
        tracing::info!(main_category_id = id, "deleted main category");
        Ok(category)
    })
}

/// Delete a sub category with its items (and their references).
///
/// # Errors
///
/// Returns `NotFound`, or a store error.
pub fn delete_sub_category(store: &mut Store, id: i64) -> Result<SubCategory> {
    store.write(|tx| {
        let category = query::require_sub_category(tx, id)?;
        tx.execute("DELETE FROM sub_categories WHERE sub_category_id = ?1", [id])?;
        tracing::info!(sub_category_id = id, "deleted sub category");
        Ok(category)
    })
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Add an item directly to `list`, at `position` or the lowest free slot.
///
/// # Errors
///
/// - `PositionOutOfRange` for an explicit position outside `1..=11`
/// - `EmptyField` for a blank title
/// - `NotFound` if the category does not exist
/// - `PositionOccupied` if the explicit slot is taken
/// - `ListFull` if no position was given and every slot is taken
pub fn create_item(
    store: &mut Store,
    list: ListId,
    content: &ItemContent,
    owner: &str,
    position: Option<i64>,
) -> Result<RankItem> {
    let explicit = validate_position(position)?;
    require_text("title", &content.title)?;

    store.write(|tx| {
        query::require_list(tx, list)?;
        let slot = claim_slot(&query::occupied_slots(tx, list)?, list, explicit)?;
        let item_id = insert_item(tx, list, content, owner, slot)?;
        tracing::info!(item_id, %list, position = slot.get(), "created item");
        query::require_item(tx, item_id)
    })
}

fn insert_item(
    conn: &Connection,
    list: ListId,
    content: &ItemContent,
    owner: &str,
    slot: Position,
) -> Result<i64> {
    let (sub_category_id, main_category_id) = Placement::from(list).columns();
    let now = now_us();
    conn.execute(
        "INSERT INTO rank_items (
            title,
            description,
            url,
            images_json,
            position,
            owner,
            sub_category_id,
            main_category_id,
            created_at_us,
            updated_at_us
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            content.title.trim(),
            content.description,
            content.url,
            query::encode_images(&content.images)?,
            slot.as_i64(),
            owner,
            sub_category_id,
            main_category_id,
            now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Edit an item's content. Position and placement are untouched.
///
/// # Errors
///
/// Returns `NotFound`, `EmptyField` for a blank new title, or a store error.
pub fn update_item(store: &mut Store, item_id: i64, patch: &ItemPatch) -> Result<RankItem> {
    if let Some(title) = &patch.title {
        require_text("title", title)?;
    }

    store.write(|tx| {
        let mut item = query::require_item(tx, item_id)?;
        if patch.is_empty() {
            return Ok(item);
        }

        if let Some(title) = &patch.title {
            item.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            item.description.clone_from(description);
        }
        if let Some(url) = &patch.url {
            item.url.clone_from(url);
        }
        if let Some(images) = &patch.images {
            item.images.clone_from(images);
        }
        item.updated_at_us = now_us();

        tx.execute(
            "UPDATE rank_items
             SET title = ?1, description = ?2, url = ?3, images_json = ?4, updated_at_us = ?5
             WHERE item_id = ?6",
            params![
                item.title,
                item.description,
                item.url,
                query::encode_images(&item.images)?,
                item.updated_at_us,
                item_id
            ],
        )?;
        tracing::info!(item_id, "updated item content");
        Ok(item)
    })
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// Project a sub-category item into its parent main category.
///
/// # Errors
///
/// - `PositionOutOfRange` for an explicit position outside `1..=11`
/// - `NotFound` for a missing category or item
/// - `InvalidReferenceSource` if the item is not in a sub category of
///   `main_category_id`
/// - `DuplicateReference` if the pair already exists
/// - `PositionOccupied` / `ListFull` as for [`create_item`]
pub fn create_reference(
    store: &mut Store,
    main_category_id: i64,
    item_id: i64,
    position: Option<i64>,
) -> Result<Reference> {
    let explicit = validate_position(position)?;

    store.write(|tx| {
        query::require_main_category(tx, main_category_id)?;
        let item = query::require_item(tx, item_id)?;

        let Placement::Sub(sub_category_id) = item.placement else {
            return Err(TopElevenError::InvalidReferenceSource {
                item_id,
                main_category_id,
                reason: "only sub category items can be referenced",
            });
        };
        let sub = query::require_sub_category(tx, sub_category_id)?;
        if sub.main_category_id != main_category_id {
            return Err(TopElevenError::InvalidReferenceSource {
                item_id,
                main_category_id,
                reason: "item's sub category belongs to another main category",
            });
        }

        let already: bool = tx.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM rank_references WHERE main_category_id = ?1 AND item_id = ?2
             )",
            params![main_category_id, item_id],
            |row| row.get(0),
        )?;
        if already {
            return Err(TopElevenError::DuplicateReference {
                main_category_id,
                rank_item_id: item_id,
            });
        }

        let list = ListId::Main(main_category_id);
        let slot = claim_slot(&query::occupied_slots(tx, list)?, list, explicit)?;
        tx.execute(
            "INSERT INTO rank_references (main_category_id, item_id, position, created_at_us)
             VALUES (?1, ?2, ?3, ?4)",
            params![main_category_id, item_id, slot.as_i64(), now_us()],
        )?;
        let reference_id = tx.last_insert_rowid();
        tracing::info!(
            reference_id,
            main_category_id,
            item_id,
            position = slot.get(),
            "created reference"
        );
        query::require_reference(tx, reference_id)
    })
}

/// Remove a reference. The target item is untouched.
///
/// # Errors
///
/// Returns `NotFound`, or a store error.
pub fn delete_reference(store: &mut Store, reference_id: i64) -> Result<Reference> {
    store.write(|tx| {
        let reference = query::require_reference(tx, reference_id)?;
        tx.execute(
            "DELETE FROM rank_references WHERE reference_id = ?1",
            [reference_id],
        )?;
        tracing::info!(reference_id, "deleted reference");
        Ok(reference)
    })
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Read one list for display.
///
/// # Errors
///
/// Returns `NotFound` for a missing category, or a store error.
pub fn list_entries(conn: &Connection, list: ListId) -> Result<RankedList> {
    query::require_list(conn, list)?;
    query::load_list(conn, list)
}
