//! `SQLite` query helpers for the rank-list store.
//!
//! Typed row mappers and composable read functions for categories, items,
//! references and whole lists. All functions take a shared `&Connection`
//! (a `Transaction` derefs to one) and return typed structs, never raw rows.

use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};

use crate::error::{Entity, Result, TopElevenError};
use crate::model::{
    ListEntry, ListId, MainCategory, Placement, RankItem, RankedList, Reference, SlotMap,
    SubCategory,
};

// ---------------------------------------------------------------------------
// Row mappers
// ---------------------------------------------------------------------------

const MAIN_COLUMNS: &str = "main_category_id, name, owner, created_at_us";
const SUB_COLUMNS: &str = "sub_category_id, main_category_id, name, owner, created_at_us";
const ITEM_COLUMNS: &str = "item_id, title, description, url, images_json, position, owner, \
                            sub_category_id, main_category_id, created_at_us, updated_at_us";
const REFERENCE_COLUMNS: &str =
    "reference_id, main_category_id, item_id, position, created_at_us";

fn map_main(row: &Row<'_>) -> rusqlite::Result<MainCategory> {
    Ok(MainCategory {
        id: row.get(0)?,
        name: row.get(1)?,
        owner: row.get(2)?,
        created_at_us: row.get(3)?,
    })
}

fn map_sub(row: &Row<'_>) -> rusqlite::Result<SubCategory> {
    Ok(SubCategory {
        id: row.get(0)?,
        main_category_id: row.get(1)?,
        name: row.get(2)?,
        owner: row.get(3)?,
        created_at_us: row.get(4)?,
    })
}

/// Map an item row starting at column `offset` (lets joins reuse it).
fn map_item_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<RankItem> {
    let images_json: String = row.get(offset + 4)?;
    let images: Vec<String> = serde_json::from_str(&images_json).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(offset + 4, Type::Text, Box::new(error))
    })?;

    Ok(RankItem {
        id: row.get(offset)?,
        title: row.get(offset + 1)?,
        description: row.get(offset + 2)?,
        url: row.get(offset + 3)?,
        images,
        position: row.get(offset + 5)?,
        owner: row.get(offset + 6)?,
        placement: Placement::from_columns(row.get(offset + 7)?, row.get(offset + 8)?),
        created_at_us: row.get(offset + 9)?,
        updated_at_us: row.get(offset + 10)?,
    })
}

fn map_item(row: &Row<'_>) -> rusqlite::Result<RankItem> {
    map_item_at(row, 0)
}

fn map_reference(row: &Row<'_>) -> rusqlite::Result<Reference> {
    Ok(Reference {
        id: row.get(0)?,
        main_category_id: row.get(1)?,
        rank_item_id: row.get(2)?,
        position: row.get(3)?,
        created_at_us: row.get(4)?,
    })
}

/// Encode an image list for the `images_json` column.
pub(crate) fn encode_images(images: &[String]) -> rusqlite::Result<String> {
    serde_json::to_string(images)
        .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))
}

// ---------------------------------------------------------------------------
// Single-row lookups
// ---------------------------------------------------------------------------

/// Fetch a main category by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_main_category(conn: &Connection, id: i64) -> Result<Option<MainCategory>> {
    let sql = format!("SELECT {MAIN_COLUMNS} FROM main_categories WHERE main_category_id = ?1");
    Ok(conn.query_row(&sql, [id], map_main).optional()?)
}

/// Fetch a sub category by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_sub_category(conn: &Connection, id: i64) -> Result<Option<SubCategory>> {
    let sql = format!("SELECT {SUB_COLUMNS} FROM sub_categories WHERE sub_category_id = ?1");
    Ok(conn.query_row(&sql, [id], map_sub).optional()?)
}

/// Fetch an item by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_item(conn: &Connection, id: i64) -> Result<Option<RankItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM rank_items WHERE item_id = ?1");
    Ok(conn.query_row(&sql, [id], map_item).optional()?)
}

/// Fetch a reference by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_reference(conn: &Connection, id: i64) -> Result<Option<Reference>> {
    let sql = format!("SELECT {REFERENCE_COLUMNS} FROM rank_references WHERE reference_id = ?1");
    Ok(conn.query_row(&sql, [id], map_reference).optional()?)
}

/// Like [`get_main_category`] but absent rows become `NotFound`.
///
/// # Errors
///
/// Returns [`TopElevenError::NotFound`] or a store error.
pub fn require_main_category(conn: &Connection, id: i64) -> Result<MainCategory> {
    get_main_category(conn, id)?.ok_or(TopElevenError::not_found(Entity::MainCategory, id))
}

/// Like [`get_sub_category`] but absent rows become `NotFound`.
///
/// # Errors
///
/// Returns [`TopElevenError::NotFound`] or a store error.
pub fn require_sub_category(conn: &Connection, id: i64) -> Result<SubCategory> {
    get_sub_category(conn, id)?.ok_or(TopElevenError::not_found(Entity::SubCategory, id))
}

/// Like [`get_item`] but absent rows become `NotFound`.
///
/// # Errors
///
/// Returns [`TopElevenError::NotFound`] or a store error.
pub fn require_item(conn: &Connection, id: i64) -> Result<RankItem> {
    get_item(conn, id)?.ok_or(TopElevenError::not_found(Entity::RankItem, id))
}

/// Like [`get_reference`] but absent rows become `NotFound`.
///
/// # Errors
///
/// Returns [`TopElevenError::NotFound`] or a store error.
pub fn require_reference(conn: &Connection, id: i64) -> Result<Reference> {
    get_reference(conn, id)?.ok_or(TopElevenError::not_found(Entity::Reference, id))
}

/// Ensure the category behind `list` exists.
///
/// # Errors
///
/// Returns [`TopElevenError::NotFound`] for a missing category.
pub fn require_list(conn: &Connection, list: ListId) -> Result<()> {
    match list {
        ListId::Sub(id) => require_sub_category(conn, id).map(|_| ()),
        ListId::Main(id) => require_main_category(conn, id).map(|_| ()),
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// All main categories, optionally restricted to one owner, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_main_categories(conn: &Connection, owner: Option<&str>) -> Result<Vec<MainCategory>> {
    let sql = format!(
        "SELECT {MAIN_COLUMNS} FROM main_categories \
         WHERE ?1 IS NULL OR owner = ?1 \
         ORDER BY created_at_us ASC, main_category_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([owner], map_main)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Sub categories of one main category, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_sub_categories(conn: &Connection, main_category_id: i64) -> Result<Vec<SubCategory>> {
    let sql = format!(
        "SELECT {SUB_COLUMNS} FROM sub_categories \
         WHERE main_category_id = ?1 \
         ORDER BY created_at_us ASC, sub_category_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([main_category_id], map_sub)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Items placed directly in `list`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn items_in_list(conn: &Connection, list: ListId) -> Result<Vec<RankItem>> {
    let (column, id) = match list {
        ListId::Sub(id) => ("sub_category_id", id),
        ListId::Main(id) => ("main_category_id", id),
    };
    let sql = format!("SELECT {ITEM_COLUMNS} FROM rank_items WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([id], map_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// References projected into a main category, each with its target item.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn references_in_main(
    conn: &Connection,
    main_category_id: i64,
) -> Result<Vec<(Reference, RankItem)>> {
    let sql = format!(
        "SELECT r.reference_id, r.main_category_id, r.item_id, r.position, r.created_at_us, \
                i.{} \
         FROM rank_references r \
         JOIN rank_items i ON i.item_id = r.item_id \
         WHERE r.main_category_id = ?1",
        ITEM_COLUMNS.replace(", ", ", i.")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([main_category_id], |row| {
            Ok((map_reference(row)?, map_item_at(row, 5)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// References targeting one item, across all main categories.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn references_to_item(conn: &Connection, item_id: i64) -> Result<Vec<Reference>> {
    let sql = format!(
        "SELECT {REFERENCE_COLUMNS} FROM rank_references \
         WHERE item_id = ?1 ORDER BY reference_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([item_id], map_reference)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Load every entry of `list` as one ranked collection.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_list(conn: &Connection, list: ListId) -> Result<RankedList> {
    let mut entries: Vec<ListEntry> = items_in_list(conn, list)?
        .into_iter()
        .map(ListEntry::DirectItem)
        .collect();

    if let ListId::Main(main_category_id) = list {
        entries.extend(
            references_in_main(conn, main_category_id)?
                .into_iter()
                .map(|(reference, target)| ListEntry::ReferenceEntry { reference, target }),
        );
    }

    Ok(RankedList::new(list, entries))
}

/// Occupied slots of `list`, read straight from the position columns.
///
/// For a main category this is the union of direct item positions and
/// reference positions.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn occupied_slots(conn: &Connection, list: ListId) -> Result<SlotMap> {
    let positions: Vec<i64> = match list {
        ListId::Sub(id) => {
            let mut stmt = conn.prepare_cached(
                "SELECT position FROM rank_items \
                 WHERE sub_category_id = ?1 AND position IS NOT NULL",
            )?;
            stmt.query_map([id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
        ListId::Main(id) => {
            let mut stmt = conn.prepare_cached(
                "SELECT position FROM rank_items \
                 WHERE main_category_id = ?1 AND position IS NOT NULL \
                 UNION ALL \
                 SELECT position FROM rank_references \
                 WHERE main_category_id = ?1 AND position IS NOT NULL",
            )?;
            stmt.query_map([id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
    };
    Ok(SlotMap::from_positions(positions))
}

/// Row counts for a main category's contents: `(direct items, references, sub categories)`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn main_category_counts(conn: &Connection, main_category_id: i64) -> Result<(i64, i64, i64)> {
    Ok(conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM rank_items WHERE main_category_id = ?1),
            (SELECT COUNT(*) FROM rank_references WHERE main_category_id = ?1),
            (SELECT COUNT(*) FROM sub_categories WHERE main_category_id = ?1)",
        params![main_category_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?)
}

/// Timestamp of the last completed reconcile run (0 = never).
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn last_reconcile_at(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT last_reconcile_at_us FROM store_meta WHERE id = 1",
        [],
        |row| row.get(0),
    )?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
