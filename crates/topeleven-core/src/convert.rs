//! Item deletion with reference conversion.
//!
//! A reference only projects content, so deleting its target would leave a
//! hole in every main category that ranked it. Before the target row goes,
//! each reference is replaced by a standalone item in its main category at
//! the reference's position.

use rusqlite::{Connection, params};
use serde::Serialize;

use crate::db::{Store, now_us, query};
use crate::error::Result;
use crate::model::{RankItem, Reference};

/// One reference turned into a standalone item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedReference {
    pub reference_id: i64,
    pub main_category_id: i64,
    pub new_item_id: i64,
    pub position: Option<i64>,
}

/// Result of [`delete_item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub deleted: RankItem,
    pub converted: Vec<ConvertedReference>,
}

/// Delete an item, converting every reference to it first.
///
/// Runs in one transaction: either all conversions and the delete land, or
/// nothing does.
///
/// # Errors
///
/// Returns `NotFound` if the item does not exist, or a store error.
pub fn delete_item(store: &mut Store, item_id: i64) -> Result<DeleteOutcome> {
    store.write(|tx| delete_item_within(tx, item_id))
}

pub(crate) fn delete_item_within(conn: &Connection, item_id: i64) -> Result<DeleteOutcome> {
    let item = query::require_item(conn, item_id)?;
    let references = query::references_to_item(conn, item_id)?;

    let mut converted = Vec::with_capacity(references.len());
    for reference in &references {
        converted.push(convert_reference(conn, &item, reference)?);
    }

    // Storage cascade removes any reference created after the read above.
    conn.execute("DELETE FROM rank_items WHERE item_id = ?1", [item_id])?;

    tracing::info!(
        item_id,
        converted = converted.len(),
        "deleted item"
    );

    Ok(DeleteOutcome {
        deleted: item,
        converted,
    })
}

fn convert_reference(
    conn: &Connection,
    source: &RankItem,
    reference: &Reference,
) -> Result<ConvertedReference> {
    let now = now_us();

    // Drop the reference first so its slot is free for the replacement.
    conn.execute(
        "DELETE FROM rank_references WHERE reference_id = ?1",
        [reference.id],
    )?;

    conn.execute(
        "INSERT INTO rank_items (
            title,
            description,
            position,
            owner,
            main_category_id,
            created_at_us,
            updated_at_us
         )
         SELECT ?1, ?2, ?3, m.owner, m.main_category_id, ?4, ?4
         FROM main_categories m
         WHERE m.main_category_id = ?5",
        params![
            source.title,
            source.description,
            reference.position,
            now,
            reference.main_category_id
        ],
    )?;
    let new_item_id = conn.last_insert_rowid();

    tracing::debug!(
        reference_id = reference.id,
        main_category_id = reference.main_category_id,
        new_item_id,
        position = ?reference.position,
        "converted reference to standalone item"
    );

    Ok(ConvertedReference {
        reference_id: reference.id,
        main_category_id: reference.main_category_id,
        new_item_id,
        position: reference.position,
    })
}
