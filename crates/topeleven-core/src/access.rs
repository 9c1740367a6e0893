//! Owner checks invoked by callers before mutating a record.
//!
//! The core operations never check ownership themselves; a handler resolves
//! the acting user and calls [`ensure_owner`] first.

use rusqlite::Connection;

use crate::db::query;
use crate::error::{Entity, Result, TopElevenError};
use crate::model::{EntryHandle, ListId};

/// A record whose owner can be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owned {
    MainCategory(i64),
    SubCategory(i64),
    Item(i64),
    /// References carry no owner; the enclosing main category's owner applies.
    Reference(i64),
}

impl From<ListId> for Owned {
    fn from(list: ListId) -> Self {
        match list {
            ListId::Sub(id) => Self::SubCategory(id),
            ListId::Main(id) => Self::MainCategory(id),
        }
    }
}

impl From<EntryHandle> for Owned {
    fn from(handle: EntryHandle) -> Self {
        match handle {
            EntryHandle::Item(id) => Self::Item(id),
            EntryHandle::Reference(id) => Self::Reference(id),
        }
    }
}

/// Owner recorded for `target`.
///
/// # Errors
///
/// Returns `NotFound` if the record does not exist, or a store error.
pub fn owner_of(conn: &Connection, target: Owned) -> Result<String> {
    Ok(match target {
        Owned::MainCategory(id) => query::require_main_category(conn, id)?.owner,
        Owned::SubCategory(id) => query::require_sub_category(conn, id)?.owner,
        Owned::Item(id) => query::require_item(conn, id)?.owner,
        Owned::Reference(id) => {
            let reference = query::require_reference(conn, id)?;
            query::require_main_category(conn, reference.main_category_id)?.owner
        }
    })
}

/// Fail with `Forbidden` unless `actor` owns `target`.
///
/// # Errors
///
/// Returns `Forbidden` on mismatch, `NotFound` for a missing record, or a
/// store error.
pub fn ensure_owner(conn: &Connection, target: Owned, actor: &str) -> Result<()> {
    let owner = owner_of(conn, target)?;
    if owner == actor {
        return Ok(());
    }

    let (entity, id) = match target {
        Owned::MainCategory(id) => (Entity::MainCategory, id),
        Owned::SubCategory(id) => (Entity::SubCategory, id),
        Owned::Item(id) => (Entity::RankItem, id),
        Owned::Reference(id) => (Entity::Reference, id),
    };
    tracing::warn!(%entity, id, owner, actor, "ownership check failed");
    Err(TopElevenError::Forbidden {
        entity,
        id,
        owner,
        actor: actor.to_string(),
    })
}
