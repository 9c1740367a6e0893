use serde::{Deserialize, Serialize};
use std::fmt;

use super::item::RankItem;
use super::reference::Reference;

/// One position space: a sub category's items, or a main category's
/// direct items together with its references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ListId {
    Sub(i64),
    Main(i64),
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sub(id) => write!(f, "sub category {id}"),
            Self::Main(id) => write!(f, "main category {id}"),
        }
    }
}

/// Identifies a movable row: a direct item or a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntryHandle {
    Item(i64),
    Reference(i64),
}

impl fmt::Display for EntryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(id) => write!(f, "item {id}"),
            Self::Reference(id) => write!(f, "reference {id}"),
        }
    }
}

/// A row as it appears in a ranked list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum ListEntry {
    DirectItem(RankItem),
    ReferenceEntry {
        reference: Reference,
        target: RankItem,
    },
}

impl ListEntry {
    #[must_use]
    pub const fn handle(&self) -> EntryHandle {
        match self {
            Self::DirectItem(item) => EntryHandle::Item(item.id),
            Self::ReferenceEntry { reference, .. } => EntryHandle::Reference(reference.id),
        }
    }

    /// Position within the list this entry was read from.
    #[must_use]
    pub const fn position(&self) -> Option<i64> {
        match self {
            Self::DirectItem(item) => item.position,
            Self::ReferenceEntry { reference, .. } => reference.position,
        }
    }

    /// The item whose content is displayed for this entry.
    #[must_use]
    pub const fn item(&self) -> &RankItem {
        match self {
            Self::DirectItem(item) | Self::ReferenceEntry { target: item, .. } => item,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.item().title
    }

    /// Creation time of the row occupying the slot (the reference row, not
    /// its target, for projected entries).
    #[must_use]
    pub const fn created_at_us(&self) -> i64 {
        match self {
            Self::DirectItem(item) => item.created_at_us,
            Self::ReferenceEntry { reference, .. } => reference.created_at_us,
        }
    }

    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::ReferenceEntry { .. })
    }
}
