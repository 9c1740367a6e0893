use serde::{Deserialize, Serialize};

use super::entry::ListId;
use super::position::Position;

/// Where a [`RankItem`] lives.
///
/// `Unplaced` is transient: it only appears for rows that lost their
/// category, and the reconciler removes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Placement {
    Sub(i64),
    Main(i64),
    Unplaced,
}

impl Placement {
    /// Decode the `(sub_category_id, main_category_id)` column pair.
    #[must_use]
    pub const fn from_columns(sub_category_id: Option<i64>, main_category_id: Option<i64>) -> Self {
        match (sub_category_id, main_category_id) {
            (Some(sub), _) => Self::Sub(sub),
            (None, Some(main)) => Self::Main(main),
            (None, None) => Self::Unplaced,
        }
    }

    /// Encode as `(sub_category_id, main_category_id)`.
    #[must_use]
    pub const fn columns(self) -> (Option<i64>, Option<i64>) {
        match self {
            Self::Sub(sub) => (Some(sub), None),
            Self::Main(main) => (None, Some(main)),
            Self::Unplaced => (None, None),
        }
    }

    /// The list this placement ranks in.
    #[must_use]
    pub const fn list(self) -> Option<ListId> {
        match self {
            Self::Sub(sub) => Some(ListId::Sub(sub)),
            Self::Main(main) => Some(ListId::Main(main)),
            Self::Unplaced => None,
        }
    }
}

impl From<ListId> for Placement {
    fn from(list: ListId) -> Self {
        match list {
            ListId::Sub(id) => Self::Sub(id),
            ListId::Main(id) => Self::Main(id),
        }
    }
}

/// A user's content entry eligible to occupy a ranked slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub images: Vec<String>,
    /// Raw stored position; see [`RankItem::slot`] for the validated form.
    pub position: Option<i64>,
    pub owner: String,
    pub placement: Placement,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

impl RankItem {
    /// The item's position if it names a real slot.
    #[must_use]
    pub fn slot(&self) -> Option<Position> {
        self.position.and_then(|raw| Position::new(raw).ok())
    }

    #[must_use]
    pub const fn list(&self) -> Option<ListId> {
        self.placement.list()
    }
}

/// Content fields accepted when creating or editing an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemContent {
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub images: Vec<String>,
}

/// Partial update of an item's content. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub url: Option<Option<String>>,
    pub images: Option<Vec<String>>,
}

impl ItemPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.url.is_none()
            && self.images.is_none()
    }
}
