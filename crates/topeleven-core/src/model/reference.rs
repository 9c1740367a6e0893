use serde::{Deserialize, Serialize};

use super::position::Position;

/// Projects a sub-category item into its parent main category's list.
///
/// A reference carries no content of its own. Its position is scoped to
/// `main_category_id` and unrelated to the target item's own position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: i64,
    pub main_category_id: i64,
    pub rank_item_id: i64,
    pub position: Option<i64>,
    pub created_at_us: i64,
}

impl Reference {
    #[must_use]
    pub fn slot(&self) -> Option<Position> {
        self.position.and_then(|raw| Position::new(raw).ok())
    }
}
