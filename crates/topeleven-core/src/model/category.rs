use serde::{Deserialize, Serialize};

/// Top level of the hierarchy. Owns a list of direct items plus references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainCategory {
    pub id: i64,
    pub name: String,
    pub owner: String,
    pub created_at_us: i64,
}

/// Second level of the hierarchy. Owns an independent list of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: i64,
    pub main_category_id: i64,
    pub name: String,
    pub owner: String,
    pub created_at_us: i64,
}
