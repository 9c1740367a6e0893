//! Canonical SQLite schema for topeleven.
//!
//! - `main_categories` / `sub_categories` model the two-level hierarchy
//! - `rank_items` holds content; its placement is one of `sub_category_id`,
//!   `main_category_id`, or neither (a transient orphan)
//! - `rank_references` projects a sub-category item into a main category at
//!   an independent position
//! - `store_meta` tracks the schema version and the last reconcile run
//!
//! Position range and per-list uniqueness are NOT constraints: a main
//! category's list spans two tables, and the reconciler must be able to load
//! drifted rows in order to repair them.

/// Migration v1: hierarchy, items, references, metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS main_categories (
    main_category_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    owner TEXT NOT NULL,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS sub_categories (
    sub_category_id INTEGER PRIMARY KEY AUTOINCREMENT,
    main_category_id INTEGER NOT NULL
        REFERENCES main_categories(main_category_id) ON DELETE CASCADE,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    owner TEXT NOT NULL,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS rank_items (
    item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    url TEXT,
    images_json TEXT NOT NULL DEFAULT '[]',
    position INTEGER,
    owner TEXT NOT NULL,
    sub_category_id INTEGER
        REFERENCES sub_categories(sub_category_id) ON DELETE CASCADE,
    main_category_id INTEGER
        REFERENCES main_categories(main_category_id) ON DELETE CASCADE,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    CHECK (sub_category_id IS NULL OR main_category_id IS NULL)
);

CREATE TABLE IF NOT EXISTS rank_references (
    reference_id INTEGER PRIMARY KEY AUTOINCREMENT,
    main_category_id INTEGER NOT NULL
        REFERENCES main_categories(main_category_id) ON DELETE CASCADE,
    item_id INTEGER NOT NULL
        REFERENCES rank_items(item_id) ON DELETE CASCADE,
    position INTEGER,
    created_at_us INTEGER NOT NULL,
    UNIQUE (main_category_id, item_id)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    last_reconcile_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (
    id,
    schema_version,
    last_reconcile_at_us
) VALUES (1, 1, 0);
";

/// Migration v2: per-list position lookups used by the allocator and mover.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_rank_items_sub_position
    ON rank_items(sub_category_id, position);

CREATE INDEX IF NOT EXISTS idx_rank_items_main_position
    ON rank_items(main_category_id, position);

CREATE INDEX IF NOT EXISTS idx_rank_references_main_position
    ON rank_references(main_category_id, position);

CREATE INDEX IF NOT EXISTS idx_rank_references_item
    ON rank_references(item_id);

CREATE INDEX IF NOT EXISTS idx_sub_categories_main
    ON sub_categories(main_category_id);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by list/allocate/reconcile query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_rank_items_sub_position",
    "idx_rank_items_main_position",
    "idx_rank_references_main_position",
    "idx_rank_references_item",
    "idx_sub_categories_main",
];
