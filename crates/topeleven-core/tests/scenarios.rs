//! End-to-end scenarios over an on-disk store: allocation, moves, reference
//! conversion on delete, and reconcile repair.

use rusqlite::params;
use tempfile::TempDir;
use topeleven_core::alloc::allocate;
use topeleven_core::catalog::{
    create_item, create_main_category, create_reference, create_sub_category, list_entries,
};
use topeleven_core::convert::delete_item;
use topeleven_core::db::{DEFAULT_BUSY_TIMEOUT, Store, query};
use topeleven_core::model::{ItemContent, Placement};
use topeleven_core::reconcile::{ReconcileOptions, reconcile};
use topeleven_core::reposition::move_entry;
use topeleven_core::{EntryHandle, ListEntry, ListId, TopElevenError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(&dir.path().join("topeleven.db"), DEFAULT_BUSY_TIMEOUT)
        .expect("open store");
    (dir, store)
}

fn titled(title: &str) -> ItemContent {
    ItemContent {
        title: title.to_string(),
        description: Some(format!("about {title}")),
        ..ItemContent::default()
    }
}

/// Main category `M` with one sub category `S`; returns `(M, S)` ids.
fn hierarchy(store: &mut Store) -> (i64, i64) {
    let main = create_main_category(store, "Movies", "ana").expect("main");
    let sub = create_sub_category(store, main.id, "Westerns", "ana").expect("sub");
    (main.id, sub.id)
}

fn positions(store: &Store, list: ListId) -> Vec<i64> {
    list_entries(store.conn(), list)
        .expect("list")
        .entries
        .iter()
        .filter_map(ListEntry::position)
        .collect()
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[test]
fn sub_list_with_gaps_allocates_first_gap() {
    let (_dir, mut store) = open_store();
    let (_, sub) = hierarchy(&mut store);
    for position in [1, 2, 3, 5, 7] {
        create_item(
            &mut store,
            ListId::Sub(sub),
            &titled(&format!("w{position}")),
            "ana",
            Some(position),
        )
        .expect("create");
    }
    assert_eq!(
        allocate(store.conn(), ListId::Sub(sub))
            .expect("allocate")
            .position
            .get(),
        4
    );
}

#[test]
fn main_list_allocation_counts_both_entry_kinds() {
    let (_dir, mut store) = open_store();
    let (main, sub) = hierarchy(&mut store);
    create_item(&mut store, ListId::Main(main), &titled("Heat"), "ana", Some(3)).expect("direct");
    let item =
        create_item(&mut store, ListId::Sub(sub), &titled("Unforgiven"), "ana", None).expect("sub");
    create_reference(&mut store, main, item.id, Some(5)).expect("reference");

    assert_eq!(
        allocate(store.conn(), ListId::Main(main))
            .expect("allocate")
            .position
            .get(),
        1
    );
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

#[test]
fn moves_across_entry_kinds_keep_main_list_unique() {
    let (_dir, mut store) = open_store();
    let (main, sub) = hierarchy(&mut store);
    let direct =
        create_item(&mut store, ListId::Main(main), &titled("Alien"), "ana", Some(1)).expect("a");
    let source =
        create_item(&mut store, ListId::Sub(sub), &titled("Tombstone"), "ana", Some(1)).expect("b");
    let reference = create_reference(&mut store, main, source.id, Some(2)).expect("ref");

    let outcome =
        move_entry(&mut store, EntryHandle::Reference(reference.id), 1).expect("move ref");
    assert_eq!(outcome.displaced, Some(EntryHandle::Item(direct.id)));
    assert_eq!(positions(&store, ListId::Main(main)), vec![1, 2]);
    assert_eq!(positions(&store, ListId::Sub(sub)), vec![1]);

    let main_list = list_entries(store.conn(), ListId::Main(main)).expect("list");
    assert!(main_list.entries[0].is_reference());
    assert_eq!(main_list.entries[0].title(), "Tombstone");
}

// ---------------------------------------------------------------------------
// Reference conversion
// ---------------------------------------------------------------------------

#[test]
fn deleting_referenced_item_materializes_it_in_main_list() {
    let (_dir, mut store) = open_store();
    let (main, sub) = hierarchy(&mut store);
    let item = create_item(&mut store, ListId::Sub(sub), &titled("Rio Bravo"), "ana", Some(2))
        .expect("item");
    let reference = create_reference(&mut store, main, item.id, Some(5)).expect("reference");

    let outcome = delete_item(&mut store, item.id).expect("delete");
    assert_eq!(outcome.converted.len(), 1);

    let main_list = list_entries(store.conn(), ListId::Main(main)).expect("main");
    assert_eq!(main_list.len(), 1);
    match &main_list.entries[0] {
        ListEntry::DirectItem(replacement) => {
            assert_eq!(replacement.title, "Rio Bravo");
            assert_eq!(replacement.position, Some(5));
            assert_eq!(replacement.placement, Placement::Main(main));
        }
        ListEntry::ReferenceEntry { .. } => panic!("reference should have been converted"),
    }

    assert!(list_entries(store.conn(), ListId::Sub(sub)).expect("sub").is_empty());
    assert!(
        query::get_reference(store.conn(), reference.id)
            .expect("read")
            .is_none()
    );
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

#[test]
fn reconcile_keeps_earliest_duplicate_and_moves_later_one() {
    let (_dir, mut store) = open_store();
    let (_, sub) = hierarchy(&mut store);
    create_item(&mut store, ListId::Sub(sub), &titled("Five"), "ana", Some(5)).expect("five");

    // Two rows at 4 with distinct creation times, as left by an unchecked writer.
    store
        .conn()
        .execute(
            "INSERT INTO rank_items (title, position, owner, sub_category_id, created_at_us, updated_at_us)
             VALUES ('t2', 4, 'ana', ?1, 2000, 2000), ('t1', 4, 'ana', ?1, 1000, 1000)",
            params![sub],
        )
        .expect("insert duplicates");

    let report = reconcile(&mut store, &ReconcileOptions::default()).expect("reconcile");
    assert_eq!(report.duplicates_moved, 1);

    let list = list_entries(store.conn(), ListId::Sub(sub)).expect("list");
    let at = |title: &str| {
        list.entries
            .iter()
            .find(|entry| entry.title() == title)
            .and_then(ListEntry::position)
    };
    assert_eq!(at("t1"), Some(4));
    assert_eq!(at("t2"), Some(6), "slot 5 is taken, so the next open one");

    let again = reconcile(&mut store, &ReconcileOptions::default()).expect("second run");
    assert_eq!(again.total_changes(), 0);
}

#[test]
fn reconcile_repairs_dangling_reference_left_by_raw_delete() {
    let (_dir, mut store) = open_store();
    let (main, sub) = hierarchy(&mut store);
    let item =
        create_item(&mut store, ListId::Sub(sub), &titled("Shane"), "ana", None).expect("item");
    create_reference(&mut store, main, item.id, None).expect("reference");

    store
        .conn()
        .execute_batch(&format!(
            "PRAGMA foreign_keys = OFF;
             DELETE FROM rank_items WHERE item_id = {};
             PRAGMA foreign_keys = ON;",
            item.id
        ))
        .expect("raw delete");

    let report = reconcile(&mut store, &ReconcileOptions::default()).expect("reconcile");
    assert_eq!(report.dangling_references_deleted, 1);
    assert!(
        query::references_in_main(store.conn(), main)
            .expect("refs")
            .is_empty()
    );
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn invalid_moves_and_placements_leave_store_untouched() {
    let (_dir, mut store) = open_store();
    let (main, sub) = hierarchy(&mut store);
    let item =
        create_item(&mut store, ListId::Sub(sub), &titled("High Noon"), "ana", Some(3)).expect("i");

    let err = move_entry(&mut store, EntryHandle::Item(item.id), 12).expect_err("range");
    assert!(matches!(err, TopElevenError::PositionOutOfRange { position: 12 }));

    let err = create_reference(&mut store, main + 1, item.id, None).expect_err("no main");
    assert!(matches!(err, TopElevenError::NotFound { .. }));

    assert_eq!(positions(&store, ListId::Sub(sub)), vec![3]);
    assert!(list_entries(store.conn(), ListId::Main(main)).expect("main").is_empty());
}

#[test]
fn reopening_store_preserves_lists() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state").join("topeleven.db");
    {
        let mut store = Store::open(&path, DEFAULT_BUSY_TIMEOUT).expect("open");
        let (_, sub) = hierarchy(&mut store);
        create_item(&mut store, ListId::Sub(sub), &titled("Stagecoach"), "ana", Some(7))
            .expect("item");
    }
    let store = Store::open(&path, DEFAULT_BUSY_TIMEOUT).expect("reopen");
    assert_eq!(positions(&store, ListId::Sub(1)), vec![7]);
}
