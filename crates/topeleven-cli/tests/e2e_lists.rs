//! E2E tests for list building: categories, items, references, moves.
//!
//! Each test runs `t11` as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the t11 binary, rooted in `dir`.
fn t11(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("t11"));
    cmd.current_dir(dir);
    cmd.env("T11_OWNER", "ana");
    cmd.env("T11_LOG", "error");
    // Keep the developer's own user config out of the run.
    cmd.env("XDG_CONFIG_HOME", dir.join(".xdg"));
    cmd.env_remove("FORMAT");
    cmd
}

fn init_project(dir: &Path) {
    t11(dir).arg("init").assert().success();
}

/// Run a command with `--json` and parse stdout, asserting success.
fn json_ok(dir: &Path, args: &[&str]) -> Value {
    let output = t11(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("t11 should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
}

/// Run a command with `--json`, assert failure, and return the error code.
fn json_err(dir: &Path, args: &[&str]) -> String {
    let output = t11(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("t11 should not crash");
    assert!(!output.status.success(), "{args:?} unexpectedly succeeded");
    let stderr = String::from_utf8_lossy(&output.stderr);
    let start = stderr.find('{').expect("JSON error on stderr");
    // The JSON document is followed by the plain `Error:` line from main.
    let json: Value = serde_json::Deserializer::from_str(&stderr[start..])
        .into_iter::<Value>()
        .next()
        .expect("one JSON document")
        .expect("valid error JSON");
    json["error"]["error_code"]
        .as_str()
        .expect("error_code field")
        .to_string()
}

fn id_of(value: &Value) -> String {
    value["id"].as_i64().expect("id field").to_string()
}

/// A main category with one sub category; returns (main, sub).
fn setup_categories(dir: &Path) -> (String, String) {
    let main = id_of(&json_ok(dir, &["category", "add-main", "Films"]));
    let sub = id_of(&json_ok(dir, &["category", "add-sub", "--main", &main, "Noir"]));
    (main, sub)
}

fn positions(list: &Value) -> Vec<i64> {
    list["entries"]
        .as_array()
        .expect("entries array")
        .iter()
        .map(|entry| {
            let holder = if entry["entry"] == "reference_entry" {
                &entry["reference"]
            } else {
                entry
            };
            holder["position"].as_i64().expect("ranked position")
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn init_twice_requires_force() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    assert!(dir.path().join(".topeleven/config.toml").exists());
    assert!(dir.path().join(".topeleven/topeleven.db").exists());

    assert_eq!(json_err(dir.path(), &["init"]), "already_initialized");
    let report = json_ok(dir.path(), &["init", "--force"]);
    assert_eq!(report["schema_version"], 2);
}

#[test]
fn commands_before_init_report_not_initialized() {
    let dir = TempDir::new().expect("tempdir");
    assert_eq!(json_err(dir.path(), &["category", "list"]), "E1001");
}

#[test]
fn items_fill_lowest_free_slots() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let (_main, sub) = setup_categories(dir.path());

    for (title, slot) in [("A", "1"), ("B", "2"), ("C", "3"), ("D", "5"), ("E", "7")] {
        json_ok(
            dir.path(),
            &["item", "add", "--sub", &sub, title, "--position", slot],
        );
    }

    let alloc = json_ok(dir.path(), &["alloc", "--sub", &sub]);
    assert_eq!(alloc["position"], 4);
    assert_eq!(alloc["full"], false);

    let added = json_ok(dir.path(), &["item", "add", "--sub", &sub, "F"]);
    assert_eq!(added["position"], 4);

    let list = json_ok(dir.path(), &["show", "--sub", &sub]);
    assert_eq!(positions(&list), vec![1, 2, 3, 4, 5, 7]);
}

#[test]
fn explicit_slot_conflicts_and_range_errors() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let (_main, sub) = setup_categories(dir.path());

    json_ok(dir.path(), &["item", "add", "--sub", &sub, "A", "--position", "3"]);
    assert_eq!(
        json_err(
            dir.path(),
            &["item", "add", "--sub", &sub, "B", "--position", "3"]
        ),
        "E4002"
    );
    assert_eq!(
        json_err(
            dir.path(),
            &["item", "add", "--sub", &sub, "B", "--position", "12"]
        ),
        "E2001"
    );
    assert_eq!(
        json_err(
            dir.path(),
            &["item", "add", "--sub", &sub, "B", "--position", "-1"]
        ),
        "E2001"
    );
}

#[test]
fn full_list_rejects_auto_placement() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let (_main, sub) = setup_categories(dir.path());

    for n in 1..=11 {
        json_ok(dir.path(), &["item", "add", "--sub", &sub, &format!("T{n}")]);
    }
    let alloc = json_ok(dir.path(), &["alloc", "--sub", &sub]);
    assert_eq!(alloc["full"], true);
    assert_eq!(alloc["position"], 11);

    assert_eq!(
        json_err(dir.path(), &["item", "add", "--sub", &sub, "T12"]),
        "E2003"
    );
}

#[test]
fn reference_shares_main_list_with_direct_items() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let (main, sub) = setup_categories(dir.path());

    json_ok(dir.path(), &["item", "add", "--main", &main, "Heat", "--position", "3"]);
    let noir = json_ok(dir.path(), &["item", "add", "--sub", &sub, "Laura"]);
    let noir_id = id_of(&noir);

    let reference = json_ok(
        dir.path(),
        &["ref", "add", &noir_id, "--main", &main, "--position", "5"],
    );
    assert_eq!(reference["position"], 5);

    let alloc = json_ok(dir.path(), &["alloc", "--main", &main]);
    assert_eq!(alloc["position"], 1);

    let list = json_ok(dir.path(), &["show", "--main", &main]);
    let entries = list["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["entry"], "direct_item");
    assert_eq!(entries[0]["title"], "Heat");
    assert_eq!(entries[1]["entry"], "reference_entry");
    assert_eq!(entries[1]["target"]["title"], "Laura");
    // The reference's slot is independent of the item's own.
    assert_eq!(entries[1]["target"]["position"], 1);

    assert_eq!(
        json_err(dir.path(), &["ref", "add", &noir_id, "--main", &main]),
        "E4001"
    );
}

#[test]
fn reference_from_foreign_main_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let (_main, sub) = setup_categories(dir.path());
    let other = id_of(&json_ok(dir.path(), &["category", "add-main", "Books"]));
    let item = id_of(&json_ok(dir.path(), &["item", "add", "--sub", &sub, "Laura"]));

    assert_eq!(
        json_err(dir.path(), &["ref", "add", &item, "--main", &other]),
        "E2004"
    );
}

#[test]
fn move_swaps_with_occupant() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let (main, sub) = setup_categories(dir.path());

    let heat = id_of(&json_ok(
        dir.path(),
        &["item", "add", "--main", &main, "Heat", "--position", "1"],
    ));
    let laura = id_of(&json_ok(dir.path(), &["item", "add", "--sub", &sub, "Laura"]));
    let reference = id_of(&json_ok(
        dir.path(),
        &["ref", "add", &laura, "--main", &main, "--position", "4"],
    ));

    let outcome = json_ok(dir.path(), &["move", "ref", &reference, "1"]);
    assert_eq!(outcome["from"], 4);
    assert_eq!(outcome["to"], 1);
    assert_eq!(outcome["displaced"]["kind"], "item");

    let list = json_ok(dir.path(), &["show", "--main", &main]);
    let entries = list["entries"].as_array().expect("entries");
    assert_eq!(entries[0]["entry"], "reference_entry");
    assert_eq!(entries[1]["id"].as_i64().map(|id| id.to_string()), Some(heat));
    assert_eq!(entries[1]["position"], 4);

    assert_eq!(json_err(dir.path(), &["move", "item", &laura, "0"]), "E2001");
    assert_eq!(json_err(dir.path(), &["move", "item", "999", "2"]), "E3003");
}

#[test]
fn deleting_item_converts_its_references() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let (main, sub) = setup_categories(dir.path());

    let laura = id_of(&json_ok(
        dir.path(),
        &[
            "item",
            "add",
            "--sub",
            &sub,
            "Laura",
            "--description",
            "1944",
            "--url",
            "https://example.org/laura",
        ],
    ));
    json_ok(
        dir.path(),
        &["ref", "add", &laura, "--main", &main, "--position", "6"],
    );

    let outcome = json_ok(dir.path(), &["item", "rm", &laura]);
    let converted = outcome["converted"].as_array().expect("converted");
    assert_eq!(converted.len(), 1);
    assert_eq!(converted[0]["position"], 6);

    let sub_list = json_ok(dir.path(), &["show", "--sub", &sub]);
    assert!(sub_list["entries"].as_array().expect("entries").is_empty());

    let main_list = json_ok(dir.path(), &["show", "--main", &main]);
    let entries = main_list["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["entry"], "direct_item");
    assert_eq!(entries[0]["title"], "Laura");
    assert_eq!(entries[0]["description"], "1944");
    assert_eq!(entries[0]["url"], Value::Null);
    assert_eq!(entries[0]["position"], 6);
}

#[test]
fn edit_updates_content_only() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let (_main, sub) = setup_categories(dir.path());
    let item = json_ok(
        dir.path(),
        &["item", "add", "--sub", &sub, "Laura", "--url", "https://x", "--position", "2"],
    );
    let id = id_of(&item);

    let edited = json_ok(
        dir.path(),
        &["item", "edit", &id, "--title", "Laura (1944)", "--clear-url"],
    );
    assert_eq!(edited["title"], "Laura (1944)");
    assert_eq!(edited["url"], Value::Null);
    assert_eq!(edited["position"], 2);

    assert_eq!(json_err(dir.path(), &["item", "edit", &id]), "E2005");
    assert_eq!(
        json_err(dir.path(), &["item", "edit", &id, "--title", "  "]),
        "E2005"
    );
}

#[test]
fn other_owner_cannot_mutate() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let (main, _sub) = setup_categories(dir.path());

    let output = t11(dir.path())
        .args(["item", "add", "--main", &main, "Heat", "--owner", "bo", "--json"])
        .output()
        .expect("t11 should not crash");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("E4101"));

    // Reads need no ownership.
    t11(dir.path())
        .args(["show", "--main", &main, "--owner", "bo"])
        .assert()
        .success();
}

#[test]
fn missing_owner_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());

    t11(dir.path())
        .env_remove("T11_OWNER")
        .args(["category", "add-main", "Films", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing_owner"));
}

#[test]
fn category_list_shows_tree() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let (main, sub) = setup_categories(dir.path());

    let trees = json_ok(dir.path(), &["category", "list"]);
    let trees = trees.as_array().expect("array");
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0]["id"].as_i64().map(|id| id.to_string()), Some(main.clone()));
    assert_eq!(
        trees[0]["sub_categories"][0]["id"]
            .as_i64()
            .map(|id| id.to_string()),
        Some(sub)
    );

    t11(dir.path())
        .args(["category", "list", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main\t").and(predicate::str::contains("Noir")));

    json_ok(dir.path(), &["category", "rm-main", &main]);
    let trees = json_ok(dir.path(), &["category", "list"]);
    assert!(trees.as_array().expect("array").is_empty());
}

#[test]
fn text_show_lists_rows_in_rank_order() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let (_main, sub) = setup_categories(dir.path());
    json_ok(dir.path(), &["item", "add", "--sub", &sub, "Second", "--position", "2"]);
    json_ok(dir.path(), &["item", "add", "--sub", &sub, "First", "--position", "1"]);

    let output = t11(dir.path())
        .args(["show", "--sub", &sub, "--format", "text"])
        .output()
        .expect("t11 should not crash");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let titles: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split('\t').nth(2))
        .collect();
    assert_eq!(titles, vec!["First", "Second"]);
}
