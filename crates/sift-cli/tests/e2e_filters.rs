//! E2E CLI tests covering:
//! - Project setup (`sift init`) and the not-initialized error
//! - Saved filter lifecycle (`sift filter create/show/list/edit/favorite/delete`)
//! - Running filters (`sift items`, `sift count`) with visibility, negation,
//!   paging, and the browsed-project restriction
//! - Ad-hoc anonymous queries (`sift query`)
//! - Stable error codes in JSON and text output
//!
//! Each test runs the `sift` binary as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use rusqlite::{Connection, params};
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the sift binary, rooted in `dir`.
fn sift_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sift"));
    cmd.current_dir(dir);
    cmd.env("SIFT_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd.env_remove("SIFT_USER");
    cmd.env_remove("FORMAT");
    cmd
}

/// Initialize a project and seed it with projects, users, and items.
///
/// `alice` belongs to `p1` and `p2`; `p3` is private to nobody in the fixture;
/// `pub` is public.
fn init_seeded() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    sift_cmd(dir.path()).arg("init").assert().success();

    let conn = Connection::open(dir.path().join(".sift/sift.sqlite3")).expect("open store");
    for (project_id, is_public) in [("p1", 0), ("p2", 0), ("p3", 0), ("pub", 1)] {
        conn.execute(
            "INSERT INTO projects (project_id, title, is_public) VALUES (?1, ?1, ?2)",
            params![project_id, is_public],
        )
        .expect("insert project");
    }
    for user_id in ["alice", "bob"] {
        conn.execute("INSERT INTO users (user_id) VALUES (?1)", [user_id])
            .expect("insert user");
    }
    for project_id in ["p1", "p2"] {
        conn.execute(
            "INSERT INTO project_members (project_id, user_id) VALUES (?1, 'alice')",
            [project_id],
        )
        .expect("insert member");
    }

    let fixtures: &[(&str, &str, &str, Option<&str>, &str, &str)] = &[
        ("ITM-1", "p1", "open", Some("alice"), "Bug", "Login bug on mobile"),
        ("ITM-2", "p1", "closed", Some("bob"), "Task", "Release notes"),
        ("ITM-3", "p2", "blocked", None, "Bug", "Payment crash"),
        ("ITM-4", "p3", "open", Some("bob"), "Task", "Secret roadmap"),
        ("ITM-5", "pub", "created", None, "Bug", "Public login bug"),
        ("ITM-6", "pub", "open", Some("alice"), "Task", "Docs typo"),
    ];
    for (idx, (item_id, project_id, state, responsible, item_type, title)) in
        fixtures.iter().enumerate()
    {
        let at = i64::try_from(idx).expect("small index");
        conn.execute(
            "INSERT INTO items (item_id, project_id, title, description, state,
                                responsible_id, item_type, workflow_node,
                                created_at_us, updated_at_us)
             VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6, 'Backlog', ?7, ?8)",
            params![item_id, project_id, title, state, responsible, item_type, at, at + 100],
        )
        .expect("insert item");
    }
    dir
}

/// Run a command expected to succeed and parse its JSON stdout.
fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = sift_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON output")
}

/// Run a command expected to fail and return the JSON error code.
fn run_error_code(dir: &Path, args: &[&str]) -> String {
    let output = sift_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(!output.status.success(), "{args:?} unexpectedly succeeded");
    let json: Value = serde_json::from_slice(&output.stderr).expect("valid JSON error");
    json["error"]["error_code"]
        .as_str()
        .expect("error_code field")
        .to_string()
}

fn item_ids(json: &Value) -> Vec<String> {
    let mut ids: Vec<String> = json
        .as_array()
        .expect("item array")
        .iter()
        .map(|item| item["item_id"].as_str().expect("item_id").to_string())
        .collect();
    ids.sort();
    ids
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[test]
fn commands_before_init_report_not_initialized() {
    let dir = TempDir::new().expect("temp dir");
    assert_eq!(run_error_code(dir.path(), &["query"]), "E1001");

    sift_cmd(dir.path())
        .args(["--user", "alice", "items", "mine"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1001]"))
        .stderr(predicate::str::contains("sift init"));
}

#[test]
fn init_twice_requires_force() {
    let dir = TempDir::new().expect("temp dir");
    sift_cmd(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized .sift"));
    sift_cmd(dir.path()).arg("init").assert().failure();
    sift_cmd(dir.path()).args(["init", "--force"]).assert().success();
}

#[test]
fn malformed_project_config_reports_config_error() {
    let dir = init_seeded();
    std::fs::write(dir.path().join(".sift/config.toml"), "[query\npage_size = ").expect("write");
    assert_eq!(run_error_code(dir.path(), &["query"]), "E1002");
}

// ---------------------------------------------------------------------------
// Filter lifecycle
// ---------------------------------------------------------------------------

#[test]
fn create_show_and_list_filters() {
    let dir = init_seeded();
    let created = run_json(
        dir.path(),
        &["--user", "alice", "filter", "create", "triage", "--state", "open,blocked"],
    );
    let id = created["id"].as_str().expect("id");
    assert!(id.starts_with("flt-"));
    assert_eq!(created["owner"], "alice");
    assert_eq!(created["favorite"], false);
    let query = created["compiled_query"].as_str().expect("query");
    assert!(query.starts_with(" WHERE "));
    assert!(query.contains("$projects"));
    assert_eq!(created["selection"]["states"], serde_json::json!(["open", "blocked"]));

    let shown = run_json(dir.path(), &["--user", "alice", "filter", "show", "triage"]);
    assert_eq!(shown["id"], id);

    let listed = run_json(dir.path(), &["--user", "alice", "filter", "list"]);
    assert_eq!(listed.as_array().expect("array").len(), 1);

    let others = run_json(dir.path(), &["--user", "bob", "filter", "list"]);
    assert!(others.as_array().expect("array").is_empty());
}

#[test]
fn filter_names_are_unique_per_owner() {
    let dir = init_seeded();
    run_json(dir.path(), &["--user", "alice", "filter", "create", "mine"]);
    assert_eq!(
        run_error_code(dir.path(), &["--user", "alice", "filter", "create", "mine"]),
        "E2002"
    );
    run_json(dir.path(), &["--user", "bob", "filter", "create", "mine"]);
}

#[test]
fn saving_a_filter_requires_a_user() {
    let dir = init_seeded();
    assert_eq!(run_error_code(dir.path(), &["filter", "create", "nobody"]), "E1003");
    sift_cmd(dir.path())
        .args(["filter", "create", "nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1003]"));
}

#[test]
fn blank_filter_names_are_rejected() {
    let dir = init_seeded();
    assert_eq!(
        run_error_code(dir.path(), &["--user", "alice", "filter", "create", "  "]),
        "E2007"
    );
}

#[test]
fn reading_a_saved_filter_requires_a_user() {
    let dir = init_seeded();
    assert_eq!(run_error_code(dir.path(), &["filter", "list"]), "E1003");
}

#[test]
fn user_env_identifies_the_requester() {
    let dir = init_seeded();
    let output = sift_cmd(dir.path())
        .env("SIFT_USER", "alice")
        .args(["filter", "create", "envmade", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["owner"], "alice");
}

#[test]
fn edit_recompiles_from_new_selection() {
    let dir = init_seeded();
    run_json(
        dir.path(),
        &["--user", "alice", "filter", "create", "triage", "--state", "open"],
    );
    let before = run_json(dir.path(), &["--user", "alice", "items", "triage"]);
    assert_eq!(item_ids(&before), vec!["ITM-1", "ITM-6"]);

    let edited = run_json(
        dir.path(),
        &["--user", "alice", "filter", "edit", "triage", "--type", "Bug"],
    );
    assert_eq!(edited["selection"]["states"], serde_json::json!([]));
    assert_eq!(edited["selection"]["item_types"], serde_json::json!(["Bug"]));

    let after = run_json(dir.path(), &["--user", "alice", "items", "triage"]);
    assert_eq!(item_ids(&after), vec!["ITM-1", "ITM-3", "ITM-5"]);
}

#[test]
fn favorite_and_delete() {
    let dir = init_seeded();
    run_json(dir.path(), &["--user", "alice", "filter", "create", "a"]);
    run_json(dir.path(), &["--user", "alice", "filter", "create", "b"]);

    sift_cmd(dir.path())
        .args(["--user", "alice", "filter", "favorite", "b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("favorited filter 'b'"));
    let favorites = run_json(dir.path(), &["--user", "alice", "filter", "list", "--favorites"]);
    let names: Vec<&str> = favorites
        .as_array()
        .expect("array")
        .iter()
        .map(|f| f["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["b"]);

    run_json(dir.path(), &["--user", "alice", "filter", "favorite", "b", "--off"]);
    let favorites = run_json(dir.path(), &["--user", "alice", "filter", "list", "--favorites"]);
    assert!(favorites.as_array().expect("array").is_empty());

    run_json(dir.path(), &["--user", "alice", "filter", "delete", "a"]);
    assert_eq!(
        run_error_code(dir.path(), &["--user", "alice", "filter", "show", "a"]),
        "E2001"
    );
}

// ---------------------------------------------------------------------------
// Running filters
// ---------------------------------------------------------------------------

#[test]
fn saved_filter_sees_member_and_public_projects() {
    let dir = init_seeded();
    run_json(dir.path(), &["--user", "alice", "filter", "create", "all"]);
    let items = run_json(dir.path(), &["--user", "alice", "items", "all"]);
    assert_eq!(
        item_ids(&items),
        vec!["ITM-1", "ITM-2", "ITM-3", "ITM-5", "ITM-6"]
    );

    let count = run_json(dir.path(), &["--user", "alice", "count", "all"]);
    assert_eq!(count["filter"], "all");
    assert_eq!(count["count"], 5);
}

#[test]
fn negated_responsible_includes_unassigned_items() {
    let dir = init_seeded();
    run_json(
        dir.path(),
        &[
            "--user",
            "alice",
            "filter",
            "create",
            "not-mine",
            "--responsible",
            "alice",
            "--not-responsible",
        ],
    );
    let items = run_json(dir.path(), &["--user", "alice", "items", "not-mine"]);
    assert_eq!(item_ids(&items), vec!["ITM-2", "ITM-3", "ITM-5"]);
}

#[test]
fn explicit_projects_and_browsed_project_restrict_results() {
    let dir = init_seeded();
    run_json(
        dir.path(),
        &["--user", "alice", "filter", "create", "p1", "--project", "p1"],
    );
    let items = run_json(dir.path(), &["--user", "alice", "items", "p1"]);
    assert_eq!(item_ids(&items), vec!["ITM-1", "ITM-2"]);

    run_json(dir.path(), &["--user", "alice", "filter", "create", "all"]);
    let browsed = run_json(
        dir.path(),
        &["--user", "alice", "items", "all", "--in-project", "pub"],
    );
    assert_eq!(item_ids(&browsed), vec!["ITM-5", "ITM-6"]);
    let count = run_json(
        dir.path(),
        &["--user", "alice", "count", "all", "--in-project", "p2"],
    );
    assert_eq!(count["count"], 1);
}

#[test]
fn items_are_paged_and_ordered() {
    let dir = init_seeded();
    run_json(dir.path(), &["--user", "alice", "filter", "create", "all"]);

    let first = run_json(
        dir.path(),
        &["--user", "alice", "items", "all", "--limit", "2"],
    );
    let ids: Vec<&str> = first
        .as_array()
        .expect("array")
        .iter()
        .map(|item| item["item_id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec!["ITM-6", "ITM-5"]);

    let oldest = run_json(
        dir.path(),
        &[
            "--user",
            "alice",
            "items",
            "all",
            "--order-by",
            "id",
            "--direction",
            "ascending",
            "--offset",
            "1",
            "--limit",
            "2",
        ],
    );
    let ids: Vec<&str> = oldest
        .as_array()
        .expect("array")
        .iter()
        .map(|item| item["item_id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec!["ITM-2", "ITM-3"]);
}

#[test]
fn text_output_has_header_row() {
    let dir = init_seeded();
    sift_cmd(dir.path())
        .args(["query", "--state", "open", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id  state  type  node  responsible  title"))
        .stdout(predicate::str::contains("ITM-6  open  Task  Backlog  alice  Docs typo"));
}

#[test]
fn selecting_projects_outside_visibility_is_rejected() {
    let dir = init_seeded();
    assert_eq!(
        run_error_code(dir.path(), &["--user", "bob", "filter", "create", "p1", "--project", "p1"]),
        "E2004"
    );
    assert_eq!(
        run_error_code(dir.path(), &["--user", "alice", "filter", "create", "x", "--project", "p3"]),
        "E2004"
    );

    run_json(dir.path(), &["--user", "alice", "filter", "create", "mine", "--project", "p1"]);
    assert_eq!(
        run_error_code(
            dir.path(),
            &["--user", "alice", "filter", "edit", "mine", "--project", "p1,p3"]
        ),
        "E2004"
    );
    let unchanged = run_json(dir.path(), &["--user", "alice", "filter", "show", "mine"]);
    assert_eq!(unchanged["selection"]["projects"], serde_json::json!(["p1"]));
}

#[test]
fn negated_projects_stay_within_visibility() {
    let dir = init_seeded();
    run_json(
        dir.path(),
        &["--user", "alice", "filter", "create", "not-pub", "--project", "pub", "--not-project"],
    );
    let items = run_json(dir.path(), &["--user", "alice", "items", "not-pub"]);
    assert_eq!(item_ids(&items), vec!["ITM-1", "ITM-2", "ITM-3"]);

    let anonymous = run_json(dir.path(), &["query", "--project", "pub", "--not-project"]);
    assert!(anonymous.as_array().expect("array").is_empty());
}

// ---------------------------------------------------------------------------
// Ad-hoc queries
// ---------------------------------------------------------------------------

#[test]
fn anonymous_query_sees_only_public_projects() {
    let dir = init_seeded();
    let items = run_json(dir.path(), &["query"]);
    assert_eq!(item_ids(&items), vec!["ITM-5", "ITM-6"]);

    let text = run_json(dir.path(), &["query", "--text", "login"]);
    assert_eq!(item_ids(&text), vec!["ITM-5"]);
}

#[test]
fn anonymous_query_cannot_select_private_projects() {
    let dir = init_seeded();
    assert_eq!(run_error_code(dir.path(), &["query", "--project", "p3"]), "E2004");
    sift_cmd(dir.path())
        .args(["query", "--project", "p1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project 'p1' is not visible"));

    let public = run_json(dir.path(), &["query", "--project", "pub"]);
    assert_eq!(item_ids(&public), vec!["ITM-5", "ITM-6"]);
}

#[test]
fn registered_query_excludes_negated_states() {
    let dir = init_seeded();
    let items = run_json(
        dir.path(),
        &["--user", "alice", "query", "--state", "closed,created", "--not-state"],
    );
    assert_eq!(item_ids(&items), vec!["ITM-1", "ITM-3", "ITM-6"]);
}

#[test]
fn query_by_exact_item_id() {
    let dir = init_seeded();
    let items = run_json(dir.path(), &["--user", "alice", "query", "--id", "ITM-3"]);
    assert_eq!(item_ids(&items), vec!["ITM-3"]);

    let hidden = run_json(dir.path(), &["--user", "alice", "query", "--id", "ITM-4"]);
    assert!(hidden.as_array().expect("array").is_empty());
}
