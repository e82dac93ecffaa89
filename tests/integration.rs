use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn tb_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("tb");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    // Docs directory for index sync
    let docs_dir = root.join("docs");
    fs::create_dir_all(&docs_dir).unwrap();
    fs::write(
        docs_dir.join("runbook.md"),
        "# Deployment Runbook\n\nHow we ship.\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/team.db"

[team]
members = ["Queen", "Fizz", "Buzz", "Pazz", "Rizz"]
reviewer = "Pazz"
default_author = "Fizz"

[vocab]
areas = ["ui", "api", "database"]

[protected]
extra_globs = []

[docs_index]
root = "{root}/docs"
include_globs = ["**/*.md"]
exclude_globs = []
"#,
        root = root.display()
    );

    let config_path = config_dir.join("teambase.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_tb(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = tb_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run tb binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn add_bug(config_path: &Path, title: &str) -> String {
    let (stdout, stderr, success) = run_tb(
        config_path,
        &["bugs", "add", "--title", title, "--area", "ui", "--priority", "high"],
    );
    assert!(success, "bugs add failed: {} {}", stdout, stderr);
    stdout
        .trim()
        .strip_prefix("Created bug: ")
        .expect("unexpected bugs add output")
        .to_string()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_tb(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent_and_preserves_data() {
    let (_tmp, config_path) = setup_test_env();

    run_tb(&config_path, &["init"]);
    add_bug(&config_path, "Toast never dismisses");

    let (_, _, success) = run_tb(&config_path, &["init"]);
    assert!(success, "second init failed (not idempotent)");

    let (stdout, _, success) = run_tb(&config_path, &["bugs", "list"]);
    assert!(success);
    assert!(stdout.contains("BUG-001"), "data lost after re-init: {}", stdout);
}

#[test]
fn test_bugs_add_list_update() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let bug_id = add_bug(&config_path, "Toast never dismisses");
    assert_eq!(bug_id, "BUG-001");
    let bug_id = add_bug(&config_path, "Login loops forever");
    assert_eq!(bug_id, "BUG-002");

    let (stdout, _, success) = run_tb(&config_path, &["bugs", "list", "--status", "open"]);
    assert!(success);
    assert!(stdout.contains("BUG-001"));
    assert!(stdout.contains("BUG-002"));

    let (stdout, _, success) = run_tb(
        &config_path,
        &["bugs", "update", "--id", "BUG-002", "--status", "done", "--owner", "Buzz"],
    );
    assert!(success, "update failed: {}", stdout);

    let (stdout, _, _) = run_tb(&config_path, &["bugs", "list", "--id", "BUG-002", "--json"]);
    assert!(stdout.contains("\"status\": \"done\""));
    assert!(stdout.contains("\"owner\": \"Buzz\""));
}

#[test]
fn test_bugs_add_rejects_unknown_area() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (_, stderr, success) = run_tb(
        &config_path,
        &["bugs", "add", "--title", "Broken thing", "--area", "warp-drive"],
    );
    assert!(!success);
    assert!(stderr.contains("Invalid area"), "stderr: {}", stderr);
}

#[test]
fn test_bugs_add_rejects_short_title() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (_, stderr, success) = run_tb(
        &config_path,
        &["bugs", "add", "--title", "bad", "--area", "ui"],
    );
    assert!(!success);
    assert!(stderr.contains("at least 5 characters"), "stderr: {}", stderr);
}

#[test]
fn test_board_post_and_list() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (stdout, stderr, success) = run_tb(
        &config_path,
        &["board", "post", "--type", "status", "--content", "Starting on the toast work"],
    );
    assert!(success, "post failed: {} {}", stdout, stderr);
    assert!(stdout.contains("Posted message: 1"));

    let (stdout, _, success) = run_tb(&config_path, &["board", "list"]);
    assert!(success);
    assert!(stdout.contains("Starting on the toast work"));
    assert!(stdout.contains("Fizz"));
}

#[test]
fn test_board_assignment_requires_mentions() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (_, stderr, success) = run_tb(
        &config_path,
        &["board", "post", "--type", "assignment", "--content", "Please fix the toast"],
    );
    assert!(!success);
    assert!(stderr.contains("at least one --mentions"), "stderr: {}", stderr);
}

#[test]
fn test_board_bug_post_routes_to_bugs_table() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (stdout, stderr, success) = run_tb(
        &config_path,
        &[
            "board", "post", "--type", "bug",
            "--content", "Sidebar collapses on resize",
            "--data", r#"{"area": "ui", "priority": "high"}"#,
        ],
    );
    assert!(success, "routed post failed: {} {}", stdout, stderr);
    assert!(stdout.contains("Posted message: 1 -> BUG-1"), "stdout: {}", stdout);

    let (stdout, _, _) = run_tb(&config_path, &["bugs", "list", "--id", "BUG-1", "--json"]);
    assert!(stdout.contains("Sidebar collapses on resize"));
    assert!(stdout.contains("\"found_by\": \"Fizz\""));

    // The message itself carries the routing stamp
    let (stdout, _, _) = run_tb(&config_path, &["board", "list", "--json"]);
    assert!(stdout.contains("\"routed_to\": \"bugs\""));
    assert!(stdout.contains("\"routed_id\": \"BUG-1\""));
}

#[test]
fn test_board_learning_post_routes() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (stdout, _, success) = run_tb(
        &config_path,
        &[
            "board", "post", "--type", "learning",
            "--content", "SQLite upserts need an explicit conflict target",
            "--data", r#"{"category": "database"}"#,
        ],
    );
    assert!(success, "learning post failed: {}", stdout);
    assert!(stdout.contains("-> 1"));

    let (stdout, _, _) = run_tb(&config_path, &["learn", "list"]);
    assert!(stdout.contains("SQLite upserts"));
}

#[test]
fn test_completion_claim_gate() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);
    add_bug(&config_path, "Toast never dismisses");

    // BUG-001 is open, so claiming it is fixed must fail
    let (_, stderr, success) = run_tb(
        &config_path,
        &["board", "post", "--type", "status", "--content", "BUG-001 is fixed now"],
    );
    assert!(!success);
    assert!(stderr.contains("Workflow violation"), "stderr: {}", stderr);

    // Merely mentioning the bug is fine
    let (stdout, stderr, success) = run_tb(
        &config_path,
        &["board", "post", "--type", "status", "--content", "Investigating BUG-001, race suspected"],
    );
    assert!(success, "mention post failed: {} {}", stdout, stderr);
}

#[test]
fn test_work_session_full_flow() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);
    add_bug(&config_path, "Toast never dismisses");

    // Start surfaces the context and claims the bug
    let (stdout, stderr, success) = run_tb(&config_path, &["work", "start", "BUG-001"]);
    assert!(success, "start failed: {} {}", stdout, stderr);
    assert!(stdout.contains("=== WORK CONTEXT FOR BUG-001 ==="));

    let (stdout, _, _) = run_tb(&config_path, &["bugs", "list", "--id", "BUG-001", "--json"]);
    assert!(stdout.contains("\"status\": \"in_progress\""));
    assert!(stdout.contains("\"owner\": \"Fizz\""));

    // Track work
    let (stdout, _, success) = run_tb(
        &config_path,
        &["work", "touch", "src/components/Toast.tsx"],
    );
    assert!(success, "touch failed: {}", stdout);
    let (_, _, success) = run_tb(&config_path, &["work", "note", "Handler never attached"]);
    assert!(success);

    let (stdout, _, success) = run_tb(&config_path, &["work", "status"]);
    assert!(success);
    assert!(stdout.contains("src/components/Toast.tsx"));
    assert!(stdout.contains("Handler never attached"));

    // Complete moves the bug to review and writes the changelog
    let (stdout, stderr, success) = run_tb(
        &config_path,
        &[
            "work", "complete", "BUG-001",
            "--summary", "Attached the dismiss handler",
            "--root-cause", "Handler never registered on mount",
        ],
    );
    assert!(success, "complete failed: {} {}", stdout, stderr);
    assert!(stdout.contains("BUG-001 completed and moved to review."));

    let (stdout, _, _) = run_tb(&config_path, &["bugs", "list", "--id", "BUG-001", "--json"]);
    assert!(stdout.contains("\"status\": \"review\""));
    assert!(stdout.contains("Attached the dismiss handler"));

    let (stdout, _, _) = run_tb(&config_path, &["history", "list"]);
    assert!(stdout.contains("Fix BUG-001"));

    // Now the completion claim passes the gate
    let (_, _, success) = run_tb(
        &config_path,
        &["board", "post", "--type", "status", "--content", "BUG-001 fixed"],
    );
    assert!(success);

    // Learning and review
    let (stdout, _, success) = run_tb(
        &config_path,
        &["work", "learn", "BUG-001", "--learning", "Attach handlers inside effects"],
    );
    assert!(success, "learn failed: {}", stdout);
    assert!(stdout.contains("Logged learning"));

    let (stdout, _, success) = run_tb(&config_path, &["work", "review", "BUG-001"]);
    assert!(success, "review failed: {}", stdout);
    assert!(stdout.contains("Review requested from @Pazz"));

    let (stdout, _, _) = run_tb(
        &config_path,
        &["board", "list", "--type", "review_request", "--mentions", "@Pazz"],
    );
    assert!(stdout.contains("Review requested for BUG-001"));
}

#[test]
fn test_work_touch_rejects_protected_paths() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);
    add_bug(&config_path, "Toast never dismisses");
    run_tb(&config_path, &["work", "start", "BUG-001"]);

    for path in ["QA/api/auth.test.ts", "src/components/Toast.test.tsx", "e2e/smoke.ts"] {
        let (_, stderr, success) = run_tb(&config_path, &["work", "touch", path]);
        assert!(!success, "protected path accepted: {}", path);
        assert!(stderr.contains("Cannot modify test file"), "stderr: {}", stderr);
    }
}

#[test]
fn test_work_complete_requires_files() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);
    add_bug(&config_path, "Toast never dismisses");
    run_tb(&config_path, &["work", "start", "BUG-001"]);

    let (_, stderr, success) = run_tb(
        &config_path,
        &[
            "work", "complete", "BUG-001",
            "--summary", "Fixed it",
            "--root-cause", "Bad handler",
        ],
    );
    assert!(!success);
    assert!(stderr.contains("No files changed"), "stderr: {}", stderr);
}

#[test]
fn test_work_complete_rejects_protected_files_override() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);
    add_bug(&config_path, "Toast never dismisses");
    run_tb(&config_path, &["work", "start", "BUG-001"]);

    let (_, stderr, success) = run_tb(
        &config_path,
        &[
            "work", "complete", "BUG-001",
            "--summary", "Fixed it",
            "--root-cause", "Bad handler",
            "--files", "src/Toast.tsx,QA/api/auth.test.ts",
        ],
    );
    assert!(!success);
    assert!(stderr.contains("Cannot complete with test file"), "stderr: {}", stderr);
}

#[test]
fn test_work_complete_requires_root_cause_substance() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);
    add_bug(&config_path, "Toast never dismisses");
    run_tb(&config_path, &["work", "start", "BUG-001"]);
    run_tb(&config_path, &["work", "touch", "src/Toast.tsx"]);

    let (_, stderr, success) = run_tb(
        &config_path,
        &["work", "complete", "BUG-001", "--summary", "Fixed it", "--root-cause", "  "],
    );
    assert!(!success);
    assert!(stderr.contains("Root cause is required"), "stderr: {}", stderr);
}

#[test]
fn test_work_start_rejects_double_start_and_done_bugs() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);
    add_bug(&config_path, "Toast never dismisses");
    add_bug(&config_path, "Login loops forever");

    run_tb(&config_path, &["work", "start", "BUG-001"]);
    let (_, stderr, success) = run_tb(&config_path, &["work", "start", "BUG-001"]);
    assert!(!success);
    assert!(stderr.contains("already has an active session"), "stderr: {}", stderr);

    run_tb(&config_path, &["bugs", "update", "--id", "BUG-002", "--status", "done"]);
    let (_, stderr, success) = run_tb(&config_path, &["work", "start", "BUG-002"]);
    assert!(!success);
    assert!(stderr.contains("already done"), "stderr: {}", stderr);
}

#[test]
fn test_work_review_requires_completion() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);
    add_bug(&config_path, "Toast never dismisses");
    run_tb(&config_path, &["work", "start", "BUG-001"]);

    let (_, stderr, success) = run_tb(&config_path, &["work", "review", "BUG-001"]);
    assert!(!success);
    assert!(
        stderr.contains("before completing work"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_bugs_complete_escape_hatch() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);
    add_bug(&config_path, "Toast never dismisses");

    let (stdout, stderr, success) = run_tb(
        &config_path,
        &[
            "bugs", "complete", "BUG-001",
            "--summary", "Hotfixed in place",
            "--root-cause", "Stale cache entry",
            "--as", "Buzz",
        ],
    );
    assert!(success, "escape hatch failed: {} {}", stdout, stderr);
    assert!(stdout.contains("BUG-001 marked done."));

    let (stdout, _, _) = run_tb(&config_path, &["bugs", "list", "--id", "BUG-001", "--json"]);
    assert!(stdout.contains("\"status\": \"done\""));
    assert!(stdout.contains("\"owner\": \"Buzz\""));

    let (stdout, _, _) = run_tb(&config_path, &["board", "list"]);
    assert!(stdout.contains("BUG-001 marked DONE"));
}

#[test]
fn test_board_resolve_and_render() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    run_tb(
        &config_path,
        &["board", "post", "--type", "question", "--content", "Ship on Friday or Monday?"],
    );

    let (stdout, _, _) = run_tb(&config_path, &["board", "render"]);
    assert!(stdout.contains("# Team Board"));
    assert!(stdout.contains("[QUESTION] Fizz"));
    assert!(stdout.contains("Ship on Friday or Monday?"));

    let (stdout, _, success) = run_tb(&config_path, &["board", "resolve", "1"]);
    assert!(success, "resolve failed: {}", stdout);

    let (stdout, _, _) = run_tb(&config_path, &["board", "render"]);
    assert!(!stdout.contains("Ship on Friday or Monday?"));
}

#[test]
fn test_board_delete_own_recent_only() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    run_tb(
        &config_path,
        &["board", "post", "--type", "status", "--content", "Posted in error"],
    );

    // Another member cannot delete it
    let (_, stderr, success) = run_tb(&config_path, &["board", "delete", "1", "--as", "Buzz"]);
    assert!(!success);
    assert!(stderr.contains("your own messages"), "stderr: {}", stderr);

    // The author can, within the window
    let (stdout, _, success) = run_tb(&config_path, &["board", "delete", "1"]);
    assert!(success, "delete failed: {}", stdout);
    assert!(stdout.contains("Deleted message: 1"));
}

#[test]
fn test_docs_add_list_show() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (stdout, stderr, success) = run_tb(
        &config_path,
        &[
            "docs", "add",
            "--file", "src/components/Toast.tsx",
            "--symbol", "Toast",
            "--type", "component",
            "--line-start", "10",
            "--line-end", "80",
            "--purpose", "Renders transient notifications",
            "--why", "Keeps feedback out of the layout flow",
            "--area", "ui",
        ],
    );
    assert!(success, "docs add failed: {} {}", stdout, stderr);
    assert!(stdout.contains("Stored code doc: 1"));

    let (stdout, _, _) = run_tb(&config_path, &["docs", "list", "--area", "ui"]);
    assert!(stdout.contains("Toast"));
    assert!(stdout.contains("Renders transient notifications"));

    let (stdout, _, success) = run_tb(&config_path, &["docs", "show", "Toast"]);
    assert!(success);
    assert!(stdout.contains("--- Toast ---"));
    assert!(stdout.contains("Keeps feedback out of the layout flow"));
}

#[test]
fn test_docs_add_validates_inputs() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (_, stderr, success) = run_tb(
        &config_path,
        &[
            "docs", "add", "--file", "src/a.ts", "--type", "function",
            "--purpose", "Validates the thing properly", "--area", "ui",
            "--line-start", "50", "--line-end", "10",
        ],
    );
    assert!(!success);
    assert!(stderr.contains("line_end must be >= line_start"), "stderr: {}", stderr);
}

#[test]
fn test_bug_code_link_roundtrip() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);
    add_bug(&config_path, "Toast never dismisses");

    run_tb(
        &config_path,
        &[
            "docs", "add", "--file", "src/components/Toast.tsx", "--symbol", "Toast",
            "--type", "component", "--purpose", "Renders transient notifications",
            "--area", "ui",
        ],
    );

    let (stdout, _, success) = run_tb(
        &config_path,
        &["bugs", "link", "--id", "BUG-001", "--code-doc", "1", "--relationship", "root_cause"],
    );
    assert!(success, "link failed: {}", stdout);

    let (stdout, _, _) = run_tb(&config_path, &["bugs", "code", "--id", "BUG-001"]);
    assert!(stdout.contains("Toast"));
    assert!(stdout.contains("root_cause"));
}

#[test]
fn test_calls_and_tree() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    run_tb(
        &config_path,
        &[
            "docs", "add", "--file", "src/lib/api.ts", "--symbol", "fetchUser",
            "--type", "function", "--purpose", "Loads the current user record",
            "--area", "api",
        ],
    );
    run_tb(
        &config_path,
        &[
            "docs", "add", "--file", "src/lib/api.ts", "--symbol", "parseResponse",
            "--type", "function", "--purpose", "Decodes API response envelopes",
            "--area", "api",
        ],
    );

    let (stdout, stderr, success) = run_tb(
        &config_path,
        &[
            "calls", "add", "--caller", "1", "--callee", "2",
            "--callee-name", "parseResponse", "--line", "42",
        ],
    );
    assert!(success, "calls add failed: {} {}", stdout, stderr);

    let (stdout, _, success) = run_tb(&config_path, &["calls", "list", "--from", "fetchUser"]);
    assert!(success);
    assert!(stdout.contains("-> parseResponse (direct) @ line 42"));

    let (stdout, _, success) = run_tb(&config_path, &["tree", "fetchUser"]);
    assert!(success);
    assert!(stdout.contains("fetchUser"));
    assert!(stdout.contains("`-- parseResponse"));

    let (stdout, _, success) = run_tb(&config_path, &["tree", "parseResponse", "--callers"]);
    assert!(success);
    assert!(stdout.contains("fetchUser"));
}

#[test]
fn test_index_sync_and_list() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (stdout, stderr, success) = run_tb(&config_path, &["index", "sync"]);
    assert!(success, "index sync failed: {} {}", stdout, stderr);
    assert!(stdout.contains("scanned: 1 files"));
    assert!(stdout.contains("added: 1"));

    // Second sync updates rather than duplicates
    let (stdout, _, _) = run_tb(&config_path, &["index", "sync"]);
    assert!(stdout.contains("added: 0"));
    assert!(stdout.contains("updated: 1"));

    let (stdout, _, _) = run_tb(&config_path, &["index", "list"]);
    assert!(stdout.contains("runbook.md"));
    assert!(stdout.contains("Deployment Runbook"));
}

#[test]
fn test_curriculum_import_and_show() {
    let (tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let export = r#"{
        "content_blocks": [
            {"id": 100000, "content_type": "instruction", "content": "Welcome to the first exercise"}
        ],
        "prompts": [
            {"id": 100001, "prompt_text": "What energizes you?", "input_type": "textarea"}
        ],
        "tools": [
            {"id": 100002, "name": "List Builder"}
        ],
        "stem": [
            {"id": 1, "part": 1, "module": 1, "exercise": 1, "activity": 1, "sequence": 1,
             "block_type": "content", "content_id": 100000},
            {"id": 2, "part": 1, "module": 1, "exercise": 1, "activity": 1, "sequence": 2,
             "block_type": "prompt", "content_id": 100001},
            {"id": 3, "part": 1, "module": 1, "exercise": 2, "activity": 1, "sequence": 1,
             "block_type": "tool", "content_id": 100002}
        ]
    }"#;
    let export_path = tmp.path().join("curriculum.json");
    fs::write(&export_path, export).unwrap();

    let (stdout, stderr, success) = run_tb(
        &config_path,
        &["curriculum", "import", export_path.to_str().unwrap()],
    );
    assert!(success, "import failed: {} {}", stdout, stderr);
    assert!(stdout.contains("stem rows: 3"));
    assert!(stdout.contains("ok"));

    let (stdout, _, success) = run_tb(&config_path, &["curriculum", "show"]);
    assert!(success);
    assert!(stdout.contains("Welcome to the first exercise"));
    assert!(stdout.contains("What energizes you?"));
    assert!(stdout.contains("List Builder"));

    let (stdout, _, _) = run_tb(&config_path, &["curriculum", "show", "--module", "7"]);
    assert!(stdout.contains("No results found."));
}

#[test]
fn test_curriculum_import_rejects_dangling_refs() {
    let (tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let export = r#"{
        "content_blocks": [],
        "stem": [
            {"id": 1, "part": 1, "module": 1, "exercise": 1, "activity": 1, "sequence": 1,
             "block_type": "content", "content_id": 424242}
        ]
    }"#;
    let export_path = tmp.path().join("bad.json");
    fs::write(&export_path, export).unwrap();

    let (_, stderr, success) = run_tb(
        &config_path,
        &["curriculum", "import", export_path.to_str().unwrap()],
    );
    assert!(!success);
    assert!(stderr.contains("not in the export"), "stderr: {}", stderr);
}

#[test]
fn test_tasks_add_list_update() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (stdout, stderr, success) = run_tb(
        &config_path,
        &["tasks", "add", "--title", "Write release notes", "--owner", "Rizz", "--priority", "1"],
    );
    assert!(success, "tasks add failed: {} {}", stdout, stderr);
    assert!(stdout.contains("Created task: TASK-001"));

    let (stdout, _, _) = run_tb(&config_path, &["tasks", "list", "--owner", "Rizz"]);
    assert!(stdout.contains("Write release notes"));

    let (_, _, success) = run_tb(
        &config_path,
        &["tasks", "update", "--id", "TASK-001", "--status", "done"],
    );
    assert!(success);

    let (stdout, _, _) = run_tb(&config_path, &["tasks", "list", "--status", "done", "--json"]);
    assert!(stdout.contains("TASK-001"));
}

#[test]
fn test_decisions_add_and_list() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (stdout, _, success) = run_tb(
        &config_path,
        &[
            "decisions", "add",
            "--decision", "Store board state in SQLite",
            "--rationale", "Markdown files kept drifting from reality",
            "--area", "database",
            "--alternative", "Keep editing BOARD.md",
        ],
    );
    assert!(success, "decisions add failed: {}", stdout);

    let (stdout, _, _) = run_tb(&config_path, &["decisions", "list", "--area", "database"]);
    assert!(stdout.contains("Store board state in SQLite"));
}

#[test]
fn test_learn_add_validates_category() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (_, stderr, success) = run_tb(
        &config_path,
        &["learn", "add", "--category", "astrology", "--learning", "Mercury was in retrograde"],
    );
    assert!(!success);
    assert!(stderr.contains("Invalid category"), "stderr: {}", stderr);

    let (_, _, success) = run_tb(
        &config_path,
        &["learn", "add", "--category", "general", "--learning", "Mercury was in retrograde"],
    );
    assert!(success);
}

#[test]
fn test_history_add_validates_date() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);

    let (_, stderr, success) = run_tb(
        &config_path,
        &[
            "history", "add", "--title", "Swapped router",
            "--what-changed", "Replaced the custom router",
            "--why", "Edge cases in nested routes",
            "--date", "07-08-2026",
        ],
    );
    assert!(!success);
    assert!(stderr.contains("YYYY-MM-DD"), "stderr: {}", stderr);
}

#[test]
fn test_stats_reports_counts() {
    let (_tmp, config_path) = setup_test_env();
    run_tb(&config_path, &["init"]);
    add_bug(&config_path, "Toast never dismisses");

    let (stdout, _, success) = run_tb(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("bugs:"));
    assert!(stdout.contains("open: 1"));

    let (stdout, _, success) = run_tb(&config_path, &["stats", "--json"]);
    assert!(success);
    assert!(stdout.contains("\"bugs\": 1"));
}
