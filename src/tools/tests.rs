use super::invoke::{Coordinator, ToolOutcome, ToolResult};
use super::*;
use crate::consent::{ConsentError, ScriptedConsent};
use crate::message::{Part, Role, ToolCallRequest};
use crate::output::RecordingRenderer;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

fn sources(dir: &Path) -> ToolSources {
    ToolSources {
        root: dir.to_path_buf(),
        dirs: vec![dir.join("tools")],
        disabled: Vec::new(),
        todo_file: Some(dir.join("todos.md")),
        expenses_file: Some(dir.join("expenses.json")),
    }
}

fn registry(dir: &Path) -> ToolRegistry {
    ToolRegistry::discover(sources(dir)).0
}

fn run(registry: &ToolRegistry, name: &str, params: Value) -> Result<Value, ToolError> {
    registry.get(name).expect("tool registered").execute(params)
}

#[test]
fn test_registry_with_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, report) = ToolRegistry::discover(sources(dir.path()));
    assert_eq!(registry.len(), 24);
    assert_eq!(report.count, 24);
    assert!(report.warnings.is_empty());
    let specs = registry.specs();
    assert_eq!(specs[0].name, "read_file");
    assert_eq!(specs[1].name, "write_file");
    for name in [
        "calculate",
        "delete_directory",
        "record_expense",
        "list_expenses",
        "web_search",
        "scrape_url",
        "get_weather",
    ] {
        assert!(specs.iter().any(|s| s.name == name), "{name} missing");
    }
    assert!(specs.iter().all(|s| s.parameters["type"] == "object"));
}

#[test]
fn test_disabled_tools_are_left_out() {
    let dir = tempfile::tempdir().unwrap();
    let mut src = sources(dir.path());
    src.disabled = vec!["run_command".into(), "delete_file".into()];
    let (registry, _) = ToolRegistry::discover(src);
    assert_eq!(registry.len(), 22);
    assert!(registry.get("run_command").is_none());
    assert!(registry.get("read_file").is_some());
}

#[test]
fn test_summary_line() {
    assert_eq!(summary_line("First line.\nSecond line."), "First line.");
    assert_eq!(summary_line("\n  padded\n"), "padded");
    assert_eq!(summary_line(""), "No description available");
}

#[test]
fn test_read_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    let registry = registry(dir.path());
    let value = run(&registry, "read_file", json!({"file_path": "notes.txt"})).unwrap();
    assert_eq!(value, json!("hello"));
}

#[test]
fn test_read_file_nonexistent() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());
    let err = run(&registry, "read_file", json!({"file_path": "missing.txt"})).unwrap_err();
    assert_eq!(err.name, "FileNotFound");
}

#[test]
fn test_read_file_binary_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("blob.bin"), [0u8, 1, 2, 3]).unwrap();
    let registry = registry(dir.path());
    let err = run(&registry, "read_file", json!({"file_path": "blob.bin"})).unwrap_err();
    assert_eq!(err.name, "BinaryFile");
}

#[test]
fn test_missing_argument_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());
    let err = run(&registry, "read_file", json!({})).unwrap_err();
    assert_eq!(err.name, "InvalidArguments");
}

#[test]
fn test_write_file_creates_parents() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());
    run(
        &registry,
        "write_file",
        json!({"file_path": "a/b/c.txt", "content": "deep"}),
    )
    .unwrap();
    let written = std::fs::read_to_string(dir.path().join("a/b/c.txt")).unwrap();
    assert_eq!(written, "deep");
}

#[test]
fn test_list_files_sorted() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.txt"), "").unwrap();
    std::fs::write(dir.path().join("a.txt"), "").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    let registry = registry(dir.path());
    let value = run(&registry, "list_files", json!({})).unwrap();
    assert_eq!(value["files"], json!(["a.txt", "b.txt"]));
    assert_eq!(value["directories"], json!(["sub"]));
}

#[test]
fn test_search_files_recursive() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
    std::fs::write(dir.path().join("src/main.rs"), "").unwrap();
    std::fs::write(dir.path().join("src/nested/lib.rs"), "").unwrap();
    std::fs::write(dir.path().join("README.md"), "").unwrap();
    let registry = registry(dir.path());
    let value = run(&registry, "search_files", json!({"pattern": "*.rs"})).unwrap();
    let found: Vec<String> = serde_json::from_value(value).unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|p| p.ends_with(".rs")));
}

#[test]
fn test_move_and_delete_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("old.txt"), "x").unwrap();
    let registry = registry(dir.path());

    run(
        &registry,
        "move_file",
        json!({"source_path": "old.txt", "destination_path": "new/new.txt"}),
    )
    .unwrap();
    assert!(!dir.path().join("old.txt").exists());
    assert!(dir.path().join("new/new.txt").is_file());

    assert_eq!(
        run(&registry, "get_file_size", json!({"file_path": "new/new.txt"})).unwrap(),
        json!(1)
    );

    run(&registry, "delete_file", json!({"file_path": "new/new.txt"})).unwrap();
    assert!(!dir.path().join("new/new.txt").exists());
    let err = run(&registry, "delete_file", json!({"file_path": "new/new.txt"})).unwrap_err();
    assert_eq!(err.name, "FileNotFound");
}

#[test]
fn test_delete_directory_removes_tree() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("build/cache/deep")).unwrap();
    std::fs::write(dir.path().join("build/cache/deep/blob.bin"), "x").unwrap();
    std::fs::write(dir.path().join("keep.txt"), "k").unwrap();
    let registry = registry(dir.path());

    let msg = run(&registry, "delete_directory", json!({"directory_path": "build"})).unwrap();
    assert_eq!(msg, json!("Successfully deleted directory 'build'."));
    assert!(!dir.path().join("build").exists());
    assert!(dir.path().join("keep.txt").exists());

    let err = run(&registry, "delete_directory", json!({"directory_path": "build"})).unwrap_err();
    assert_eq!(err.name, "FileNotFound");
    // Files are not directories.
    let err = run(&registry, "delete_directory", json!({"directory_path": "keep.txt"})).unwrap_err();
    assert_eq!(err.name, "FileNotFound");
    assert!(dir.path().join("keep.txt").exists());
}

#[test]
fn test_create_directory_twice_fails() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());
    run(&registry, "create_directory", json!({"directory_path": "out"})).unwrap();
    let err = run(&registry, "create_directory", json!({"directory_path": "out"})).unwrap_err();
    assert_eq!(err.name, "FileExists");
}

#[test]
fn test_run_command_reports_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());
    let value = run(
        &registry,
        "run_command",
        json!({"command": "echo out; echo err >&2; exit 3"}),
    )
    .unwrap();
    assert_eq!(value["stdout"], "out");
    assert_eq!(value["stderr"], "err");
    assert_eq!(value["returncode"], 3);
}

#[test]
fn test_todo_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());

    assert_eq!(
        run(&registry, "list_todos", json!({})).unwrap(),
        json!("Your todo list is empty.")
    );
    run(&registry, "add_todo", json!({"task": "buy milk"})).unwrap();
    run(&registry, "add_todo", json!({"task": "write report"})).unwrap();
    run(&registry, "complete_todo", json!({"task_number": 2})).unwrap();

    let listed = run(&registry, "list_todos", json!({})).unwrap();
    assert_eq!(listed, json!("1. - [ ] buy milk\n2. - [x] write report"));

    let err = run(&registry, "complete_todo", json!({"task_number": 5})).unwrap_err();
    assert_eq!(err.name, "InvalidTaskNumber");

    run(&registry, "clear_todos", json!({})).unwrap();
    assert!(!dir.path().join("todos.md").exists());
}

#[test]
fn test_record_and_list_expenses() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());

    assert_eq!(run(&registry, "list_expenses", json!({})).unwrap(), json!([]));

    let msg = run(
        &registry,
        "record_expense",
        json!({"category": "Food", "amount": 12.5, "date": "2024-03-01", "description": "lunch"}),
    )
    .unwrap();
    assert_eq!(msg, json!("Successfully recorded expense: 12.5 in Food on 2024-03-01."));
    run(
        &registry,
        "record_expense",
        json!({"category": "Transport", "amount": 3, "date": "2024-03-05"}),
    )
    .unwrap();
    run(
        &registry,
        "record_expense",
        json!({"category": "food", "amount": 8, "date": "2024-04-02"}),
    )
    .unwrap();

    let all = run(&registry, "list_expenses", json!({})).unwrap();
    assert_eq!(all.as_array().unwrap().len(), 3);

    let food = run(&registry, "list_expenses", json!({"category": "FOOD"})).unwrap();
    assert_eq!(food.as_array().unwrap().len(), 2);
    assert_eq!(food[0]["description"], "lunch");

    let march = run(
        &registry,
        "list_expenses",
        json!({"start_date": "2024-03-01", "end_date": "2024-03-31"}),
    )
    .unwrap();
    let categories: Vec<&str> = march
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["category"].as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["Food", "Transport"]);
}

#[test]
fn test_expense_dates_must_be_iso() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(dir.path());

    let err = run(
        &registry,
        "record_expense",
        json!({"category": "Food", "amount": 4, "date": "03/01/2024"}),
    )
    .unwrap_err();
    assert_eq!(err.name, "ValueError");
    assert!(err.description.contains("YYYY-MM-DD"));
    assert!(!dir.path().join("expenses.json").exists());

    let err = run(&registry, "list_expenses", json!({"end_date": "2024-13-01"})).unwrap_err();
    assert_eq!(err.name, "ValueError");
    assert!(err.description.contains("end_date"));
}

#[test]
fn test_corrupt_expense_ledger_starts_over() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("expenses.json"), "not json").unwrap();
    let registry = registry(dir.path());

    assert_eq!(run(&registry, "list_expenses", json!({})).unwrap(), json!([]));
    run(
        &registry,
        "record_expense",
        json!({"category": "Books", "amount": 20, "date": "2024-05-05"}),
    )
    .unwrap();
    let all = run(&registry, "list_expenses", json!({})).unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);
}

fn write_manifest(dir: &Path, file: &str, body: &str) {
    let tools = dir.join("tools");
    std::fs::create_dir_all(&tools).unwrap();
    std::fs::write(tools.join(file), body).unwrap();
}

#[test]
fn test_manifest_tool_env_and_stdin() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(
        dir.path(),
        "greet.toml",
        r#"
name = "greet"
description = "Say hello"
command = "printf 'hello %s' \"$TOOL_WHO\""

[parameters]
who = "Who to greet"
"#,
    );
    write_manifest(
        dir.path(),
        "echo.toml",
        r#"
name = "echo_json"
description = "Echo parameters back"
command = "cat"

[parameters]
text = "Anything"
"#,
    );
    let registry = registry(dir.path());
    assert_eq!(registry.len(), 26);

    let greet = registry.get("greet").unwrap();
    assert_eq!(greet.schema()["required"], json!(["who"]));
    assert_eq!(greet.execute(json!({"who": "world"})).unwrap(), json!("hello world"));

    let echoed = run(&registry, "echo_json", json!({"text": "hi"})).unwrap();
    assert_eq!(echoed, json!({"text": "hi"}));

    let err = greet.execute(json!({})).unwrap_err();
    assert_eq!(err.name, "InvalidArguments");
}

#[test]
fn test_manifest_large_stdin_with_chatty_command() {
    let dir = tempfile::tempdir().unwrap();
    // Fills stderr past the pipe buffer before reading any stdin.
    write_manifest(
        dir.path(),
        "count.toml",
        r#"
name = "count_bytes"
description = "Count stdin bytes"
command = "yes x | head -c 100000 >&2; wc -c"

[parameters]
text = "Payload"
"#,
    );
    let registry = registry(dir.path());
    let text = "a".repeat(100_000);
    let counted = run(&registry, "count_bytes", json!({ "text": text })).unwrap();
    assert_eq!(counted, json!(100_011));
}

#[test]
fn test_manifest_nonzero_exit_is_error() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(
        dir.path(),
        "fail.toml",
        "name = \"fail\"\ndescription = \"Always fails\"\ncommand = \"echo boom >&2; exit 2\"\n",
    );
    let registry = registry(dir.path());
    let err = run(&registry, "fail", json!({})).unwrap_err();
    assert_eq!(err.name, "CommandFailed");
    assert!(err.description.contains("boom"));
}

#[test]
fn test_bad_manifest_reported_and_reload_picks_up_changes() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "broken.toml", "name = ");
    let (mut registry, report) = ToolRegistry::discover(sources(dir.path()));
    assert_eq!(report.count, 24);
    assert_eq!(report.warnings.len(), 1);

    std::fs::remove_file(dir.path().join("tools/broken.toml")).unwrap();
    write_manifest(
        dir.path(),
        "date.toml",
        "name = \"date\"\ndescription = \"Print the date\"\ncommand = \"date\"\n",
    );
    let report = registry.reload();
    assert_eq!(report.count, 25);
    assert!(report.warnings.is_empty());
    assert!(registry.get("date").is_some());
}

// --- Coordinator ---

/// Counts executions; fails when asked to.
struct CountingTool {
    runs: std::sync::Arc<AtomicUsize>,
}

impl Tool for CountingTool {
    fn name(&self) -> &str {
        "counter"
    }

    fn description(&self) -> &str {
        "Counts"
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        if params["fail"] == json!(true) {
            return Err(ToolError::new("ValueError", "asked to fail"));
        }
        Ok(json!(n))
    }
}

struct PanickingTool;

impl Tool for PanickingTool {
    fn name(&self) -> &str {
        "panics"
    }

    fn description(&self) -> &str {
        "Panics"
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    fn execute(&self, _params: Value) -> Result<Value, ToolError> {
        panic!("tool bug");
    }
}

fn counting_registry() -> (ToolRegistry, std::sync::Arc<AtomicUsize>) {
    let runs = std::sync::Arc::new(AtomicUsize::new(0));
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CountingTool { runs: runs.clone() }));
    registry.register(Box::new(PanickingTool));
    (registry, runs)
}

fn calls(n: usize) -> Vec<ToolCallRequest> {
    (1..=n)
        .map(|i| ToolCallRequest::new(format!("call-{i}"), "counter", json!({})))
        .collect()
}

#[tokio::test]
async fn test_denial_aborts_rest_of_batch() {
    let (registry, runs) = counting_registry();
    let consent = ScriptedConsent::new(&[true, false, true]);
    let coordinator = Coordinator::new(&registry, &consent, PathBuf::from("."));
    let mut renderer = RecordingRenderer::new();

    let batch = calls(4);
    let outcome = coordinator.process(&batch, &mut renderer).await.unwrap();

    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.results[0].outcome, ToolOutcome::Success(json!(1)));
    assert_eq!(outcome.results[1].call.id, "call-2");
    match &outcome.results[1].outcome {
        ToolOutcome::Denied(err) => {
            assert_eq!(err.name, "ToolExecutionDenied");
            assert_eq!(err.description, "User denied execution of tool 'counter'.");
        }
        other => panic!("expected denial, got {other:?}"),
    }
    assert!(outcome.was_aborted());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(consent.asked.load(Ordering::SeqCst), 2);
    assert_eq!(renderer.count("batch_aborted:2"), 1);
    assert_eq!(renderer.count("tools_summary:1/4:0"), 1);
}

#[tokio::test]
async fn test_single_call_has_no_summary() {
    let (registry, _) = counting_registry();
    let consent = ScriptedConsent::new(&[true]);
    let coordinator = Coordinator::new(&registry, &consent, PathBuf::from("."));
    let mut renderer = RecordingRenderer::new();

    let outcome = coordinator.process(&calls(1), &mut renderer).await.unwrap();
    assert_eq!(outcome.executed, 1);
    assert_eq!(renderer.count("tools_summary"), 0);

    let consent = ScriptedConsent::new(&[false]);
    let coordinator = Coordinator::new(&registry, &consent, PathBuf::from("."));
    coordinator.process(&calls(1), &mut renderer).await.unwrap();
    assert_eq!(renderer.count("tools_summary"), 0);
}

#[tokio::test]
async fn test_failures_are_counted_and_batch_continues() {
    let (registry, runs) = counting_registry();
    let consent = ScriptedConsent::new(&[true, true, true, true]);
    let coordinator = Coordinator::new(&registry, &consent, PathBuf::from("."));
    let mut renderer = RecordingRenderer::new();

    let batch = vec![
        ToolCallRequest::new("a", "counter", json!({"fail": true})),
        ToolCallRequest::new("b", "no_such_tool", json!({})),
        ToolCallRequest::new("c", "panics", json!({})),
        ToolCallRequest::new("d", "counter", json!({})),
    ];
    let outcome = coordinator.process(&batch, &mut renderer).await.unwrap();

    assert_eq!(outcome.results.len(), 4);
    assert_eq!(outcome.executed, 1);
    assert_eq!(outcome.failed, 3);
    let names: Vec<_> = outcome
        .results
        .iter()
        .filter_map(|r| match &r.outcome {
            ToolOutcome::Error(e) => Some(e.name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, ["ValueError", "UnknownTool", "ToolPanicked"]);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(renderer.count("tools_summary:1/4:3"), 1);
}

#[tokio::test]
async fn test_interrupted_consent_cancels() {
    let (registry, runs) = counting_registry();
    let consent = ScriptedConsent::new(&[]);
    let coordinator = Coordinator::new(&registry, &consent, PathBuf::from("."));
    let mut renderer = RecordingRenderer::new();

    let result = coordinator.process(&calls(2), &mut renderer).await;
    assert!(matches!(result, Err(ConsentError::Cancelled)));
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_tool_result_wire_format() {
    let call = ToolCallRequest::new("id-1", "read_file", json!({"file_path": "x"}));
    let message = ToolResult::denied(call.clone()).into_message();
    assert_eq!(message.role, Role::Tool);
    assert_eq!(message.parts[1], Part::ToolCall(call.clone()));

    let body = message.text();
    let json_text = body
        .strip_prefix("```tool_result\n")
        .and_then(|b| b.strip_suffix("\n```"))
        .unwrap();
    let payload: Value = serde_json::from_str(json_text).unwrap();
    assert_eq!(payload["error"]["name"], "ToolExecutionDenied");
    assert_eq!(
        payload["error"]["description"],
        "User denied execution of tool 'read_file'."
    );

    let success = ToolResult {
        call,
        outcome: ToolOutcome::Success(json!({"size": 3})),
    };
    assert_eq!(success.payload(), json!({"result": {"size": 3}}));
}
