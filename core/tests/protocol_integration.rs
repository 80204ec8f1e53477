//! End-to-end calls through the request handler against a temp directory.

use mnemo_core::{MemoryConfig, MemoryStore, OperationResult, RequestHandler};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

fn store() -> (TempDir, MemoryStore) {
    let dir = TempDir::new().unwrap();
    let config = MemoryConfig {
        base_dir: dir.path().join("memory"),
        ..Default::default()
    };
    (dir, MemoryStore::new(config))
}

async fn call(store: &MemoryStore, request: Value) -> Value {
    match store.handle_value(request).await {
        OperationResult::Success { structured, .. } => structured.unwrap(),
        OperationResult::Error { message, code, .. } => {
            panic!("call failed with {}: {}", code, message)
        }
    }
}

async fn call_err(store: &MemoryStore, request: Value) -> String {
    match store.handle_value(request).await {
        OperationResult::Error { code, .. } => code,
        other => panic!("expected an error, got {:?}", other),
    }
}

#[tokio::test]
async fn pattern_write_then_update_keeps_one_entry() {
    let (_dir, store) = store();

    let first = call(
        &store,
        json!({"operation": "write", "category": "patterns", "key": "p1", "value": "uses early return", "frequency": 3}),
    )
    .await;
    assert_eq!(first["created"], true);

    let read = call(&store, json!({"operation": "read", "category": "patterns"})).await;
    assert_eq!(read["entries"].as_array().unwrap().len(), 1);
    assert_eq!(read["entries"][0]["key"], "p1");
    assert_eq!(read["entries"][0]["frequency"], 3);

    let second = call(
        &store,
        json!({"operation": "write", "category": "patterns", "key": "p1", "value": "uses guard clauses"}),
    )
    .await;
    assert_eq!(second["created"], false);

    let read = call(&store, json!({"operation": "read", "category": "patterns"})).await;
    let entries = read["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["value"], "uses guard clauses");
    assert_eq!(entries[0]["frequency"], 3);
}

#[tokio::test]
async fn new_pattern_without_frequency_is_rejected() {
    let (dir, store) = store();
    let code = call_err(
        &store,
        json!({"operation": "write", "category": "patterns", "key": "p2", "value": "v"}),
    )
    .await;
    assert_eq!(code, "VALIDATION_ERROR");
    assert!(!dir.path().join("memory/patterns.json").exists());
}

#[tokio::test]
async fn two_phase_delete() {
    let (dir, store) = store();
    call(
        &store,
        json!({"operation": "write", "category": "decisions", "key": "d9", "value": "use sqlite"}),
    )
    .await;
    let path = dir.path().join("memory/decisions.json");
    let before = std::fs::read_to_string(&path).unwrap();

    let pending = store
        .handle_value(json!({"operation": "delete", "category": "decisions", "key": "d9", "confirm": false}))
        .await;
    assert_eq!(pending.status(), Some("pending_confirmation"));
    match &pending {
        OperationResult::Success { output, structured } => {
            assert!(output.contains("use sqlite"));
            assert_eq!(structured.as_ref().unwrap()["entry"]["value"], "use sqlite");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let done = call(
        &store,
        json!({"operation": "delete", "category": "decisions", "key": "d9", "confirm": true}),
    )
    .await;
    assert_eq!(done["status"], "deleted");
    assert_eq!(done["remaining"], 0);

    let after: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let before: Value = serde_json::from_str(&before).unwrap();
    assert!(after["entries"].as_array().unwrap().is_empty());
    assert_ne!(after["updated"], before["updated"]);

    let code = call_err(
        &store,
        json!({"operation": "delete", "category": "decisions", "key": "d9", "confirm": true}),
    )
    .await;
    assert_eq!(code, "NOT_FOUND");
}

#[tokio::test]
async fn protocol_state_is_never_mutated() {
    let (dir, store) = store();
    let base = dir.path().join("memory");
    std::fs::create_dir_all(&base).unwrap();
    let path = base.join("protocol-state.json");
    std::fs::write(&path, r#"{"phase": "review"}"#).unwrap();

    for request in [
        json!({"operation": "write", "category": "protocol-state", "key": "x", "value": "y"}),
        json!({"operation": "delete", "category": "protocol-state", "key": "x", "confirm": true}),
        json!({"operation": "prune", "category": "protocol-state", "dry_run": false, "confirm": true}),
    ] {
        assert_eq!(call_err(&store, request).await, "READ_ONLY_VIOLATION");
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"phase": "review"}"#);

    let read = call(&store, json!({"operation": "read", "category": "protocol-state"})).await;
    assert_eq!(read["state"]["phase"], "review");
}

#[tokio::test]
async fn prune_on_fresh_store_has_nothing_to_do() {
    let (_dir, store) = store();
    call(
        &store,
        json!({"operation": "write", "category": "user-preferences", "key": "tabs", "value": "spaces"}),
    )
    .await;

    let result = store
        .handle_value(json!({"operation": "prune", "dry_run": true}))
        .await;
    assert_eq!(result.status(), Some("nothing_to_prune"));
    match result {
        OperationResult::Success { output, .. } => assert_eq!(output, "Nothing to prune."),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn fuzzy_search_survives_a_typo() {
    let (_dir, store) = store();
    call(
        &store,
        json!({"operation": "write", "category": "project-learnings", "key": "auth", "value": "authentication goes through the gateway"}),
    )
    .await;
    call(
        &store,
        json!({"operation": "write", "category": "project-learnings", "key": "ci", "value": "pipelines run nightly"}),
    )
    .await;

    let found = call(
        &store,
        json!({"operation": "search", "query": "athentication", "categories": ["project-learnings"]}),
    )
    .await;
    let hits = found["hits"].as_array().unwrap();
    assert_eq!(hits[0]["entry"]["key"], "auth");
    assert_eq!(hits[0]["category"], "project-learnings");
    let score = hits[0]["score"].as_f64().unwrap();
    assert!(score < 1.0 && score >= 0.4, "score {}", score);
}

#[tokio::test]
async fn corrupt_file_reads_empty_and_is_replaced_on_write() {
    let (dir, store) = store();
    let base = dir.path().join("memory");
    std::fs::create_dir_all(&base).unwrap();
    let path = base.join("corrections.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let read = call(&store, json!({"operation": "read", "category": "corrections"})).await;
    assert!(read["entries"].as_array().unwrap().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ this is not json");

    call(
        &store,
        json!({"operation": "write", "category": "corrections", "key": "c1", "value": "date format",
               "wrong": "MM/DD", "correct": "YYYY-MM-DD"}),
    )
    .await;
    let file: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(file["entries"][0]["correct"], "YYYY-MM-DD");
    assert!(file["updated"].is_string());
}

#[tokio::test]
async fn concurrent_calls_on_one_category_lose_nothing() {
    let (_dir, store) = store();
    let store = Arc::new(store);

    let mut tasks = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        let category = if i % 2 == 0 { "decisions" } else { "user-preferences" };
        tasks.push(tokio::spawn(async move {
            store
                .handle_value(json!({
                    "operation": "write",
                    "category": category,
                    "key": format!("k{}", i),
                    "value": "v"
                }))
                .await
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().is_success());
    }

    let listed = call(&store, json!({"operation": "list"})).await;
    assert_eq!(listed["total"], 20);
    assert_eq!(listed["categories"]["decisions"]["count"], 10);
}

#[tokio::test]
async fn unknown_category_and_operation() {
    let (_dir, store) = store();
    assert_eq!(
        call_err(&store, json!({"operation": "list", "category": "todo"})).await,
        "UNKNOWN_CATEGORY"
    );
    assert_eq!(
        call_err(&store, json!({"operation": "merge"})).await,
        "INVALID_REQUEST"
    );
}

#[tokio::test]
async fn io_failures_come_back_as_error_results() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "keep me").unwrap();
    let store = MemoryStore::new(MemoryConfig {
        base_dir: blocker.clone(),
        ..Default::default()
    });

    let code = call_err(
        &store,
        json!({"operation": "write", "category": "decisions", "key": "d1", "value": "v"}),
    )
    .await;
    assert_eq!(code, "IO_ERROR");
    assert_eq!(std::fs::read_to_string(&blocker).unwrap(), "keep me");
}

#[tokio::test]
async fn category_path_that_is_a_directory_is_reported_not_clobbered() {
    let (dir, store) = store();
    let category_path = dir.path().join("memory/user-preferences.json");
    std::fs::create_dir_all(&category_path).unwrap();
    std::fs::write(category_path.join("inner.txt"), "x").unwrap();

    assert_eq!(
        call_err(&store, json!({"operation": "read", "category": "user-preferences"})).await,
        "IO_ERROR"
    );
    assert_eq!(
        call_err(
            &store,
            json!({"operation": "write", "category": "user-preferences", "key": "k", "value": "v"}),
        )
        .await,
        "IO_ERROR"
    );
    assert!(category_path.is_dir());
    assert_eq!(std::fs::read_to_string(category_path.join("inner.txt")).unwrap(), "x");
    assert_eq!(std::fs::read_dir(dir.path().join("memory")).unwrap().count(), 1);
}
