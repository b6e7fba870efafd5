use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gsync_bridge::{BridgeError, CommandBridge, ListQuery, SortOrder, ToolLocator};
use gsync_platform::{InvocationResult, ProcessInvoker, SpawnError};

struct RecordingInvoker {
    code: i32,
    output: String,
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

#[async_trait]
impl ProcessInvoker for RecordingInvoker {
    async fn run(&self, program: &Path, args: &[String]) -> Result<InvocationResult, SpawnError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((program.to_path_buf(), args.to_vec()));
        Ok(InvocationResult::new(Some(self.code), self.output.clone()))
    }
}

fn installed_tool(dir: &Path) -> PathBuf {
    let tool = dir.join("bin").join("granola-sync");
    std::fs::create_dir_all(tool.parent().expect("tool has a parent"))
        .expect("bin dir should be created");
    std::fs::write(&tool, "#!/bin/sh\n").expect("tool should be written");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755))
            .expect("permissions should be set");
    }
    tool
}

fn bridge(dir: &Path, code: i32, output: &str) -> (CommandBridge, Arc<RecordingInvoker>) {
    let invoker = Arc::new(RecordingInvoker {
        code,
        output: output.to_string(),
        calls: Mutex::new(Vec::new()),
    });
    let locator = ToolLocator::with_candidates(
        "granola-sync",
        vec![dir.join("bundle/granola-sync"), installed_tool(dir)],
    )
    .with_search_path(dir.join("empty"));
    (CommandBridge::new(locator, invoker.clone()), invoker)
}

#[tokio::test]
async fn export_selected_builds_argument_order_and_maps_fields() {
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let payload = r#"{"success": false, "exported": 1, "skipped": 1, "api_fetched": 0,
        "errors": ["b: transcript missing"], "files": ["2025-03-01 Kickoff.docx"],
        "message": "Exported 1 meeting, 1 error"}"#;
    let (bridge, invoker) = bridge(temp.path(), 0, payload);

    let result = bridge
        .export_selected(&["a".to_string(), "b".to_string()], true)
        .await
        .expect("export should decode");

    let calls = invoker.calls.lock().expect("calls lock");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, temp.path().join("bin").join("granola-sync"));
    assert_eq!(
        calls[0].1,
        vec!["export", "--json", "--ids", "a,b", "--force"]
    );

    assert!(!result.success);
    assert_eq!(result.exported, 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.errors, vec!["b: transcript missing"]);
    assert_eq!(result.message, "Exported 1 meeting, 1 error");
}

#[tokio::test]
async fn list_keeps_tool_order_and_passes_query() {
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let payload = r#"[
        {"doc_id": "z", "title": "Zeta", "created_at": "2025-01-02", "attendees": [],
         "duration_seconds": 60, "has_transcript": true, "has_summary": false,
         "has_notes": false, "is_exported": false, "export_filename": null},
        {"doc_id": "a", "title": "Alpha", "created_at": "2025-01-01", "attendees": ["Ann"],
         "duration_seconds": null, "has_transcript": false, "has_summary": true,
         "has_notes": true, "is_exported": true, "export_filename": "Alpha.docx"}
    ]"#;
    let (bridge, invoker) = bridge(temp.path(), 0, payload);

    let meetings = bridge
        .list_with(ListQuery {
            search: Some("a".to_string()),
            sort: Some(SortOrder::Title),
            limit: None,
        })
        .await
        .expect("list should decode");

    let ids: Vec<_> = meetings.iter().map(|m| m.doc_id.as_str()).collect();
    assert_eq!(ids, vec!["z", "a"]);
    assert_eq!(
        invoker.calls.lock().expect("calls lock")[0].1,
        vec!["list", "--json", "--search", "a", "--sort", "title"]
    );
}

#[tokio::test]
async fn execution_failure_carries_combined_output_verbatim() {
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let output = "Exporting...\nError: Drive folder not found: /Volumes/GoogleDrive\n";
    let (bridge, _invoker) = bridge(temp.path(), 2, output);

    let error = bridge.export_json().await.expect_err("exit 2 should fail");

    assert_eq!(error, BridgeError::ExecutionFailed(output.to_string()));
}

#[tokio::test]
async fn decoding_failure_carries_exact_payload() {
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let output = "{\"total_meetings\": \"many\"}";
    let (bridge, _invoker) = bridge(temp.path(), 0, output);

    let error = bridge.stats().await.expect_err("wrong types should fail");

    assert_eq!(error, BridgeError::DecodingFailed(output.to_string()));
}
